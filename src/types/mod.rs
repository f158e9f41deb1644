/*
 * SPDX-FileCopyrightText: © 2023 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

#[cfg(feature = "firmware")]
pub mod make_static;
pub mod memory_map;
pub mod ota;

pub(crate) mod std_crc;
