/*
 * SPDX-FileCopyrightText: © 2025 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

//! Flash access layer and serial update console of a dual bank STM32L4
//! bootloader. Everything above the chip backends builds on the host and
//! is tested against recording doubles.

#![cfg_attr(not(test), no_std)]

// must stay first, the log macros are textually scoped
mod logging;

#[cfg(feature = "firmware")]
pub mod boards;
pub mod boot;
pub mod console;
pub mod flash;
pub mod types;
pub mod uart;
