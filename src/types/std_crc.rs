/*
 * SPDX-FileCopyrightText: © 2025 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

use crc::{Crc, CRC_32_ISO_HDLC};

/// Same CRC-32 the host side computes with zlib.
const CHUNK_CRC: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

pub fn std_crc(bytes: &[u8]) -> u32 {
    CHUNK_CRC.checksum(bytes)
}
