/*
 * SPDX-FileCopyrightText: © 2025 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

/// Outcome of a failed driver operation. The discriminant is the status byte
/// reported to the host.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum FlashError {
    /// Odd word count or a destination that is not double-word aligned.
    Size = 0x01,
    /// The program primitive rejected a double-word.
    Write = 0x02,
    /// The double-word read back differs from the source.
    Readback = 0x04,
    /// Address outside the flash array or not on a page boundary.
    OutOfRange = 0x08,
    /// Stale flags could not be cleared during initialisation.
    Init = 0x10,
    Erase = 0xFF,
}

impl FlashError {
    pub const fn code(self) -> u8 {
        self as u8
    }
}
