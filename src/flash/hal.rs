/*
 * SPDX-FileCopyrightText: © 2025 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

//! Capabilities the driver needs from the chip.
//!
//! [`FlashHal`] is the flash controller, [`Handoff`] is the core side of the
//! jump into the application. The STM32L4 backend implements both on
//! the target, tests use a recording double.

pub use crate::types::memory_map::Bank;

use super::entry::EntryDescriptor;

/// Failure reported by a flash controller primitive.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HalError {
    /// Write access to the controller was not granted.
    Locked,
    /// An operation was already in flight.
    Busy,
    Program,
    WriteProtected,
    Alignment,
    Size,
    Miss,
    Sequence,
}

pub trait FlashHal {
    /// Enable write access to the control register.
    fn unlock(&mut self) -> Result<(), HalError>;

    /// Disable write access to the control register.
    fn lock(&mut self);

    /// Clear the end-of-operation and stale error flags.
    fn clear_flags(&mut self) -> Result<(), HalError>;

    /// Erase `count` pages of `bank` starting at page index `first`.
    fn erase_pages(&mut self, bank: Bank, first: u32, count: u32) -> Result<(), HalError>;

    /// Program one double-word. `address` must be 8 byte aligned and erased.
    fn program_double_word(&mut self, address: u32, value: u64) -> Result<(), HalError>;

    fn read_double_word(&mut self, address: u32) -> Result<u64, HalError>;
}

pub trait Handoff {
    /// Return the peripherals to their reset state.
    fn deinit(&mut self);

    /// Point the vector table at `vector_table`, load the main stack pointer
    /// and branch to the entry of `descriptor`.
    fn start(self, vector_table: u32, descriptor: EntryDescriptor) -> !;
}
