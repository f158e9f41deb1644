/*
 * SPDX-FileCopyrightText: © 2025 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

//! Flash access driver.
//!
//! Every erase and program runs inside an [`Unlocked`] scope that relocks the
//! controller when it ends, whichever way it ends. The driver owns the
//! controller, so two operations can never overlap. [`FlashDriver::jump_to_application`]
//! consumes the driver: after the jump no flash operation exists anymore.

use core::ops::{Deref, DerefMut};

pub mod entry;
pub mod error;
pub mod hal;
#[cfg(test)]
pub(crate) mod mock;
#[cfg(feature = "firmware")]
pub mod stm32l4;

pub use entry::EntryDescriptor;
pub use error::FlashError;
pub use hal::{Bank, FlashHal, HalError, Handoff};

use crate::types::memory_map::{MemoryMap, DOUBLE_WORD};

pub struct FlashDriver<H: FlashHal> {
    hal: H,
    map: MemoryMap,
}

/// Write access to the flash controller, relocked on drop.
pub struct Unlocked<'a, H: FlashHal> {
    hal: &'a mut H,
}

impl<H: FlashHal> Deref for Unlocked<'_, H> {
    type Target = H;

    fn deref(&self) -> &H {
        self.hal
    }
}

impl<H: FlashHal> DerefMut for Unlocked<'_, H> {
    fn deref_mut(&mut self) -> &mut H {
        self.hal
    }
}

impl<H: FlashHal> Drop for Unlocked<'_, H> {
    fn drop(&mut self) {
        self.hal.lock();
    }
}

impl<H: FlashHal> Unlocked<'_, H> {
    fn erase_bank(&mut self, bank: Bank, first: u32, count: u32) -> Result<(), FlashError> {
        trace!("erase {} pages {}..{}", bank, first, first + count);
        self.erase_pages(bank, first, count).map_err(|e| {
            error!("erase of {} page {} (+{}) failed: {}", bank, first, count, e);
            FlashError::Erase
        })
    }
}

impl<H: FlashHal> FlashDriver<H> {
    pub const fn new(hal: H, map: MemoryMap) -> Self {
        Self { hal, map }
    }

    pub const fn memory_map(&self) -> &MemoryMap {
        &self.map
    }

    fn unlock(&mut self) -> Result<Unlocked<'_, H>, HalError> {
        self.hal.unlock()?;
        Ok(Unlocked { hal: &mut self.hal })
    }

    /// Clear stale status flags and leave the controller locked.
    ///
    /// A failure to clear the flags is reported as [`FlashError::Init`] rather
    /// than ignored; the controller is relocked either way.
    pub fn init(&mut self) -> Result<(), FlashError> {
        let mut flash = self.unlock().map_err(|e| {
            warn!("unlock failed during init: {}", e);
            FlashError::Init
        })?;

        flash.clear_flags().map_err(|e| {
            warn!("could not clear flash flags: {}", e);
            FlashError::Init
        })
    }

    /// Erase everything from `start` to the physical end of flash.
    ///
    /// A range longer than one bank first erases its tail of bank 1, then the
    /// mirrored range of bank 2 is erased. Bank 1 is only touched for the
    /// remainder modulo the bank size: starting at the very first page of
    /// bank 1 leaves the whole of bank 1 as it was; callers needing bank 1
    /// blank from its first page have to erase it some other way.
    pub fn erase(&mut self, start: u32) -> Result<(), FlashError> {
        let map = self.map;
        if !map.contains(start) || !map.is_page_aligned(start) {
            warn!("erase start {:#x} is not a page of flash", start);
            return Err(FlashError::OutOfRange);
        }

        let mut pages = map.pages_to_end(start);
        debug!("erasing {} pages from {:#x}", pages, start);

        let mut flash = self.unlock().map_err(|e| {
            error!("unlock for erase failed: {}", e);
            FlashError::Erase
        })?;

        if pages > map.pages_per_bank {
            let count = pages % map.pages_per_bank;
            flash.erase_bank(Bank::Bank1, map.pages_per_bank - count, count)?;
            pages = map.pages_per_bank;
        }

        flash.erase_bank(Bank::Bank2, map.pages_per_bank - pages, pages)
    }

    /// Program `data` at `address`, two words per double-word, verifying each
    /// double-word after it is programmed.
    ///
    /// Programming stops quietly at the last double-word of the application
    /// slot even if data remains. The first rejected or mismatching
    /// double-word aborts the whole write.
    pub fn write(&mut self, address: u32, data: &[u32]) -> Result<(), FlashError> {
        let map = self.map;
        if data.len() % 2 != 0 || address % DOUBLE_WORD != 0 {
            warn!("write of {} words at {:#x} is not double-word shaped", data.len(), address);
            return Err(FlashError::Size);
        }

        let mut flash = self.unlock().map_err(|e| {
            error!("unlock for write failed: {}", e);
            FlashError::Write
        })?;

        let last_slot = map.app_end - DOUBLE_WORD;
        let mut address = address;

        for pair in data.chunks_exact(2) {
            if address > last_slot {
                warn!("write truncated at {:#x}, application slot ends", address);
                break;
            }

            let value = (u64::from(pair[1]) << 32) | u64::from(pair[0]);
            flash.program_double_word(address, value).map_err(|e| {
                error!("program at {:#x} failed: {}", address, e);
                FlashError::Write
            })?;

            let stored = flash.read_double_word(address).map_err(|e| {
                error!("read back at {:#x} failed: {}", address, e);
                FlashError::Readback
            })?;
            if stored != value {
                error!("read back {:#x} at {:#x}, expected {:#x}", stored, address, value);
                return Err(FlashError::Readback);
            }

            address += DOUBLE_WORD;
        }

        Ok(())
    }

    /// The first double-word of the application slot. An unreadable slot
    /// reads as erased.
    pub fn read_entry_descriptor(&mut self) -> EntryDescriptor {
        let origin = self.map.app_origin;
        let raw = self.hal.read_double_word(origin).unwrap_or_else(|e| {
            warn!("vector table at {:#x} unreadable: {}", origin, e);
            u64::MAX
        });
        EntryDescriptor::from_double_word(raw)
    }

    /// Hand the core over to the application image. Nothing of the bootloader
    /// runs afterwards.
    ///
    /// The image is not validated here; check
    /// [`EntryDescriptor::is_plausible`] before calling.
    pub fn jump_to_application<B: Handoff>(mut self, mut handoff: B) -> ! {
        let descriptor = self.read_entry_descriptor();
        info!(
            "starting application at {:#x} with sp {:#x}",
            descriptor.entry,
            descriptor.stack_pointer
        );

        handoff.deinit();
        handoff.start(self.map.app_origin, descriptor)
    }

    #[cfg(test)]
    pub(crate) fn hal(&self) -> &H {
        &self.hal
    }

    #[cfg(test)]
    pub(crate) fn hal_mut(&mut self) -> &mut H {
        &mut self.hal
    }
}
