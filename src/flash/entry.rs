/*
 * SPDX-FileCopyrightText: © 2025 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

use crate::types::memory_map::MemoryMap;

/// First two words of the application vector table.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EntryDescriptor {
    pub stack_pointer: u32,
    pub entry: u32,
}

impl EntryDescriptor {
    /// Split the little endian double-word stored at the application origin.
    pub const fn from_double_word(raw: u64) -> Self {
        Self {
            stack_pointer: raw as u32,
            entry: (raw >> 32) as u32,
        }
    }

    /// Erased or garbage flash fails this check. The initial stack pointer
    /// must be a word aligned top-of-stack inside SRAM and the reset vector a
    /// Thumb address inside the application slot.
    pub const fn is_plausible(&self, map: &MemoryMap) -> bool {
        let sp = self.stack_pointer;
        let sp_ok = sp > map.ram_base && sp - map.ram_base <= map.ram_size && sp % 4 == 0;
        let entry_ok =
            self.entry & 1 == 1 && self.entry >= map.app_origin && self.entry < map.app_end;
        sp_ok && entry_ok
    }
}
