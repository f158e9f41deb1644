/*
 * SPDX-FileCopyrightText: © 2025 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

//! Physical memory layout of the flash array, the application slot and SRAM.

use static_assertions::const_assert;

/// Double-word, the smallest programmable unit.
pub const DOUBLE_WORD: u32 = core::mem::size_of::<u64>() as u32;

/// One of the two independently erasable halves of the flash array.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Bank {
    Bank1,
    Bank2,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct MemoryMap {
    pub flash_base: u32,
    pub page_size: u32,
    pub pages_per_bank: u32,
    /// First byte of the application image (vector table).
    pub app_origin: u32,
    /// Exclusive upper bound for application programming.
    pub app_end: u32,
    pub ram_base: u32,
    pub ram_size: u32,
}

impl MemoryMap {
    /// STM32L476RG: 1 MiB dual bank, 2 KiB pages, bootloader in the first 32 KiB.
    pub const NUCLEO_L476RG: Self = Self {
        flash_base: 0x0800_0000,
        page_size: 0x800,
        pages_per_bank: 256,
        app_origin: 0x0800_8000,
        app_end: 0x0808_0000,
        ram_base: 0x2000_0000,
        ram_size: 0x0001_8000,
    };

    pub const fn bank_size(&self) -> u32 {
        self.page_size * self.pages_per_bank
    }

    pub const fn flash_size(&self) -> u32 {
        self.bank_size() * 2
    }

    /// Exclusive end of the flash array.
    pub const fn flash_end(&self) -> u32 {
        self.flash_base + self.flash_size()
    }

    pub const fn contains(&self, address: u32) -> bool {
        address >= self.flash_base && address < self.flash_end()
    }

    pub const fn is_page_aligned(&self, address: u32) -> bool {
        address % self.page_size == 0
    }

    /// Pages between `address` and the physical end of flash.
    pub const fn pages_to_end(&self, address: u32) -> u32 {
        (self.flash_end() - address) / self.page_size
    }

    /// `log2(page_size)`, as reported to the host.
    pub const fn page_size_exponent(&self) -> u8 {
        self.page_size.trailing_zeros() as u8
    }
}

#[cfg(feature = "hw_nucleo_l476rg")]
pub const BOARD_MEMORY_MAP: MemoryMap = MemoryMap::NUCLEO_L476RG;

const_assert!(MemoryMap::NUCLEO_L476RG.page_size.is_power_of_two());
const_assert!(MemoryMap::NUCLEO_L476RG.flash_size() == 0x0010_0000);
const_assert!(MemoryMap::NUCLEO_L476RG.flash_base % MemoryMap::NUCLEO_L476RG.page_size == 0);
const_assert!(MemoryMap::NUCLEO_L476RG.app_origin % MemoryMap::NUCLEO_L476RG.page_size == 0);
const_assert!(MemoryMap::NUCLEO_L476RG.app_origin < MemoryMap::NUCLEO_L476RG.app_end);
const_assert!(MemoryMap::NUCLEO_L476RG.app_end <= MemoryMap::NUCLEO_L476RG.flash_end());
const_assert!(MemoryMap::NUCLEO_L476RG.app_end % DOUBLE_WORD == 0);
