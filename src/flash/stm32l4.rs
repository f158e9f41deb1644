/*
 * SPDX-FileCopyrightText: © 2025 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

//! STM32L4 dual bank flash on top of the embassy blocking flash driver, and
//! the core handoff.

use embassy_stm32::flash::{Blocking, Error, Flash};
use embassy_stm32::pac;

use super::entry::EntryDescriptor;
use super::hal::{Bank, FlashHal, HalError, Handoff};
use crate::types::memory_map::MemoryMap;

impl From<Error> for HalError {
    fn from(e: Error) -> Self {
        match e {
            Error::Prog => HalError::Program,
            Error::Size => HalError::Size,
            Error::Miss => HalError::Miss,
            Error::Seq => HalError::Sequence,
            Error::Protected => HalError::WriteProtected,
            Error::Unaligned => HalError::Alignment,
            Error::Parallelism => HalError::Busy,
            #[allow(unreachable_patterns)]
            _ => HalError::Program,
        }
    }
}

/// Owner of the FLASH peripheral.
///
/// The embassy driver unlocks around each erase and program on its own and
/// clears stale error flags before starting one. `unlock`/`lock` only open
/// and close the window in which this backend accepts those operations.
pub struct L4Flash {
    flash: Flash<'static, Blocking>,
    map: MemoryMap,
    unlocked: bool,
}

impl L4Flash {
    pub fn new(flash: Flash<'static, Blocking>, map: MemoryMap) -> Self {
        Self {
            flash,
            map,
            unlocked: false,
        }
    }

    fn offset(&self, address: u32) -> Result<u32, HalError> {
        address.checked_sub(self.map.flash_base).ok_or(HalError::Size)
    }

    fn page_offset(&self, bank: Bank, page: u32) -> u32 {
        let bank_offset = match bank {
            Bank::Bank1 => 0,
            Bank::Bank2 => self.map.bank_size(),
        };
        bank_offset + page * self.map.page_size
    }

    fn ensure_unlocked(&self) -> Result<(), HalError> {
        match self.unlocked {
            true => Ok(()),
            false => Err(HalError::Locked),
        }
    }
}

impl FlashHal for L4Flash {
    fn unlock(&mut self) -> Result<(), HalError> {
        self.unlocked = true;
        Ok(())
    }

    fn lock(&mut self) {
        self.unlocked = false;
    }

    fn clear_flags(&mut self) -> Result<(), HalError> {
        let sr = pac::FLASH.sr().read();
        if sr.bsy() {
            return Err(HalError::Busy);
        }

        // error and end-of-operation bits are write-one-to-clear
        pac::FLASH.sr().write_value(sr);
        Ok(())
    }

    fn erase_pages(&mut self, bank: Bank, first: u32, count: u32) -> Result<(), HalError> {
        self.ensure_unlocked()?;
        if count == 0 {
            return Ok(());
        }

        let from = self.page_offset(bank, first);
        let to = self.page_offset(bank, first + count);
        self.flash.blocking_erase(from, to)?;
        Ok(())
    }

    fn program_double_word(&mut self, address: u32, value: u64) -> Result<(), HalError> {
        self.ensure_unlocked()?;
        let offset = self.offset(address)?;
        self.flash.blocking_write(offset, &value.to_le_bytes())?;
        Ok(())
    }

    fn read_double_word(&mut self, address: u32) -> Result<u64, HalError> {
        let mut bytes = [0u8; 8];
        let offset = self.offset(address)?;
        self.flash.blocking_read(offset, &mut bytes)?;
        Ok(u64::from_le_bytes(bytes))
    }
}

/// Core side of the jump: peripheral reset, vector table, stack pointer.
pub struct CortexHandoff;

impl Handoff for CortexHandoff {
    fn deinit(&mut self) {
        cortex_m::interrupt::disable();

        let systick = unsafe { &*cortex_m::peripheral::SYST::PTR };
        unsafe {
            systick.csr.write(0);
            systick.rvr.write(0);
            systick.cvr.write(0);
        }

        let nvic = unsafe { &*cortex_m::peripheral::NVIC::PTR };
        for reg in nvic.icer.iter() {
            unsafe { reg.write(u32::MAX) };
        }
        for reg in nvic.icpr.iter() {
            unsafe { reg.write(u32::MAX) };
        }

        // pulse every peripheral reset line
        let rcc = pac::RCC;
        rcc.apb1rstr1().write_value(pac::rcc::regs::Apb1rstr1(u32::MAX));
        rcc.apb1rstr1().write_value(pac::rcc::regs::Apb1rstr1(0));
        rcc.apb1rstr2().write_value(pac::rcc::regs::Apb1rstr2(u32::MAX));
        rcc.apb1rstr2().write_value(pac::rcc::regs::Apb1rstr2(0));
        rcc.apb2rstr().write_value(pac::rcc::regs::Apb2rstr(u32::MAX));
        rcc.apb2rstr().write_value(pac::rcc::regs::Apb2rstr(0));
        rcc.ahb1rstr().write_value(pac::rcc::regs::Ahb1rstr(u32::MAX));
        rcc.ahb1rstr().write_value(pac::rcc::regs::Ahb1rstr(0));
        rcc.ahb2rstr().write_value(pac::rcc::regs::Ahb2rstr(u32::MAX));
        rcc.ahb2rstr().write_value(pac::rcc::regs::Ahb2rstr(0));
        rcc.ahb3rstr().write_value(pac::rcc::regs::Ahb3rstr(u32::MAX));
        rcc.ahb3rstr().write_value(pac::rcc::regs::Ahb3rstr(0));

        unsafe { cortex_m::interrupt::enable() };
    }

    fn start(self, vector_table: u32, descriptor: EntryDescriptor) -> ! {
        unsafe {
            let p = cortex_m::Peripherals::steal();
            p.SCB.vtor.write(vector_table);
            cortex_m::asm::dsb();
            cortex_m::asm::isb();

            cortex_m::asm::bootstrap(
                descriptor.stack_pointer as *const u32,
                descriptor.entry as *const u32,
            )
        }
    }
}
