/*
 * SPDX-FileCopyrightText: © 2025 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

//! Recording stand-ins for the flash controller and the core.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::vec::Vec;

use super::entry::EntryDescriptor;
use super::hal::{Bank, FlashHal, HalError, Handoff};
use crate::types::memory_map::{MemoryMap, DOUBLE_WORD};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Call {
    Unlock,
    Lock,
    ClearFlags,
    Erase { bank: Bank, first: u32, count: u32 },
    Program { address: u32, value: u64 },
}

/// Sparse flash image. Double-words that were never programmed read as erased.
pub struct MockFlash {
    pub map: MemoryMap,
    pub memory: BTreeMap<u32, u64>,
    pub calls: Vec<Call>,
    pub locked: bool,
    pub fail_unlock: bool,
    pub fail_clear_flags: bool,
    pub fail_erase: Option<Bank>,
    pub fail_program_at: Option<u32>,
    /// Store a corrupted value at this address so the read back differs.
    pub corrupt_at: Option<u32>,
    pub fail_read_at: Option<u32>,
}

impl MockFlash {
    pub fn new(map: MemoryMap) -> Self {
        Self {
            map,
            memory: BTreeMap::new(),
            calls: Vec::new(),
            locked: true,
            fail_unlock: false,
            fail_clear_flags: false,
            fail_erase: None,
            fail_program_at: None,
            corrupt_at: None,
            fail_read_at: None,
        }
    }

    /// Fill every double-word of `[from, to)` with a non-erased pattern.
    pub fn fill(&mut self, from: u32, to: u32) {
        for address in (from..to).step_by(DOUBLE_WORD as usize) {
            self.memory.insert(address, 0);
        }
    }

    pub fn erases(&self) -> Vec<(Bank, u32, u32)> {
        self.calls
            .iter()
            .filter_map(|c| match *c {
                Call::Erase { bank, first, count } => Some((bank, first, count)),
                _ => None,
            })
            .collect()
    }

    pub fn programs(&self) -> Vec<(u32, u64)> {
        self.calls
            .iter()
            .filter_map(|c| match *c {
                Call::Program { address, value } => Some((address, value)),
                _ => None,
            })
            .collect()
    }

    pub fn is_erased(&self, address: u32) -> bool {
        !self.memory.contains_key(&address)
    }
}

impl FlashHal for MockFlash {
    fn unlock(&mut self) -> Result<(), HalError> {
        self.calls.push(Call::Unlock);
        if self.fail_unlock {
            return Err(HalError::Locked);
        }
        self.locked = false;
        Ok(())
    }

    fn lock(&mut self) {
        self.calls.push(Call::Lock);
        self.locked = true;
    }

    fn clear_flags(&mut self) -> Result<(), HalError> {
        self.calls.push(Call::ClearFlags);
        if self.fail_clear_flags {
            return Err(HalError::Busy);
        }
        Ok(())
    }

    fn erase_pages(&mut self, bank: Bank, first: u32, count: u32) -> Result<(), HalError> {
        self.calls.push(Call::Erase { bank, first, count });
        if self.locked {
            return Err(HalError::Locked);
        }
        if self.fail_erase == Some(bank) {
            return Err(HalError::WriteProtected);
        }
        let bank_base = match bank {
            Bank::Bank1 => self.map.flash_base,
            Bank::Bank2 => self.map.flash_base + self.map.bank_size(),
        };
        let from = bank_base + first * self.map.page_size;
        let to = from + count * self.map.page_size;
        let doomed: Vec<u32> = self.memory.range(from..to).map(|(a, _)| *a).collect();
        for address in doomed {
            self.memory.remove(&address);
        }
        Ok(())
    }

    fn program_double_word(&mut self, address: u32, value: u64) -> Result<(), HalError> {
        self.calls.push(Call::Program { address, value });
        if self.locked {
            return Err(HalError::Locked);
        }
        if address % DOUBLE_WORD != 0 {
            return Err(HalError::Alignment);
        }
        if self.fail_program_at == Some(address) || !self.is_erased(address) {
            return Err(HalError::Program);
        }
        let stored = if self.corrupt_at == Some(address) {
            value ^ 1
        } else {
            value
        };
        self.memory.insert(address, stored);
        Ok(())
    }

    fn read_double_word(&mut self, address: u32) -> Result<u64, HalError> {
        if self.fail_read_at == Some(address) {
            return Err(HalError::Size);
        }
        Ok(self.memory.get(&address).copied().unwrap_or(u64::MAX))
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CoreEvent {
    Deinit,
    Start {
        vector_table: u32,
        descriptor: EntryDescriptor,
    },
}

/// Payload used to unwind out of [`MockHandoff::start`].
pub struct Started;

#[derive(Clone, Default)]
pub struct MockHandoff {
    pub events: Rc<RefCell<Vec<CoreEvent>>>,
}

impl Handoff for MockHandoff {
    fn deinit(&mut self) {
        self.events.borrow_mut().push(CoreEvent::Deinit);
    }

    fn start(self, vector_table: u32, descriptor: EntryDescriptor) -> ! {
        self.events.borrow_mut().push(CoreEvent::Start {
            vector_table,
            descriptor,
        });
        std::panic::resume_unwind(std::boxed::Box::new(Started))
    }
}
