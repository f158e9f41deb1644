/*
 * SPDX-FileCopyrightText: © 2025 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

use embedded_hal::digital::InputPin;

use crate::flash::EntryDescriptor;
use crate::types::memory_map::MemoryMap;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StayReason {
    /// The force-bootloader input was held at reset.
    Requested,
    /// Nothing that looks like a vector table at the application origin.
    NoApplication,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootMode {
    Application,
    Stay(StayReason),
}

impl BootMode {
    /// `force_pin` is active low. A pin that cannot be read counts as released.
    pub fn select<P: InputPin>(
        force_pin: &mut P,
        descriptor: &EntryDescriptor,
        map: &MemoryMap,
    ) -> Self {
        if force_pin.is_low().unwrap_or(false) {
            Self::Stay(StayReason::Requested)
        } else if !descriptor.is_plausible(map) {
            Self::Stay(StayReason::NoApplication)
        } else {
            Self::Application
        }
    }
}
