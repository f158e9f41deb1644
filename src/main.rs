/*
 * SPDX-FileCopyrightText: © 2023 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

#![no_main]
#![no_std]

use cortex_m_rt::entry;
#[cfg(feature = "defmt")]
use defmt_rtt as _;
use panic_abort as _;

use flash_boots::boards::Board;
use flash_boots::boot::BootMode;
use flash_boots::console::Console;
use flash_boots::flash::FlashDriver;
use flash_boots::types::memory_map::BOARD_MEMORY_MAP;
use flash_boots::types::ota::Outcome;

#[entry]
fn main() -> ! {
    let hardware = Board::init().hardware;
    let mut force_bootloader = hardware.force_bootloader;
    let handoff = hardware.handoff;

    let mut driver = FlashDriver::new(hardware.flash, BOARD_MEMORY_MAP);
    // a failed flag clear is reported, the next erase/write surfaces its own error
    let init = driver.init();

    let descriptor = driver.read_entry_descriptor();
    let mode = BootMode::select(&mut force_bootloader, &descriptor, driver.memory_map());

    let mut console = Console::new(hardware.rx, hardware.tx);
    console.announce(init, mode);

    if mode == BootMode::Application {
        driver.jump_to_application(handoff);
    }

    loop {
        match console.poll(&mut driver) {
            Outcome::Continue => {}
            Outcome::Jump => driver.jump_to_application(handoff),
            Outcome::Reset => cortex_m::peripheral::SCB::sys_reset(),
        }
    }
}
