/*
 * SPDX-FileCopyrightText: © 2025 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

//! Hardware initialization code for NUCLEO-L476RG
//! USART2 is wired to the ST-LINK virtual COM port, B1 (PC13) is the
//! force-bootloader button, active low with an external pull-up.

use embassy_stm32::flash::Flash;
use embassy_stm32::gpio::{Input, Pin, Pull};
use embassy_stm32::usart::BufferedUart;
use embassy_stm32::{bind_interrupts, peripherals};

use super::Hardware;
use crate::flash::stm32l4::{CortexHandoff, L4Flash};
use crate::make_static;
use crate::types::memory_map::BOARD_MEMORY_MAP;

bind_interrupts!(struct Irqs {
    USART2 => embassy_stm32::usart::BufferedInterruptHandler<peripherals::USART2>;
});

/// A whole write chunk frame fits in the receive ring.
const UART_RX_BUF_SIZE: usize = 512;
const UART_TX_BUF_SIZE: usize = 64;

pub fn hardware_specific_init(p: embassy_stm32::Peripherals) -> Hardware {
    let usart_rx_buf = make_static!([u8; UART_RX_BUF_SIZE], [0u8; UART_RX_BUF_SIZE]);
    let usart_tx_buf = make_static!([u8; UART_TX_BUF_SIZE], [0u8; UART_TX_BUF_SIZE]);

    let usart2_config = {
        let mut ret = embassy_stm32::usart::Config::default();
        ret.baudrate = 115200;
        ret.detect_previous_overrun = true;
        ret
    };

    let (tx, rx) = BufferedUart::new(
        p.USART2,
        Irqs,
        p.PA3,
        p.PA2,
        usart_tx_buf,
        usart_rx_buf,
        usart2_config,
    )
    .unwrap_or_else(|_| panic!())
    .split();

    let force_bootloader = Input::new(p.PC13.degrade(), Pull::None);

    Hardware {
        flash: L4Flash::new(Flash::new_blocking(p.FLASH), BOARD_MEMORY_MAP),
        tx,
        rx,
        force_bootloader,
        handoff: CortexHandoff,
    }
}
