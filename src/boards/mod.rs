/*
 * SPDX-FileCopyrightText: © 2023 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

use embassy_stm32::gpio::{AnyPin, Input};
use embassy_stm32::peripherals;
use embassy_stm32::usart::{BufferedUartRx, BufferedUartTx};

#[cfg(feature = "hw_nucleo_l476rg")]
use self::nucleo_l476rg::*;
use crate::flash::stm32l4::{CortexHandoff, L4Flash};

#[cfg(feature = "hw_nucleo_l476rg")]
mod nucleo_l476rg;

pub struct Hardware {
    pub flash: L4Flash,
    pub tx: BufferedUartTx<'static, peripherals::USART2>,
    pub rx: BufferedUartRx<'static, peripherals::USART2>,
    pub force_bootloader: Input<'static, AnyPin>,
    pub handoff: CortexHandoff,
}

impl Hardware {
    /// Initialize MCU clocks on reset defaults, the bootloader runs from MSI
    pub fn mcu_pre_init() -> embassy_stm32::Peripherals {
        embassy_stm32::init(Default::default())
    }

    /// Initialize MCU peripherals and nearby components
    #[inline]
    fn hardware_init(peripherals: embassy_stm32::Peripherals) -> Hardware {
        hardware_specific_init(peripherals)
    }
}

pub struct Board {
    pub hardware: Hardware,
}

impl Board {
    pub fn init() -> Self {
        let peripherals = Hardware::mcu_pre_init();

        let hardware: Hardware = Hardware::hardware_init(peripherals);

        Self { hardware }
    }
}
