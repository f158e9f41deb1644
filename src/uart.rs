/*
 * SPDX-FileCopyrightText: © 2025 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

//! Blocking byte transport over any `embedded-io` serial port.

use embedded_io::{Read, Write};

/// Status report of a transfer.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum UartStatus {
    Ok = 0x00,
    Error = 0xFF,
}

/// Fill `data` completely. There is no timeout; the call waits for the host.
pub fn receive<R: Read>(rx: &mut R, data: &mut [u8]) -> UartStatus {
    match rx.read_exact(data) {
        Ok(()) => UartStatus::Ok,
        Err(_) => {
            debug!("uart receive of {} bytes failed", data.len());
            UartStatus::Error
        }
    }
}

pub fn transmit<W: Write>(tx: &mut W, data: &[u8]) -> UartStatus {
    match tx.write_all(data).and_then(|()| tx.flush()) {
        Ok(()) => UartStatus::Ok,
        Err(_) => UartStatus::Error,
    }
}

pub fn transmit_str<W: Write>(tx: &mut W, data: &str) -> UartStatus {
    transmit(tx, data.as_bytes())
}

pub fn transmit_ch<W: Write>(tx: &mut W, data: u8) -> UartStatus {
    transmit(tx, &[data])
}
