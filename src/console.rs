/*
 * SPDX-FileCopyrightText: © 2025 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

//! Serial front end of the bootloader: reads request frames, runs them
//! against the flash driver and answers the host.

use embedded_io::{Read, Write};

use crate::boot::{BootMode, StayReason};
use crate::flash::{FlashDriver, FlashError, FlashHal};
use crate::types::ota::{self, Command, OtaError, Outcome, Sof, MAX_REQUEST_SIZE, MAX_RESPONSE_SIZE};
use crate::uart::{self, UartStatus};

pub struct Console<R, W> {
    rx: R,
    tx: W,
    frame: [u8; MAX_REQUEST_SIZE],
    response: [u8; MAX_RESPONSE_SIZE],
}

impl<R: Read, W: Write> Console<R, W> {
    pub fn new(rx: R, tx: W) -> Self {
        Self {
            rx,
            tx,
            frame: [0; MAX_REQUEST_SIZE],
            response: [0; MAX_RESPONSE_SIZE],
        }
    }

    pub fn release(self) -> (R, W) {
        (self.rx, self.tx)
    }

    /// Human readable start-up line, ignored by the host tool.
    pub fn announce(&mut self, init: Result<(), FlashError>, mode: BootMode) {
        let _ = uart::transmit_str(&mut self.tx, "\r\nflash-boots\r\n");

        if let Err(e) = init {
            error!("flash init: {}", e);
            let _ = uart::transmit_str(&mut self.tx, "flash flags could not be cleared\r\n");
        }

        let line = match mode {
            BootMode::Application => "starting application\r\n",
            BootMode::Stay(StayReason::Requested) => "bootloader requested\r\n",
            BootMode::Stay(StayReason::NoApplication) => "no application found\r\n",
        };
        info!("boot mode {}", mode);
        let _ = uart::transmit_str(&mut self.tx, line);
    }

    /// Serve one request. Blocks until a whole frame arrived.
    pub fn poll<H: FlashHal>(&mut self, driver: &mut FlashDriver<H>) -> Outcome {
        if uart::receive(&mut self.rx, &mut self.frame[..1]) != UartStatus::Ok {
            return Outcome::Continue;
        }

        // resync one byte at a time until a frame start shows up
        if self.frame[0] != Sof::Request as u8 {
            trace!("dropping byte {:#x}", self.frame[0]);
            return Outcome::Continue;
        }

        if uart::receive(&mut self.rx, &mut self.frame[1..2]) != UartStatus::Ok {
            return Outcome::Continue;
        }

        let size = match Command::try_from(self.frame[1]) {
            Ok(cmd) => ota::request_packet_size(cmd),
            Err(e) => {
                let _ = uart::transmit(
                    &mut self.tx,
                    &[Sof::Response as u8, self.frame[1], e as u8, ota::EOF_SIGNATURE],
                );
                return Outcome::Continue;
            }
        };

        if uart::receive(&mut self.rx, &mut self.frame[2..size]) != UartStatus::Ok {
            let code = OtaError::OutOfRange as u8;
            let _ = uart::transmit(
                &mut self.tx,
                &[Sof::Response as u8, self.frame[1], code, ota::EOF_SIGNATURE],
            );
            return Outcome::Continue;
        }

        let (len, outcome) = ota::handle(&self.frame[..size], driver, &mut self.response);
        if uart::transmit(&mut self.tx, &self.response[..len]) != UartStatus::Ok {
            warn!("response to command {:#x} lost", self.frame[1]);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flash::mock::MockFlash;
    use crate::types::memory_map::MemoryMap;
    use crate::types::ota::tests::{chunk_frame, short_frame};

    const MAP: MemoryMap = MemoryMap::NUCLEO_L476RG;

    #[test]
    fn serves_frames_back_to_back() {
        let mut input = std::vec::Vec::new();
        input.push(0x00); // line noise before the first frame
        input.extend_from_slice(&short_frame(Command::Handshake));
        input.extend_from_slice(&chunk_frame(MAP.app_origin, &[0x2000_8000, 0x0800_8401]));
        input.extend_from_slice(&short_frame(Command::Jump));

        let mut output = [0u8; 32];
        let mut driver = FlashDriver::new(MockFlash::new(MAP), MAP);

        let outcomes = {
            let mut console = Console::new(&input[..], &mut output[..]);
            let outcomes = [
                console.poll(&mut driver),
                console.poll(&mut driver),
                console.poll(&mut driver),
                console.poll(&mut driver),
            ];
            let (rx, _) = console.release();
            assert!(rx.is_empty());
            outcomes
        };

        assert_eq!(
            outcomes,
            [Outcome::Continue, Outcome::Continue, Outcome::Continue, Outcome::Jump]
        );
        assert_eq!(
            &output[..12],
            [0xBB, 0x01, 0x00, 0xFF, 0xBB, 0x40, 0x00, 0xFF, 0xBB, 0xE0, 0x00, 0xFF]
        );
        assert_eq!(driver.hal().programs().len(), 1);
    }

    #[test]
    fn unknown_command_is_answered_without_reading_a_body() {
        let input: [u8; 5] = [0xAA, 0x55, 0xAA, 0x01, 0xFF];
        let mut output = [0u8; 8];
        let mut driver = FlashDriver::new(MockFlash::new(MAP), MAP);

        {
            let mut console = Console::new(&input[..], &mut output[..]);
            assert_eq!(console.poll(&mut driver), Outcome::Continue);
            assert_eq!(console.poll(&mut driver), Outcome::Continue);
        }

        assert_eq!(output, [0xBB, 0x55, 0x81, 0xFF, 0xBB, 0x01, 0x00, 0xFF]);
    }

    #[test]
    fn truncated_frame_is_reported() {
        let input: [u8; 4] = [0xAA, 0x40, 0x02, 0x00];
        let mut output = [0u8; 4];
        let mut driver = FlashDriver::new(MockFlash::new(MAP), MAP);

        {
            let mut console = Console::new(&input[..], &mut output[..]);
            assert_eq!(console.poll(&mut driver), Outcome::Continue);
        }

        assert_eq!(output, [0xBB, 0x40, OtaError::OutOfRange as u8, 0xFF]);
        assert!(driver.hal().calls.is_empty());
    }

    #[test]
    fn announce_reports_mode() {
        let input: &[u8] = &[];
        let mut output = [0u8; 64];
        {
            let mut console = Console::new(input, &mut output[..]);
            console.announce(Ok(()), BootMode::Stay(StayReason::NoApplication));
        }
        let text = core::str::from_utf8(&output).unwrap().trim_end_matches('\0');
        assert_eq!(text, "\r\nflash-boots\r\nno application found\r\n");
    }
}
