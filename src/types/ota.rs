/*
 * SPDX-FileCopyrightText: © 2025 Jinwoo Park (pmnxis@gmail.com)
 *
 * SPDX-License-Identifier: MIT OR Apache-2.0
 */

//! Update protocol spoken with the host over the serial port.
//!
//! Every frame is `SOF, command, body.., EOF`. Requests start with
//! [`Sof::Request`], responses with [`Sof::Response`] and echo the command.
//! The first body byte of a response is the status: `0x00` on success, a
//! [`FlashError`] code or an [`OtaError`] code otherwise.

use super::std_crc::std_crc;
use crate::flash::{FlashDriver, FlashError, FlashHal};

pub const PROTOCOL_VERSION: u8 = 0x01;
pub const EOF_SIGNATURE: u8 = 0xFF;
pub const CHUNK_PAYLOAD_SIZE: usize = 256;
const CHUNK_MAX_WORDS: usize = CHUNK_PAYLOAD_SIZE / core::mem::size_of::<u32>();

const SHORT_REQUEST_SIZE: usize = 3;
const LENGTH_OFFSET: usize = 2;
const CHECKSUM_OFFSET: usize = LENGTH_OFFSET + 1;
const ADDRESS_OFFSET: usize = CHECKSUM_OFFSET + 4;
const PAYLOAD_OFFSET: usize = ADDRESS_OFFSET + 4;
const WRITE_CHUNK_SIZE: usize = PAYLOAD_OFFSET + CHUNK_PAYLOAD_SIZE + 1;

pub const MAX_REQUEST_SIZE: usize = WRITE_CHUNK_SIZE;
/// Device info is the longest response.
pub const MAX_RESPONSE_SIZE: usize = 14;

#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Sof {
    /// Host to slave
    Request = 0xAA,
    /// Slave to host
    Response = 0xBB,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Command {
    Handshake = 0x01,
    DeviceInfo = 0x02,
    Erase = 0x30,
    WriteChunk = 0x40,
    Jump = 0xE0,
    Reset = 0xF0,
}

impl TryFrom<u8> for Command {
    type Error = OtaError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(Self::Handshake),
            0x02 => Ok(Self::DeviceInfo),
            0x30 => Ok(Self::Erase),
            0x40 => Ok(Self::WriteChunk),
            0xE0 => Ok(Self::Jump),
            0xF0 => Ok(Self::Reset),
            _ => Err(OtaError::UnknownCommand),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum OtaError {
    Nothing = 0,
    ChecksumError = 0x80,
    UnknownCommand = 0x81,
    OutOfRange = 0x82,
    MissingEof = 0x83,
    MissingSof = 0x84,
    /// Word count odd or larger than a chunk.
    BadLength = 0x85,
    /// Jump requested while the application slot holds no vector table.
    NoApplication = 0x86,
}

/// Anything that turns a request into a non-zero status byte.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Fault {
    Protocol(OtaError),
    Flash(FlashError),
}

impl Fault {
    pub const fn code(self) -> u8 {
        match self {
            Self::Protocol(e) => e as u8,
            Self::Flash(e) => e.code(),
        }
    }
}

impl From<OtaError> for Fault {
    fn from(e: OtaError) -> Self {
        Self::Protocol(e)
    }
}

impl From<FlashError> for Fault {
    fn from(e: FlashError) -> Self {
        Self::Flash(e)
    }
}

/// What the caller has to do once the response is on the wire.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    Continue,
    Jump,
    Reset,
}

pub const fn request_packet_size(command: Command) -> usize {
    match command {
        Command::Handshake
        | Command::DeviceInfo
        | Command::Erase
        | Command::Jump
        | Command::Reset => SHORT_REQUEST_SIZE,
        Command::WriteChunk => WRITE_CHUNK_SIZE,
    }
}

pub enum RequestForm<'a> {
    Handshake,
    DeviceInfo,
    Erase,
    WriteChunk(WriteChunk<'a>),
    Jump,
    Reset,
}

pub struct WriteChunk<'a> {
    /// Number of 32-bit words of `payload` to program.
    pub length: u8,
    /// CRC-32 over the whole payload, little endian on the wire.
    pub checksum: u32,
    /// Absolute flash address, little endian on the wire.
    pub address: u32,
    pub payload: &'a [u8],
}

fn le_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

impl<'a> WriteChunk<'a> {
    /// `packet` is a complete, EOF checked write chunk frame.
    fn parse(packet: &'a [u8]) -> Self {
        Self {
            length: packet[LENGTH_OFFSET],
            checksum: le_u32(&packet[CHECKSUM_OFFSET..]),
            address: le_u32(&packet[ADDRESS_OFFSET..]),
            payload: &packet[PAYLOAD_OFFSET..PAYLOAD_OFFSET + CHUNK_PAYLOAD_SIZE],
        }
    }

    fn verify(&self) -> Result<(), OtaError> {
        if std_crc(self.payload) != self.checksum {
            return Err(OtaError::ChecksumError);
        }

        let words = self.length as usize;
        if words % 2 != 0 || words > CHUNK_MAX_WORDS {
            return Err(OtaError::BadLength);
        }

        Ok(())
    }

    fn words<'b>(&self, buf: &'b mut [u32; CHUNK_MAX_WORDS]) -> &'b [u32] {
        let count = self.length as usize;
        for (word, bytes) in buf.iter_mut().zip(self.payload.chunks_exact(4)).take(count) {
            *word = le_u32(bytes);
        }
        &buf[..count]
    }

    /// Check the chunk and program it. Only the application slot is writable.
    pub(crate) fn try_flash<H: FlashHal>(&self, driver: &mut FlashDriver<H>) -> Result<(), Fault> {
        self.verify()?;

        let map = *driver.memory_map();
        let end = self.address.checked_add(u32::from(self.length) * 4);
        if self.address < map.app_origin || end.map_or(true, |end| end > map.app_end) {
            return Err(OtaError::OutOfRange.into());
        }

        let mut buf = [0u32; CHUNK_MAX_WORDS];
        driver.write(self.address, self.words(&mut buf))?;
        Ok(())
    }
}

pub(crate) fn test_packet(packet: &[u8]) -> Result<RequestForm<'_>, OtaError> {
    if packet.len() < 2 {
        return Err(OtaError::OutOfRange);
    }

    if packet[0] != Sof::Request as u8 {
        return Err(OtaError::MissingSof);
    }

    let cmd = Command::try_from(packet[1])?;

    let estimated_packet_size = request_packet_size(cmd);

    if packet.len() < estimated_packet_size {
        return Err(OtaError::OutOfRange);
    } else if packet[estimated_packet_size - 1] != EOF_SIGNATURE {
        return Err(OtaError::MissingEof);
    }

    Ok(match cmd {
        Command::Handshake => RequestForm::Handshake,
        Command::DeviceInfo => RequestForm::DeviceInfo,
        Command::Erase => RequestForm::Erase,
        Command::WriteChunk => {
            RequestForm::WriteChunk(WriteChunk::parse(&packet[..estimated_packet_size]))
        }
        Command::Jump => RequestForm::Jump,
        Command::Reset => RequestForm::Reset,
    })
}

fn respond(out: &mut [u8; MAX_RESPONSE_SIZE], command: u8, body: &[u8]) -> usize {
    let end = 2 + body.len();
    out[0] = Sof::Response as u8;
    out[1] = command;
    out[2..end].copy_from_slice(body);
    out[end] = EOF_SIGNATURE;
    end + 1
}

fn status(result: Result<(), Fault>) -> u8 {
    match result {
        Ok(()) => OtaError::Nothing as u8,
        Err(fault) => fault.code(),
    }
}

/// Execute one request frame and build its response in `out`.
///
/// Returns the response length and what to do after sending it.
pub fn handle<H: FlashHal>(
    packet: &[u8],
    driver: &mut FlashDriver<H>,
    out: &mut [u8; MAX_RESPONSE_SIZE],
) -> (usize, Outcome) {
    let echo = packet.get(1).copied().unwrap_or(0);

    let request = match test_packet(packet) {
        Ok(request) => request,
        Err(e) => {
            warn!("rejected frame for command {:#x}: {}", echo, e);
            return (respond(out, echo, &[e as u8]), Outcome::Continue);
        }
    };

    let map = *driver.memory_map();

    match request {
        RequestForm::Handshake => (
            respond(out, Command::Handshake as u8, &[OtaError::Nothing as u8]),
            Outcome::Continue,
        ),
        RequestForm::DeviceInfo => {
            let origin = map.app_origin.to_le_bytes();
            let end = map.app_end.to_le_bytes();
            let body = [
                OtaError::Nothing as u8,
                PROTOCOL_VERSION,
                map.page_size_exponent(),
                origin[0],
                origin[1],
                origin[2],
                origin[3],
                end[0],
                end[1],
                end[2],
                end[3],
            ];
            (respond(out, Command::DeviceInfo as u8, &body), Outcome::Continue)
        }
        RequestForm::Erase => {
            info!("erasing application slot from {:#x}", map.app_origin);
            let code = status(driver.erase(map.app_origin).map_err(Fault::from));
            (respond(out, Command::Erase as u8, &[code]), Outcome::Continue)
        }
        RequestForm::WriteChunk(chunk) => {
            let result = chunk.try_flash(driver);
            if let Err(fault) = result {
                warn!("chunk at {:#x} failed: {}", chunk.address, fault);
            }
            (respond(out, Command::WriteChunk as u8, &[status(result)]), Outcome::Continue)
        }
        RequestForm::Jump => {
            if driver.read_entry_descriptor().is_plausible(&map) {
                (
                    respond(out, Command::Jump as u8, &[OtaError::Nothing as u8]),
                    Outcome::Jump,
                )
            } else {
                warn!("jump refused, no application at {:#x}", map.app_origin);
                let code = OtaError::NoApplication as u8;
                (respond(out, Command::Jump as u8, &[code]), Outcome::Continue)
            }
        }
        RequestForm::Reset => (
            respond(out, Command::Reset as u8, &[OtaError::Nothing as u8]),
            Outcome::Reset,
        ),
    }
}
