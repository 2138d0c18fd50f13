//! Actisense NGT-1 compatible BST framing over a byte stream.
//!
//! ```text
//! DLE STX | command | length | body ... | checksum | DLE ETX
//! ```
//!
//! `length` counts the body bytes. The checksum makes the byte sum of
//! command, length, body and checksum equal zero modulo 256. Any DLE inside
//! the frame is doubled on the wire.
pub mod reader;
pub mod writer;

pub const DLE: u8 = 0x10;
pub const STX: u8 = 0x02;
pub const ETX: u8 = 0x03;

/// Header bytes of a 0x93 body before the N2K data.
pub(crate) const N2K_RECEIVED_HEADER: usize = 11;
/// Header bytes of a 0x94 body before the N2K data.
pub(crate) const N2K_SEND_HEADER: usize = 6;

/// Largest unescaped frame content: command, length, 0x93 header, data, checksum.
pub const MAX_FRAME_BODY: usize = 2 + N2K_RECEIVED_HEADER + crate::core::MAX_N2K_PAYLOAD + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ActisenseCommand {
    /// Message received from the NMEA 2000 network, with source and timestamp.
    N2kReceived = 0x93,
    /// Message to send on the network; the receiver picks the source.
    N2kSend = 0x94,
}

impl TryFrom<u8> for ActisenseCommand {
    type Error = crate::error::ActisenseError;

    fn try_from(command: u8) -> Result<Self, Self::Error> {
        match command {
            0x93 => Ok(Self::N2kReceived),
            0x94 => Ok(Self::N2kSend),
            command => Err(crate::error::ActisenseError::UnsupportedCommand { command }),
        }
    }
}

/// Byte that brings the sum of `bytes` to zero.
pub(crate) fn checksum(bytes: &[u8]) -> u8 {
    0u8.wrapping_sub(bytes.iter().fold(0u8, |sum, b| sum.wrapping_add(*b)))
}
