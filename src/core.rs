//! The message shape shared by both sides of the gateway.
//!
//! An [`N2kMessage`] sits at the boundary between the CAN representation
//! (identifier + one or more frames) and the Actisense representation
//! (escaped BST frame). It lives for a single translation: it is built on
//! receipt and consumed once forwarded or dropped.
use crate::error::ExtractionError;

/// Largest payload a single NMEA 2000 message may carry (Fast Packet limit).
pub const MAX_N2K_PAYLOAD: usize = 223;

/// Destination used by broadcast (PDU2) messages.
pub const BROADCAST_ADDRESS: u8 = 255;

/// Source address used by a node that could not claim an address.
pub const NULL_ADDRESS: u8 = 254;

/// Default priority applied when none is specified.
pub const DEFAULT_PRIORITY: u8 = 6;

/// Logical NMEA 2000 message, already reassembled from CAN frames or
/// decoded from an Actisense frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct N2kMessage {
    /// Three-bit priority (0 = highest).
    pub priority: u8,
    /// Parameter Group Number (18 bits).
    pub pgn: u32,
    /// Source address of the sender.
    pub source: u8,
    /// Destination address, [`BROADCAST_ADDRESS`] for broadcast.
    pub destination: u8,
    /// Milliseconds timestamp attached on receipt.
    pub timestamp_ms: u32,
    len: usize,
    data: [u8; MAX_N2K_PAYLOAD],
}

impl N2kMessage {
    /// Build a message from its header fields and payload.
    ///
    /// Fails with [`ExtractionError::InvalidDataLen`] when the payload is longer
    /// than [`MAX_N2K_PAYLOAD`].
    pub fn new(
        pgn: u32,
        priority: u8,
        source: u8,
        destination: u8,
        payload: &[u8],
    ) -> Result<Self, ExtractionError> {
        if payload.len() > MAX_N2K_PAYLOAD {
            return Err(ExtractionError::InvalidDataLen);
        }
        let mut data = [0u8; MAX_N2K_PAYLOAD];
        data[..payload.len()].copy_from_slice(payload);
        Ok(Self {
            priority: priority & 0x07,
            pgn,
            source,
            destination,
            timestamp_ms: 0,
            len: payload.len(),
            data,
        })
    }

    /// Attach a receive timestamp.
    pub fn with_timestamp(mut self, timestamp_ms: u32) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }

    /// Valid payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Number of payload bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// `true` when the message targets every node.
    #[inline]
    pub fn is_broadcast(&self) -> bool {
        self.destination == BROADCAST_ADDRESS
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for N2kMessage {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "N2kMessage {{ pgn: {}, prio: {}, src: {}, dst: {}, len: {} }}",
            self.pgn,
            self.priority,
            self.source,
            self.destination,
            self.len
        )
    }
}
