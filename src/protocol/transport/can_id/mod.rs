//! Creation and extraction of the 29-bit CAN identifiers used by
//! NMEA 2000 (derived from the SAE J1939 specification).
//!
//! ```text
//! bits 26-28  priority
//! bit  25     reserved (R)
//! bit  24     data page (DP)
//! bits 16-23  PDU format (PF)
//! bits  8-15  PDU specific (PS): destination when PF < 240, group extension otherwise
//! bits  0-7   source address
//! ```
use crate::core::{N2kMessage, BROADCAST_ADDRESS};
use crate::error::FrameBuildError;

/// `true` when the PGN is broadcast-only (PDU2, PF ≥ 240).
#[inline]
pub const fn is_pdu2(pgn: u32) -> bool {
    ((pgn >> 8) & 0xFF) >= 240
}

//==================================================================================CAN_ID
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Extended CAN identifier (29 bits) with NMEA 2000 accessors.
pub struct CanId(pub u32);

impl CanId {
    /// Creates a pre-configured `CanIdBuilder` for a PGN and source address.
    pub fn builder(pgn: u32, source_address: u8) -> CanIdBuilder {
        CanIdBuilder::new(pgn, source_address)
    }

    /// Identifier carrying `message`, sent from `source_address`.
    ///
    /// A PDU2 PGN is always broadcast whatever the message destination says;
    /// a PDU1 PGN keeps its destination (255 addresses every node).
    pub fn for_message(message: &N2kMessage, source_address: u8) -> Result<Self, FrameBuildError> {
        let builder = Self::builder(message.pgn, source_address).with_priority(message.priority);
        if is_pdu2(message.pgn) {
            builder.build()
        } else {
            builder.to_destination(message.destination).build()
        }
    }

    /// Priority (3 bits, 0-7).
    pub const fn priority(&self) -> u8 {
        ((self.0 >> 26) & 0x07) as u8
    }

    /// 18-bit PGN, with the PS byte cleared for PDU1 identifiers.
    pub const fn pgn(&self) -> u32 {
        let pgn = (self.0 >> 8) & 0x3_FFFF;
        if is_pdu2(pgn) {
            pgn
        } else {
            pgn & 0x3_FF00
        }
    }

    /// Explicit destination of a PDU1 identifier, `None` for broadcast PGNs.
    pub const fn destination(&self) -> Option<u8> {
        if is_pdu2(self.pgn()) {
            None
        } else {
            Some(((self.0 >> 8) & 0xFF) as u8)
        }
    }

    /// Destination as carried by an Actisense frame: 255 for PDU2.
    pub const fn destination_or_broadcast(&self) -> u8 {
        match self.destination() {
            Some(destination) => destination,
            None => BROADCAST_ADDRESS,
        }
    }

    pub const fn source_address(&self) -> u8 {
        (self.0 & 0xFF) as u8
    }
}

//==================================================================================CAN_ID_BUILDER
#[derive(Debug, Clone, Copy)]
/// Fluent builder that enforces the PDU1/PDU2 rules.
pub struct CanIdBuilder {
    pub priority: u8,
    pub pgn: u32,
    pub source_address: u8,
    pub destination: Option<u8>,
}

impl CanIdBuilder {
    pub fn new(pgn: u32, source_address: u8) -> Self {
        Self {
            priority: crate::core::DEFAULT_PRIORITY,
            pgn,
            source_address,
            destination: None,
        }
    }

    /// Priority, masked to 3 bits so it never spills into the reserved bit.
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority & 0x07;
        self
    }

    /// Addressed message (PDU1).
    pub fn to_destination(mut self, destination_address: u8) -> Self {
        self.destination = Some(destination_address);
        self
    }

    /// Builds the identifier while applying J1939 rules:
    /// - PF < 240 → addressed (PDU1): destination mandatory, PGN PS byte must be `0`
    /// - PF ≥ 240 → broadcast (PDU2): no destination
    pub fn build(self) -> Result<CanId, FrameBuildError> {
        let pf = ((self.pgn >> 8) & 0xFF) as u8;
        let ps = (self.pgn & 0xFF) as u8;
        let page = (self.pgn >> 16) & 0x03;

        let specific = match self.destination {
            None if pf < 240 => return Err(FrameBuildError::InvalidForBroadcast),
            None => ps,
            Some(_) if pf >= 240 => return Err(FrameBuildError::InvalidForFocusedMessage { pf }),
            Some(_) if ps != 0 => return Err(FrameBuildError::PsFocusMessageMustBeNull),
            Some(destination) => destination,
        };

        Ok(CanId(
            ((self.priority as u32) << 26)
                | (page << 24)
                | ((pf as u32) << 16)
                | ((specific as u32) << 8)
                | (self.source_address as u32),
        ))
    }
}
