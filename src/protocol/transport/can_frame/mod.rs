//! In-memory representation of an NMEA 2000 CAN frame and its conversion
//! to and from any `embedded_can::Frame` driver type.
use embedded_can::{ExtendedId, Frame, Id};

use crate::protocol::transport::can_id::CanId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Raw NMEA 2000 frame as read from or written to the CAN bus.
pub struct CanFrame {
    /// Full 29-bit CAN identifier.
    pub id: CanId,
    /// Payload buffer, unused bytes padded with `0xFF`.
    pub data: [u8; 8],
    /// Number of valid payload bytes (Data Length Code, 0 to 8).
    pub len: usize,
}

impl CanFrame {
    /// Build a frame from up to eight payload bytes.
    pub fn new(id: CanId, payload: &[u8]) -> Self {
        let len = payload.len().min(8);
        let mut data = [0xFF; 8];
        data[..len].copy_from_slice(&payload[..len]);
        Self { id, data, len }
    }

    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.len]
    }

    /// Convert a driver frame. Standard identifiers and remote frames are
    /// not NMEA 2000 traffic and yield `None`.
    pub fn from_driver<F: Frame>(frame: &F) -> Option<Self> {
        if frame.is_remote_frame() {
            return None;
        }
        match frame.id() {
            Id::Extended(ext) => Some(Self::new(CanId(ext.as_raw()), frame.data())),
            Id::Standard(_) => None,
        }
    }

    /// Convert into the driver's frame type.
    pub fn to_driver<F: Frame>(&self) -> Option<F> {
        let id = ExtendedId::new(self.id.0)?;
        F::new(id, self.payload())
    }
}
