//! ISO Request (PGN 59904) parsing and the negative acknowledgement
//! (PGN 59392) sent for PGNs the node does not provide.
use crate::error::{ExtractionError, FrameBuildError};
use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::transport::can_id::CanId;

pub const PGN_ISO_REQUEST: u32 = 59904;
pub const PGN_ISO_ACKNOWLEDGEMENT: u32 = 59392;

/// Control byte of a NAK in PGN 59392.
const CONTROL_NAK: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IsoRequest {
    pub requester: u8,
    /// Destination of the request, 255 when sent to every node.
    pub destination: u8,
    pub requested_pgn: u32,
}

impl IsoRequest {
    pub fn from_frame(frame: &CanFrame) -> Result<Self, ExtractionError> {
        if frame.id.pgn() != PGN_ISO_REQUEST {
            return Err(ExtractionError::InvalidIncomingFrame);
        }
        let data = frame.payload();
        if data.len() < 3 {
            return Err(ExtractionError::InvalidDataLen);
        }
        Ok(Self {
            requester: frame.id.source_address(),
            destination: frame.id.destination_or_broadcast(),
            requested_pgn: u32::from_le_bytes([data[0], data[1], data[2], 0]),
        })
    }

    /// `true` when the request targets `address` directly or every node.
    pub fn is_for(&self, address: u8) -> bool {
        self.destination == address || self.destination == crate::core::BROADCAST_ADDRESS
    }

    pub fn is_global(&self) -> bool {
        self.destination == crate::core::BROADCAST_ADDRESS
    }
}

/// NAK for `pgn`, sent from `source` back to `requester`.
pub fn build_nak(source: u8, requester: u8, pgn: u32) -> Result<CanFrame, FrameBuildError> {
    let id = CanId::builder(PGN_ISO_ACKNOWLEDGEMENT, source)
        .to_destination(requester)
        .with_priority(6)
        .build()?;
    let pgn = pgn.to_le_bytes();
    Ok(CanFrame::new(
        id,
        &[CONTROL_NAK, 0xFF, 0xFF, 0xFF, 0xFF, pgn[0], pgn[1], pgn[2]],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(source: u8, destination: u8, pgn: u32) -> CanFrame {
        let id = CanId::builder(PGN_ISO_REQUEST, source)
            .to_destination(destination)
            .build()
            .unwrap();
        let pgn = pgn.to_le_bytes();
        CanFrame::new(id, &pgn[..3])
    }

    #[test]
    fn test_parse_request() {
        let parsed = IsoRequest::from_frame(&request(0x20, 15, 126996)).unwrap();
        assert_eq!(parsed.requester, 0x20);
        assert_eq!(parsed.requested_pgn, 126996);
        assert!(parsed.is_for(15));
        assert!(!parsed.is_for(16));
        assert!(!parsed.is_global());
    }

    #[test]
    fn test_global_request_targets_everyone() {
        let parsed = IsoRequest::from_frame(&request(0x20, 255, 60928)).unwrap();
        assert!(parsed.is_global());
        assert!(parsed.is_for(42));
    }

    #[test]
    fn test_rejects_short_or_foreign_frames() {
        let mut short = request(0x20, 15, 126996);
        short.len = 2;
        assert_eq!(IsoRequest::from_frame(&short), Err(ExtractionError::InvalidDataLen));

        let foreign = CanFrame::new(CanId::builder(127250, 1).build().unwrap(), &[0; 8]);
        assert_eq!(
            IsoRequest::from_frame(&foreign),
            Err(ExtractionError::InvalidIncomingFrame)
        );
    }

    #[test]
    fn test_nak_layout() {
        let nak = build_nak(15, 0x20, 130306).unwrap();
        assert_eq!(nak.id.pgn(), PGN_ISO_ACKNOWLEDGEMENT);
        assert_eq!(nak.id.destination(), Some(0x20));
        assert_eq!(nak.id.source_address(), 15);
        assert_eq!(nak.payload(), &[1, 0xFF, 0xFF, 0xFF, 0xFF, 0x02, 0xFD, 0x01]);
    }
}
