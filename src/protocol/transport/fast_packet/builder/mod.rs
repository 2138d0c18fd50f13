//! CAN frame generator for NMEA 2000 messages. Produces either one classic
//! frame or a Fast Packet sequence from an application payload.
use crate::error::FrameBuildError;
use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::transport::can_id::CanId;
use crate::protocol::transport::fast_packet::{is_fast_packet, MAX_FAST_PACKET_PAYLOAD};

#[derive(Debug, Clone, Copy)]
/// Shared parameters for all frames composing one message.
pub struct FastPacketBuilder<'a> {
    id: CanId,
    payload: &'a [u8],
    sequence_id: u8,
    fast_packet: bool,
}

/// Lazy iterator returning frames one by one as they are encoded.
#[derive(Debug, Clone)]
pub struct FrameIterator<'a> {
    builder: FastPacketBuilder<'a>,
    frame_index: u8,
    bytes_sent: usize,
    done: bool,
}

impl<'a> FastPacketBuilder<'a> {
    /// Frame encoder for `payload` sent under `id`.
    ///
    /// Fast Packet framing is selected when the PGN is a known fast-packet PGN
    /// or when the payload does not fit in one frame.
    pub fn new(id: CanId, payload: &'a [u8]) -> Result<Self, FrameBuildError> {
        if payload.len() > MAX_FAST_PACKET_PAYLOAD {
            return Err(FrameBuildError::PayloadTooLong { len: payload.len() });
        }
        Ok(Self {
            id,
            payload,
            sequence_id: 0,
            fast_packet: is_fast_packet(id.pgn()) || payload.len() > 8,
        })
    }

    /// 3-bit Fast Packet sequence identifier; the node rotates it per message.
    pub fn with_sequence_id(mut self, sequence_id: u8) -> Self {
        self.sequence_id = sequence_id & 0x07;
        self
    }

    /// Force the framing. Single-frame is ignored for payloads above 8 bytes.
    pub fn fast_packet(mut self, enabled: bool) -> Self {
        self.fast_packet = enabled || self.payload.len() > 8;
        self
    }

    /// Number of CAN frames the message needs.
    pub fn frame_count(&self) -> usize {
        let len = self.payload.len();
        if !self.fast_packet || len <= 6 {
            1
        } else {
            1 + (len - 6).div_ceil(7)
        }
    }

    pub fn build(self) -> FrameIterator<'a> {
        FrameIterator {
            builder: self,
            frame_index: 0,
            bytes_sent: 0,
            done: false,
        }
    }
}

impl Iterator for FrameIterator<'_> {
    type Item = CanFrame;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let payload = self.builder.payload;
        let id = self.builder.id;

        if !self.builder.fast_packet {
            self.done = true;
            self.bytes_sent = payload.len();
            return Some(CanFrame::new(id, payload));
        }

        let header = (self.builder.sequence_id << 5) | (self.frame_index & 0x1F);
        let mut data = [0xFF; 8];
        data[0] = header;

        let len = if self.frame_index == 0 {
            // Byte 1 carries the total payload length.
            data[1] = payload.len() as u8;
            let count = payload.len().min(6);
            data[2..2 + count].copy_from_slice(&payload[..count]);
            self.bytes_sent = count;
            2 + count
        } else {
            let count = (payload.len() - self.bytes_sent).min(7);
            data[1..1 + count].copy_from_slice(&payload[self.bytes_sent..self.bytes_sent + count]);
            self.bytes_sent += count;
            1 + count
        };

        self.frame_index = self.frame_index.wrapping_add(1);
        if self.bytes_sent >= payload.len() {
            self.done = true;
        }

        Some(CanFrame { id, data, len })
    }
}
