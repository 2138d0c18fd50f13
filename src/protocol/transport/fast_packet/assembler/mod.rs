//! NMEA 2000 Fast Packet assembler: rebuilds application messages by
//! aggregating the CAN frames of a multi-packet session.
//!
//! Sessions are keyed by source address, PGN and 3-bit sequence identifier, so
//! one sender may interleave different PGNs. A new first frame for a
//! `(source, pgn)` pair takes over any session that pair left unfinished.
use super::MAX_FAST_PACKET_PAYLOAD;

//==================================================================================Constants

/// Maximum number of Fast Packet sessions handled in parallel.
const MAX_CONCURRENT_SESSIONS: usize = 8;

/// Payload bytes carried by the first frame (after counter and length).
const FIRST_FRAME_BYTES: usize = 6;

/// Payload bytes carried by every continuation frame (after the counter).
const NEXT_FRAME_BYTES: usize = 7;

//==================================================================================Enums and Structs
#[derive(Debug, PartialEq, Eq)]
pub enum ProcessResult {
    /// Frame discarded: unknown session, out-of-sequence, pool exhausted or bad length.
    Ignored,
    /// Frame stored; more fragments are expected.
    FragmentConsumed,
    /// Last fragment received; the complete payload is returned.
    MessageComplete(CompletedMessage),
}

/// Reassembled payload, copied out of the session buffer.
#[derive(Debug, PartialEq, Eq)]
pub struct CompletedMessage {
    pub payload: [u8; MAX_FAST_PACKET_PAYLOAD],
    pub len: usize,
}

impl CompletedMessage {
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.payload[..self.len]
    }
}

#[derive(Debug, Clone, Copy)]
struct FastPacketSession {
    in_progress: bool,
    source_address: u8,
    pgn: u32,
    sequence_id: u8,
    buffer: [u8; MAX_FAST_PACKET_PAYLOAD],
    expected_size: usize,
    current_size: usize,
    last_frame_index: u8,
}

impl FastPacketSession {
    const fn new() -> Self {
        Self {
            in_progress: false,
            source_address: 0,
            pgn: 0,
            sequence_id: 0,
            buffer: [0; MAX_FAST_PACKET_PAYLOAD],
            expected_size: 0,
            current_size: 0,
            last_frame_index: 0,
        }
    }

    fn matches(&self, source_address: u8, pgn: u32) -> bool {
        self.source_address == source_address && self.pgn == pgn
    }

    fn release(&mut self) {
        self.in_progress = false;
        self.current_size = 0;
        self.last_frame_index = 0;
    }

    fn take_message(&mut self) -> CompletedMessage {
        let mut payload = [0; MAX_FAST_PACKET_PAYLOAD];
        let len = self.expected_size;
        payload[..len].copy_from_slice(&self.buffer[..len]);
        self.release();
        CompletedMessage { payload, len }
    }
}

/// Fixed pool of reusable reassembly sessions.
#[derive(Debug, Clone)]
pub struct FastPacketAssembler {
    sessions: [FastPacketSession; MAX_CONCURRENT_SESSIONS],
}

impl Default for FastPacketAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl FastPacketAssembler {
    pub const fn new() -> Self {
        Self {
            sessions: [FastPacketSession::new(); MAX_CONCURRENT_SESSIONS],
        }
    }

    /// Number of sessions waiting for more fragments.
    pub fn pending_sessions(&self) -> usize {
        self.sessions.iter().filter(|s| s.in_progress).count()
    }

    //==================================================================================Process Functions
    /// Feed one CAN frame belonging to a fast-packet PGN.
    ///
    /// * `source_address` – sender of the frame
    /// * `pgn` – PGN extracted from the CAN identifier
    /// * `data` – raw 8-byte payload of the frame
    pub fn process_frame(&mut self, source_address: u8, pgn: u32, data: &[u8; 8]) -> ProcessResult {
        let frame_index = data[0] & 0x1F;
        let sequence_id = (data[0] >> 5) & 0x07;

        if frame_index == 0 {
            self.start_session(source_address, pgn, sequence_id, data)
        } else {
            self.continue_session(source_address, pgn, sequence_id, frame_index, data)
        }
    }

    fn start_session(
        &mut self,
        source_address: u8,
        pgn: u32,
        sequence_id: u8,
        data: &[u8; 8],
    ) -> ProcessResult {
        let expected_size = data[1] as usize;
        if expected_size > MAX_FAST_PACKET_PAYLOAD {
            return ProcessResult::Ignored;
        }

        let slot = self
            .sessions
            .iter()
            .position(|s| s.in_progress && s.matches(source_address, pgn))
            .or_else(|| self.sessions.iter().position(|s| !s.in_progress));

        let Some(index) = slot else {
            #[cfg(feature = "defmt")]
            defmt::debug!("fast packet pool exhausted, PGN {} from {}", pgn, source_address);
            return ProcessResult::Ignored;
        };

        let session = &mut self.sessions[index];
        session.in_progress = true;
        session.source_address = source_address;
        session.pgn = pgn;
        session.sequence_id = sequence_id;
        session.expected_size = expected_size;
        session.last_frame_index = 0;

        let copy_len = expected_size.min(FIRST_FRAME_BYTES);
        session.buffer[..copy_len].copy_from_slice(&data[2..2 + copy_len]);
        session.current_size = copy_len;

        if session.current_size >= session.expected_size {
            ProcessResult::MessageComplete(session.take_message())
        } else {
            ProcessResult::FragmentConsumed
        }
    }

    fn continue_session(
        &mut self,
        source_address: u8,
        pgn: u32,
        sequence_id: u8,
        frame_index: u8,
        data: &[u8; 8],
    ) -> ProcessResult {
        let Some(session) = self.sessions.iter_mut().find(|s| {
            s.in_progress && s.matches(source_address, pgn) && s.sequence_id == sequence_id
        }) else {
            return ProcessResult::Ignored;
        };

        if frame_index != session.last_frame_index.wrapping_add(1) {
            // A lost fragment invalidates the whole message.
            session.release();
            return ProcessResult::Ignored;
        }
        session.last_frame_index = frame_index;

        let copy_len = (session.expected_size - session.current_size).min(NEXT_FRAME_BYTES);
        let start = session.current_size;
        session.buffer[start..start + copy_len].copy_from_slice(&data[1..1 + copy_len]);
        session.current_size += copy_len;

        if session.current_size >= session.expected_size {
            ProcessResult::MessageComplete(session.take_message())
        } else {
            ProcessResult::FragmentConsumed
        }
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
