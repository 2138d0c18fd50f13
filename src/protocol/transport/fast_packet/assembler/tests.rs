//! Fast Packet reassembly tests covering sequencing and session handling.
use super::*;

const PGN: u32 = 129029;

fn completed(data: &[u8]) -> ProcessResult {
    let mut payload = [0; MAX_FAST_PACKET_PAYLOAD];
    payload[..data.len()].copy_from_slice(data);
    ProcessResult::MessageComplete(CompletedMessage {
        payload,
        len: data.len(),
    })
}

#[test]
/// Rebuild a complete message from three valid fragments.
fn test_full_fast_packet_reassembly() {
    let mut assembler = FastPacketAssembler::new();

    let frame0: [u8; 8] = [0b000_00000, 15, 1, 2, 3, 4, 5, 6];
    assert_eq!(assembler.process_frame(42, PGN, &frame0), ProcessResult::FragmentConsumed);

    let frame1: [u8; 8] = [0b000_00001, 7, 8, 9, 10, 11, 12, 13];
    assert_eq!(assembler.process_frame(42, PGN, &frame1), ProcessResult::FragmentConsumed);

    // Two useful bytes, the rest is padding.
    let frame2: [u8; 8] = [0b000_00010, 14, 15, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
    assert_eq!(
        assembler.process_frame(42, PGN, &frame2),
        completed(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15])
    );
    assert_eq!(assembler.pending_sessions(), 0);
}

#[test]
/// A declared length of six bytes or less completes on the first frame.
fn test_short_fast_packet_completes_immediately() {
    let mut assembler = FastPacketAssembler::new();
    let frame0: [u8; 8] = [0b011_00000, 4, 9, 8, 7, 6, 0xFF, 0xFF];
    assert_eq!(assembler.process_frame(3, PGN, &frame0), completed(&[9, 8, 7, 6]));
    assert_eq!(assembler.pending_sessions(), 0);
}

#[test]
fn test_oversized_declared_length_is_ignored() {
    let mut assembler = FastPacketAssembler::new();
    let frame0: [u8; 8] = [0, 224, 1, 2, 3, 4, 5, 6];
    assert_eq!(assembler.process_frame(3, PGN, &frame0), ProcessResult::Ignored);
}

#[test]
/// An out-of-sequence frame is dropped and the session released.
fn test_out_of_sequence_packet() {
    let mut assembler = FastPacketAssembler::new();
    let frame0: [u8; 8] = [0b000_00000, 15, 1, 2, 3, 4, 5, 6];
    assembler.process_frame(10, PGN, &frame0);

    let frame2: [u8; 8] = [0b000_00010, 14, 15, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
    assert_eq!(assembler.process_frame(10, PGN, &frame2), ProcessResult::Ignored);
    assert_eq!(assembler.pending_sessions(), 0);
}

#[test]
fn test_continuation_without_start_is_ignored() {
    let mut assembler = FastPacketAssembler::new();
    let frame1: [u8; 8] = [0b000_00001, 7, 8, 9, 10, 11, 12, 13];
    assert_eq!(assembler.process_frame(10, PGN, &frame1), ProcessResult::Ignored);
}

#[test]
/// Two sources sending at the same time do not collide.
fn test_multiple_concurrent_sessions() {
    let mut assembler = FastPacketAssembler::new();

    let frame_a0: [u8; 8] = [0, 10, 1, 2, 3, 4, 5, 6];
    assert_eq!(assembler.process_frame(10, PGN, &frame_a0), ProcessResult::FragmentConsumed);
    let frame_b0: [u8; 8] = [0, 9, 100, 101, 102, 103, 104, 105];
    assert_eq!(assembler.process_frame(20, PGN, &frame_b0), ProcessResult::FragmentConsumed);
    assert_eq!(assembler.pending_sessions(), 2);

    let frame_a1: [u8; 8] = [1, 7, 8, 9, 10, 0xFF, 0xFF, 0xFF];
    assert_eq!(
        assembler.process_frame(10, PGN, &frame_a1),
        completed(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10])
    );
    let frame_b1: [u8; 8] = [1, 106, 107, 108, 0xFF, 0xFF, 0xFF, 0xFF];
    assert_eq!(
        assembler.process_frame(20, PGN, &frame_b1),
        completed(&[100, 101, 102, 103, 104, 105, 106, 107, 108])
    );
}

#[test]
/// One source may interleave two PGNs that share a sequence identifier.
fn test_same_source_different_pgns() {
    let mut assembler = FastPacketAssembler::new();

    let frame_a0: [u8; 8] = [0b001_00000, 10, 1, 2, 3, 4, 5, 6];
    assembler.process_frame(7, 129029, &frame_a0);
    let frame_b0: [u8; 8] = [0b001_00000, 9, 21, 22, 23, 24, 25, 26];
    assembler.process_frame(7, 129540, &frame_b0);

    let frame_b1: [u8; 8] = [0b001_00001, 27, 28, 29, 0xFF, 0xFF, 0xFF, 0xFF];
    assert_eq!(
        assembler.process_frame(7, 129540, &frame_b1),
        completed(&[21, 22, 23, 24, 25, 26, 27, 28, 29])
    );
    let frame_a1: [u8; 8] = [0b001_00001, 7, 8, 9, 10, 0xFF, 0xFF, 0xFF];
    assert_eq!(
        assembler.process_frame(7, 129029, &frame_a1),
        completed(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10])
    );
}

#[test]
/// A fresh first frame abandons the unfinished message of the same sender.
fn test_new_start_replaces_stale_session() {
    let mut assembler = FastPacketAssembler::new();

    let stale: [u8; 8] = [0b001_00000, 20, 1, 1, 1, 1, 1, 1];
    assembler.process_frame(7, PGN, &stale);
    let fresh: [u8; 8] = [0b010_00000, 8, 2, 2, 2, 2, 2, 2];
    assembler.process_frame(7, PGN, &fresh);
    assert_eq!(assembler.pending_sessions(), 1);

    // Continuation of the stale sequence has nowhere to go.
    let stale_next: [u8; 8] = [0b001_00001, 1, 1, 1, 1, 1, 1, 1];
    assert_eq!(assembler.process_frame(7, PGN, &stale_next), ProcessResult::Ignored);

    let fresh_next: [u8; 8] = [0b010_00001, 3, 3, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
    assert_eq!(
        assembler.process_frame(7, PGN, &fresh_next),
        completed(&[2, 2, 2, 2, 2, 2, 3, 3])
    );
}

#[test]
fn test_pool_exhaustion_ignores_new_sessions() {
    let mut assembler = FastPacketAssembler::new();
    let start: [u8; 8] = [0, 20, 0, 0, 0, 0, 0, 0];
    for source in 0..MAX_CONCURRENT_SESSIONS as u8 {
        assert_eq!(assembler.process_frame(source, PGN, &start), ProcessResult::FragmentConsumed);
    }
    assert_eq!(assembler.process_frame(200, PGN, &start), ProcessResult::Ignored);
}
