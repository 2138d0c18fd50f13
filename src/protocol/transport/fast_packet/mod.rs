//! NMEA 2000 Fast Packet support: encapsulates payloads larger than eight bytes
//! across successive CAN frames.
/// Maximum payload a Fast Packet can transport once reassembled.
pub const MAX_FAST_PACKET_PAYLOAD: usize = crate::core::MAX_N2K_PAYLOAD;

pub mod assembler;
pub mod builder;

/// `true` when the PGN is transported with Fast Packet framing.
///
/// Covers the standard fast-packet PGNs in use on NMEA 2000 networks plus the
/// proprietary fast-packet ranges (126720, 130816-131071).
pub const fn is_fast_packet(pgn: u32) -> bool {
    matches!(
        pgn,
        126208
            | 126464
            | 126720
            | 126983..=126988
            | 126996
            | 126998
            | 127233
            | 127237
            | 127489
            | 127496..=127498
            | 127503
            | 127504
            | 127506
            | 127507
            | 127509..=127514
            | 128275
            | 128520
            | 128538
            | 129029
            | 129038..=129041
            | 129044
            | 129045
            | 129284
            | 129285
            | 129301
            | 129302
            | 129538
            | 129540..=129542
            | 129545
            | 129547
            | 129549
            | 129551
            | 129556
            | 129792..=129810
            | 130052..=130054
            | 130060
            | 130061
            | 130064..=130074
            | 130320..=130324
            | 130567
            | 130569..=130571
            | 130573..=130580
            | 130816..=131071
    )
}
