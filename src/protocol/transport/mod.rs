//! NMEA 2000 transport layer: CAN frame representations, 29-bit identifier
//! management, Fast Packet encoding, and the bus abstraction.

pub mod can_frame;
pub mod can_id;
pub mod fast_packet;
pub mod traits;
