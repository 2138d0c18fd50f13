//! NMEA 2000 protocol: network management, CAN/Fast Packet transport and the
//! node that combines them.
pub mod managment;
pub mod node;
pub mod transport;
