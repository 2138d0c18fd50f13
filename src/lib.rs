//! `korri-gateway` library: a `no_std` NMEA 2000 ⇄ Actisense serial gateway.
//! It bridges messages between a CAN bus and a byte stream, recovers the CAN
//! controller from bus-off, and escalates to a hardware restart when the
//! network stays silent for too long.
#![no_std]
//==================================================================================
/// Gateway configuration and the deployed defaults.
pub mod config;
/// Message type shared by the CAN and serial sides.
pub mod core;
/// Domain and low-level errors (frame construction, management frames,
/// submission, Actisense framing).
pub mod error;
/// Scheduler, bridge, bus health, liveness and status.
pub mod gateway;
/// Actisense codec and hardware capabilities (controller registers, watchdog).
pub mod infra;
/// NMEA 2000 protocol implementation: CAN transport, fast packets,
/// address management and the network node.
pub mod protocol;
//==================================================================================
pub use config::GatewayConfig;
pub use gateway::{Gateway, GatewayPeripherals};
