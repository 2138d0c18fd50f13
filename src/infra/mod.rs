//! Hardware-facing building blocks: the Actisense serial codec and the
//! narrow capabilities the gateway needs from the CAN controller and the
//! restart watchdog.
pub mod actisense;
pub mod controller;
pub mod watchdog;
