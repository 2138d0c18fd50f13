//! The two bridge handlers, dispatched synchronously by the pump for every
//! message it observes.
use embassy_time::Instant;
use embedded_hal::digital::StatefulOutputPin;

use super::liveness::LivenessTimer;
use super::status::TrafficCounters;
use crate::core::N2kMessage;
use crate::protocol::node::N2kNode;
use crate::protocol::transport::traits::can_bus::CanBus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    /// Complete message received from the NMEA 2000 network.
    NetworkReceived(N2kMessage),
    /// Complete Actisense frame received from the serial link.
    SerialReceived(N2kMessage),
}

/// Borrowed view of what the handlers write.
pub struct MessageBridge<'a, C: CanBus, L, const TX_FRAMES: usize> {
    pub counters: &'a mut TrafficCounters,
    pub liveness: &'a mut LivenessTimer,
    pub led: &'a mut L,
    pub node: &'a mut N2kNode<C, TX_FRAMES>,
}

impl<C, L, const TX_FRAMES: usize> MessageBridge<'_, C, L, TX_FRAMES>
where
    C: CanBus,
    L: StatefulOutputPin,
{
    /// Run the handler for `event`.
    ///
    /// Returns the message put on the network, if the serial side produced one
    /// and the node accepted it. Rejections are dropped.
    pub fn dispatch(&mut self, event: GatewayEvent, now: Instant) -> Option<N2kMessage> {
        match event {
            GatewayEvent::NetworkReceived(_) => {
                self.counters.record_network();
                self.led.toggle().ok();
                self.liveness.reset(now);
                None
            }
            GatewayEvent::SerialReceived(message) => {
                self.counters.record_serial();
                self.led.toggle().ok();
                match self.node.send(&message) {
                    Ok(sent) => Some(sent),
                    Err(_error) => {
                        #[cfg(feature = "defmt")]
                        defmt::debug!(
                            "PGN {} not sent: {}",
                            message.pgn,
                            defmt::Debug2Format(&_error)
                        );
                        None
                    }
                }
            }
        }
    }
}
