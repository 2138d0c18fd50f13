//! Every piece of mutable gateway state, owned by the [`Gateway`](super::Gateway)
//! and lent by `&mut` to the task that writes it.
use embassy_time::Instant;

use super::bus_health::BusHealthMonitor;
use super::liveness::{LivenessTimer, LivenessWatchdog};
use super::status::{StatusReport, TrafficCounters};
use crate::config::GatewayConfig;

#[derive(Debug, Clone)]
pub struct GatewayState {
    /// Written by the pump task, read by the status task.
    pub bus: BusHealthMonitor,
    /// Written by the bridge, drained by the status task.
    pub counters: TrafficCounters,
    /// Reset by the bridge, read by the liveness task.
    pub liveness: LivenessTimer,
    pub watchdog: LivenessWatchdog,
    pub started_at: Instant,
    pub last_status: Option<StatusReport>,
    /// Forward-stream frames the serial port could not take. Saturating.
    pub dropped_forwards: u32,
}

impl GatewayState {
    pub fn new(config: &GatewayConfig, now: Instant) -> Self {
        Self {
            bus: BusHealthMonitor::new(config.recovery_retry),
            counters: TrafficCounters::new(),
            liveness: LivenessTimer::new(now),
            watchdog: LivenessWatchdog::new(config.max_rx_wait, config.restart_timeout),
            started_at: now,
            last_status: None,
            dropped_forwards: 0,
        }
    }

    /// Whole seconds since the gateway started.
    pub fn uptime_s(&self, now: Instant) -> u64 {
        now.saturating_duration_since(self.started_at).as_secs()
    }
}
