//! Network liveness: time since the last message received from the CAN side,
//! and the one-way escalation to a hardware restart when it grows too long.
use embassy_time::{Duration, Instant};

use crate::infra::watchdog::HardwareWatchdog;

/// Time since the last inbound network message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LivenessTimer {
    last_receipt: Instant,
}

impl LivenessTimer {
    pub const fn new(now: Instant) -> Self {
        Self { last_receipt: now }
    }

    pub fn reset(&mut self, now: Instant) {
        self.last_receipt = now;
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_receipt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LivenessState {
    Alive,
    /// Hardware watchdog armed; terminal for this process instance.
    RestartPending,
}

#[derive(Debug, Clone)]
pub struct LivenessWatchdog {
    bound: Duration,
    restart_timeout: Duration,
    state: LivenessState,
}

impl LivenessWatchdog {
    pub const fn new(bound: Duration, restart_timeout: Duration) -> Self {
        Self {
            bound,
            restart_timeout,
            state: LivenessState::Alive,
        }
    }

    pub fn state(&self) -> LivenessState {
        self.state
    }

    /// Arm `watchdog` once the silence is strictly longer than the bound.
    pub fn check<W: HardwareWatchdog>(
        &mut self,
        timer: &LivenessTimer,
        watchdog: &mut W,
        now: Instant,
    ) -> LivenessState {
        if self.state == LivenessState::Alive && timer.elapsed(now) > self.bound {
            #[cfg(feature = "defmt")]
            defmt::warn!(
                "no NMEA 2000 traffic for {} ms, restarting",
                timer.elapsed(now).as_millis()
            );
            watchdog.arm(self.restart_timeout);
            self.state = LivenessState::RestartPending;
        }
        self.state
    }
}
