//! CAN bus health: classify the controller state on every poll and bring a
//! bus-off controller back onto the bus, at most once per retry interval.
use embassy_time::{Duration, Instant};

use crate::infra::controller::{CommandRegister, ControllerRegisters, RECOVERY_TX_ERROR_COUNT};

/// Label shown before the first poll.
pub const UNKNOWN_LABEL: &str = "UNKNOWN";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusState {
    Running,
    BusOff,
}

impl BusState {
    pub const fn label(&self) -> &'static str {
        match self {
            BusState::Running => "RUNNING",
            BusState::BusOff => "BUS-OFF",
        }
    }
}

/// Bookkeeping of the recovery started while the bus is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RecoveryAttempt {
    pub started_at: Instant,
}

impl RecoveryAttempt {
    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started_at)
    }
}

#[derive(Debug, Clone)]
pub struct BusHealthMonitor {
    state: Option<BusState>,
    recovery: Option<RecoveryAttempt>,
    retry_interval: Duration,
    recoveries: u32,
}

impl BusHealthMonitor {
    pub const fn new(retry_interval: Duration) -> Self {
        Self {
            state: None,
            recovery: None,
            retry_interval,
            recoveries: 0,
        }
    }

    /// Last observed state, `None` before the first poll.
    pub fn state(&self) -> Option<BusState> {
        self.state
    }

    pub fn label(&self) -> &'static str {
        self.state.map_or(UNKNOWN_LABEL, |state| state.label())
    }

    /// Recovery in progress, only while the bus stays off.
    pub fn recovery(&self) -> Option<RecoveryAttempt> {
        self.recovery
    }

    /// Recovery sequences run since start-up.
    pub fn recoveries(&self) -> u32 {
        self.recoveries
    }

    /// Read the controller status and react to it.
    pub fn poll<R: ControllerRegisters>(&mut self, registers: &mut R, now: Instant) -> BusState {
        let state = if registers.read_status().is_bus_off() {
            BusState::BusOff
        } else {
            BusState::Running
        };

        if self.state != Some(state) {
            #[cfg(feature = "defmt")]
            match state {
                BusState::Running => defmt::info!("CAN bus running"),
                BusState::BusOff => defmt::warn!("CAN bus off"),
            }
            self.state = Some(state);
        }

        match state {
            BusState::Running => self.recovery = None,
            BusState::BusOff => {
                let due = self
                    .recovery
                    .map_or(true, |attempt| attempt.elapsed(now) >= self.retry_interval);
                if due {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("starting bus-off recovery");
                    Self::recover(registers);
                    self.recovery = Some(RecoveryAttempt { started_at: now });
                    self.recoveries = self.recoveries.saturating_add(1);
                }
            }
        }
        state
    }

    /// Controller recovery sequence: abort the pending transmission, settle
    /// the status, preset the error counters, then leave reset mode.
    pub fn recover<R: ControllerRegisters>(registers: &mut R) {
        registers.write_command(CommandRegister::abort_transmission());
        let _settle = registers.read_status();
        registers.write_tx_error_counter(RECOVERY_TX_ERROR_COUNT);
        registers.write_rx_error_counter(0);
        let mode = registers.read_mode();
        registers.write_mode(mode.with_reset_mode(false));
    }
}
