//! The NMEA 2000 ⇄ Actisense gateway: one value owning both transports,
//! the peripherals and every piece of state, driven by a cooperative
//! scheduler.
//!
//! ```text
//! tick(now) ─┬─ heartbeat: toggle LED
//!            ├─ pump:      bus health poll → CAN frames → serial bytes → flush
//!            ├─ liveness:  arm the hardware watchdog after too long a silence
//!            └─ status:    render counters, then reset them
//! ```
use embassy_time::{Instant, Ticker};
use embedded_hal::digital::StatefulOutputPin;
use embedded_io::{Read, ReadReady, Write, WriteReady};

use crate::config::GatewayConfig;
use crate::core::N2kMessage;
use crate::infra::actisense::reader::ActisenseReader;
use crate::infra::actisense::writer;
use crate::infra::controller::ControllerRegisters;
use crate::infra::watchdog::HardwareWatchdog;
use crate::protocol::node::{N2kNode, Received};
use crate::protocol::transport::traits::can_bus::CanBus;

pub mod bridge;
pub mod bus_health;
pub mod liveness;
pub mod scheduler;
pub mod state;
pub mod status;

use bridge::{GatewayEvent, MessageBridge};
use liveness::LivenessState;
use scheduler::{Scheduler, SchedulerState, TaskId};
use state::GatewayState;
use status::{StatusDisplay, StatusReport};

/// Hardware handed over to the gateway at start-up.
pub struct GatewayPeripherals<C, S, R, W, L, D> {
    /// CAN driver.
    pub can: C,
    /// Serial port carrying Actisense frames.
    pub serial: S,
    /// CAN controller registers used for bus-off recovery.
    pub registers: R,
    pub watchdog: W,
    /// Heartbeat indicator.
    pub led: L,
    pub display: D,
}

pub struct Gateway<C, S, R, W, L, D, const TX_FRAMES: usize = 250>
where
    C: CanBus,
{
    config: GatewayConfig,
    node: N2kNode<C, TX_FRAMES>,
    serial: S,
    reader: ActisenseReader,
    registers: R,
    watchdog: W,
    led: L,
    display: Option<D>,
    scheduler: Scheduler,
    state: GatewayState,
}

impl<C, S, R, W, L, D, const TX_FRAMES: usize> Gateway<C, S, R, W, L, D, TX_FRAMES>
where
    C: CanBus,
    S: Read + ReadReady + Write + WriteReady,
    R: ControllerRegisters,
    W: HardwareWatchdog,
    L: StatefulOutputPin,
    D: StatusDisplay,
{
    /// Bring the gateway up at `now`: open the node, initialise the display
    /// and register the periodic tasks.
    pub fn new(
        peripherals: GatewayPeripherals<C, S, R, W, L, D>,
        config: GatewayConfig,
        now: Instant,
    ) -> Self {
        let GatewayPeripherals {
            can,
            serial,
            registers,
            watchdog,
            led,
            mut display,
        } = peripherals;

        let mut node = N2kNode::new(can, &config);
        node.open(now);

        let display = match display.init() {
            Ok(()) => Some(display),
            Err(_error) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("display init failed: {}", defmt::Debug2Format(&_error));
                None
            }
        };

        let mut scheduler = Scheduler::new();
        scheduler.register(TaskId::Heartbeat, config.heartbeat_interval, now);
        scheduler.register(TaskId::Pump, config.pump_period, now);
        scheduler.register(TaskId::Liveness, config.liveness_period, now);
        scheduler.register(TaskId::Status, config.status_period, now);

        #[cfg(feature = "defmt")]
        defmt::info!("gateway started");

        Self {
            reader: ActisenseReader::new(config.default_source),
            state: GatewayState::new(&config, now),
            config,
            node,
            serial,
            registers,
            watchdog,
            led,
            display,
            scheduler,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn node(&self) -> &N2kNode<C, TX_FRAMES> {
        &self.node
    }

    pub fn state(&self) -> &GatewayState {
        &self.state
    }

    pub fn scheduler_state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    /// Status rendered by the last status task run.
    pub fn last_status(&self) -> Option<&StatusReport> {
        self.state.last_status.as_ref()
    }

    pub fn has_display(&self) -> bool {
        self.display.is_some()
    }

    /// Malformed Actisense frames dropped by the serial reader.
    pub fn rejected_serial_frames(&self) -> u32 {
        self.reader.rejected_frames()
    }

    /// Run every task due at `now`.
    pub fn tick(&mut self, now: Instant) -> SchedulerState {
        for task in self.scheduler.due_tasks(now) {
            match task {
                TaskId::Heartbeat => {
                    self.led.toggle().ok();
                }
                TaskId::Pump => self.pump(now),
                TaskId::Liveness => self.check_liveness(now),
                TaskId::Status => self.refresh_status(now),
            }
            if self.scheduler.state() == SchedulerState::AwaitingRestart {
                break;
            }
        }
        self.scheduler.state()
    }

    /// Bus health poll, then drain the CAN side and the serial side.
    pub fn pump(&mut self, now: Instant) {
        self.state.bus.poll(&mut self.registers, now);
        self.pump_network(now);
        self.pump_serial(now);
        if self.node.flush().is_err() {
            #[cfg(feature = "defmt")]
            defmt::debug!("CAN transmit error while flushing");
        }
    }

    fn pump_network(&mut self, now: Instant) {
        for _ in 0..self.config.rx_frames_per_pump {
            let message = match self.node.poll(now) {
                Received::Nothing => break,
                Received::Consumed => continue,
                Received::Message(message) => message,
            };
            if self.config.forward_enabled {
                forward(&mut self.serial, &mut self.state, &message);
            }
            self.bridge()
                .dispatch(GatewayEvent::NetworkReceived(message), now);
        }
    }

    fn pump_serial(&mut self, now: Instant) {
        let timestamp_ms = now.as_millis() as u32;
        loop {
            let message = match self.reader.read_message(&mut self.serial, timestamp_ms) {
                Ok(Some(message)) => message,
                Ok(None) => break,
                Err(_error) => {
                    #[cfg(feature = "defmt")]
                    defmt::debug!("serial read error: {}", defmt::Debug2Format(&_error));
                    break;
                }
            };
            let sent = self
                .bridge()
                .dispatch(GatewayEvent::SerialReceived(message), now);
            if let Some(sent) = sent {
                if self.config.forward_enabled && self.config.forward_own_messages {
                    forward(&mut self.serial, &mut self.state, &sent);
                }
            }
        }
    }

    fn bridge(&mut self) -> MessageBridge<'_, C, L, TX_FRAMES> {
        MessageBridge {
            counters: &mut self.state.counters,
            liveness: &mut self.state.liveness,
            led: &mut self.led,
            node: &mut self.node,
        }
    }

    fn check_liveness(&mut self, now: Instant) {
        let state = self
            .state
            .watchdog
            .check(&self.state.liveness, &mut self.watchdog, now);
        if state == LivenessState::RestartPending {
            self.scheduler.halt();
        }
    }

    fn refresh_status(&mut self, now: Instant) {
        let period = self.state.counters.take();
        let report = StatusReport {
            title: self.config.display_title,
            bus_label: self.state.bus.label(),
            uptime_s: self.state.uptime_s(now),
            network_received: period.network_received(),
            serial_received: period.serial_received(),
        };
        if let Some(display) = self.display.as_mut() {
            if display.show(&report).is_err() {
                #[cfg(feature = "defmt")]
                defmt::debug!("display refresh failed");
            }
        }
        self.state.last_status = Some(report);
    }

    /// Tick on every pump period until a restart is pending.
    pub async fn run_until_restart(&mut self) {
        let mut ticker = Ticker::every(self.config.pump_period);
        while self.tick(Instant::now()) == SchedulerState::Running {
            ticker.next().await;
        }
    }

    /// Drive the gateway forever. Once the hardware watchdog is armed the
    /// loop stops feeding anything and waits for the reset.
    pub async fn run(mut self) -> ! {
        self.run_until_restart().await;
        loop {
            core::hint::spin_loop();
        }
    }
}

/// Forward stream: one 0x93 frame on the serial link. A port that cannot
/// take the frame right away loses it; the loss is counted.
fn forward<S: Write + WriteReady>(serial: &mut S, state: &mut GatewayState, message: &N2kMessage) {
    if let Err(_error) = writer::write(serial, message) {
        state.dropped_forwards = state.dropped_forwards.saturating_add(1);
        #[cfg(feature = "defmt")]
        defmt::debug!("forward of PGN {} dropped: {}", message.pgn, defmt::Debug2Format(&_error));
    }
}
