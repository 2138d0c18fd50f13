//! Traffic counters and the periodic status read model shown on the display.
use core::fmt;

/// Messages seen on each side since the last status refresh. Saturating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TrafficCounters {
    network_received: u32,
    serial_received: u32,
}

impl TrafficCounters {
    pub const fn new() -> Self {
        Self {
            network_received: 0,
            serial_received: 0,
        }
    }

    pub fn record_network(&mut self) {
        self.network_received = self.network_received.saturating_add(1);
    }

    pub fn record_serial(&mut self) {
        self.serial_received = self.serial_received.saturating_add(1);
    }

    pub fn network_received(&self) -> u32 {
        self.network_received
    }

    pub fn serial_received(&self) -> u32 {
        self.serial_received
    }

    /// Read both counters and start a new period.
    pub fn take(&mut self) -> Self {
        core::mem::take(self)
    }
}

/// Snapshot rendered once per status period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusReport {
    pub title: &'static str,
    pub bus_label: &'static str,
    pub uptime_s: u64,
    /// Messages received from the NMEA 2000 network during the period.
    pub network_received: u32,
    /// Messages received from the serial link during the period.
    pub serial_received: u32,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        writeln!(f, "CAN: {}", self.bus_label)?;
        writeln!(f, "Uptime: {}", self.uptime_s)?;
        writeln!(f, "RX: {}", self.network_received)?;
        write!(f, "TX: {}", self.serial_received)
    }
}

/// Sink for the status read model (an OLED panel on the reference hardware).
pub trait StatusDisplay {
    type Error: fmt::Debug;

    fn init(&mut self) -> Result<(), Self::Error>;

    fn show(&mut self, report: &StatusReport) -> Result<(), Self::Error>;
}

/// Headless gateway.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDisplay;

impl StatusDisplay for NoDisplay {
    type Error = core::convert::Infallible;

    fn init(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn show(&mut self, _report: &StatusReport) -> Result<(), Self::Error> {
        Ok(())
    }
}
