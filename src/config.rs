//! Gateway configuration: task periods, fault-handling bounds, device identity
//! and forwarding policy.
//!
//! Every default reproduces the deployed USB gateway. Firmware adjusts values
//! through the `with_*` setters before building the [`Gateway`](crate::gateway::Gateway).
use embassy_time::Duration;

use crate::protocol::managment::iso_name::IsoName;

/// Minimum interval between two bus-off recovery attempts (ms).
pub const RECOVERY_RETRY_MS: u64 = 1_000;

/// Longest tolerated silence on the network before a forced restart (ms).
pub const MAX_RX_WAIT_TIME_MS: u64 = 30_000;

/// Hardware watchdog timeout armed on sustained silence (ms).
pub const RESTART_WATCHDOG_TIMEOUT_MS: u64 = 1_000;

/// Heartbeat LED toggle interval (µs).
pub const HEARTBEAT_INTERVAL_US: u64 = 1_000_000;

/// Bus health poll + message pump period (ms).
pub const PUMP_PERIOD_MS: u64 = 1;

/// Liveness check period (ms).
pub const LIVENESS_PERIOD_MS: u64 = 100;

/// Status refresh and counter reset period (ms).
pub const STATUS_PERIOD_MS: u64 = 1_000;

/// Source address assigned to Actisense frames that carry none (0x94).
pub const DEFAULT_ACTISENSE_SOURCE: u8 = 75;

/// Address tried first during the address claim.
pub const DEFAULT_PREFERRED_ADDRESS: u8 = 15;

/// Send/receive CAN frame buffer sizing.
pub const CAN_FRAME_BUFFER_SIZE: usize = 250;

/// How the node takes part in the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NodeMode {
    /// Receive only; every submission is rejected.
    ListenOnly,
    /// Claim an address and send with it, overriding the message source.
    ListenAndNode,
    /// Send with the source carried by each message, no address claim.
    ListenAndSend,
}

/// Device identification advertised through the ISO NAME (PGN 60928).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceInformation {
    /// Unique number, e.g. a serial number (21 bits).
    pub unique_number: u32,
    /// Device function code (130 = PC gateway).
    pub device_function: u8,
    /// Device class code (25 = inter/intranetwork device).
    pub device_class: u8,
    /// Manufacturer code (11 bits).
    pub manufacturer_code: u16,
    /// Industry group, 4 for marine.
    pub industry_group: u8,
}

impl DeviceInformation {
    pub const fn new() -> Self {
        Self {
            unique_number: 1,
            device_function: 130,
            device_class: 25,
            manufacturer_code: 2046,
            industry_group: 4,
        }
    }

    /// ISO NAME of an arbitrary-address-capable node with this identity.
    pub const fn iso_name(&self) -> IsoName {
        IsoName::builder()
            .unique_number(self.unique_number)
            .manufacturer_code(self.manufacturer_code)
            .device_function(self.device_function)
            .device_class(self.device_class)
            .industry_group(self.industry_group)
            .arbitrary_address_capable(true)
            .build()
    }
}

impl Default for DeviceInformation {
    fn default() -> Self {
        Self::new()
    }
}

/// Product information answered on request (PGN 126996).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProductInformation {
    /// NMEA 2000 database version (2101 = 2.101).
    pub n2k_version: u16,
    /// Manufacturer's product code.
    pub product_code: u16,
    /// Model ID, at most 32 characters.
    pub model_id: &'static str,
    /// Software version code, at most 32 characters.
    pub software_version: &'static str,
    /// Model version, at most 32 characters.
    pub model_version: &'static str,
    /// Model serial code, at most 32 characters.
    pub model_serial_code: &'static str,
    pub certification_level: u8,
    /// Load equivalency in units of 50 mA.
    pub load_equivalency: u8,
}

impl ProductInformation {
    pub const fn new() -> Self {
        Self {
            n2k_version: 2101,
            product_code: 103,
            model_id: "SH-ESP32 NMEA 2000 USB GW",
            software_version: "0.1.0.0 (2021-03-31)",
            model_version: "0.0.3.1 (2021-03-07)",
            model_serial_code: "20210331",
            certification_level: 1,
            load_equivalency: 1,
        }
    }
}

impl Default for ProductInformation {
    fn default() -> Self {
        Self::new()
    }
}

/// Complete gateway configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GatewayConfig {
    pub heartbeat_interval: Duration,
    pub pump_period: Duration,
    pub liveness_period: Duration,
    pub status_period: Duration,
    /// Backoff between bus-off recovery attempts.
    pub recovery_retry: Duration,
    /// Liveness bound: silence longer than this forces a restart.
    pub max_rx_wait: Duration,
    /// Timeout armed on the hardware watchdog when the bound is exceeded.
    pub restart_timeout: Duration,
    pub node_mode: NodeMode,
    pub preferred_address: u8,
    pub device: DeviceInformation,
    pub product: ProductInformation,
    /// Source address for Actisense frames without one.
    pub default_source: u8,
    /// Forward every received network message to the serial link.
    pub forward_enabled: bool,
    /// Also forward messages this node transmits.
    pub forward_own_messages: bool,
    /// Upper bound on CAN frames drained per pump.
    pub rx_frames_per_pump: usize,
    /// First line of the status display.
    pub display_title: &'static str,
}

impl GatewayConfig {
    pub const fn new() -> Self {
        Self {
            heartbeat_interval: Duration::from_micros(HEARTBEAT_INTERVAL_US),
            pump_period: Duration::from_millis(PUMP_PERIOD_MS),
            liveness_period: Duration::from_millis(LIVENESS_PERIOD_MS),
            status_period: Duration::from_millis(STATUS_PERIOD_MS),
            recovery_retry: Duration::from_millis(RECOVERY_RETRY_MS),
            max_rx_wait: Duration::from_millis(MAX_RX_WAIT_TIME_MS),
            restart_timeout: Duration::from_millis(RESTART_WATCHDOG_TIMEOUT_MS),
            node_mode: NodeMode::ListenAndNode,
            preferred_address: DEFAULT_PREFERRED_ADDRESS,
            device: DeviceInformation::new(),
            product: ProductInformation::new(),
            default_source: DEFAULT_ACTISENSE_SOURCE,
            forward_enabled: true,
            forward_own_messages: false,
            rx_frames_per_pump: CAN_FRAME_BUFFER_SIZE,
            display_title: "SH-ESP32 N2K USB GW",
        }
    }

    pub const fn with_max_rx_wait(mut self, bound: Duration) -> Self {
        self.max_rx_wait = bound;
        self
    }

    pub const fn with_recovery_retry(mut self, interval: Duration) -> Self {
        self.recovery_retry = interval;
        self
    }

    pub const fn with_restart_timeout(mut self, timeout: Duration) -> Self {
        self.restart_timeout = timeout;
        self
    }

    pub const fn with_node_mode(mut self, mode: NodeMode) -> Self {
        self.node_mode = mode;
        self
    }

    pub const fn with_preferred_address(mut self, address: u8) -> Self {
        self.preferred_address = address;
        self
    }

    pub const fn with_device(mut self, device: DeviceInformation) -> Self {
        self.device = device;
        self
    }

    pub const fn with_product(mut self, product: ProductInformation) -> Self {
        self.product = product;
        self
    }

    pub const fn with_default_source(mut self, source: u8) -> Self {
        self.default_source = source;
        self
    }

    pub const fn with_forwarding(mut self, enabled: bool, own_messages: bool) -> Self {
        self.forward_enabled = enabled;
        self.forward_own_messages = own_messages;
        self
    }

    pub const fn with_rx_frames_per_pump(mut self, frames: usize) -> Self {
        self.rx_frames_per_pump = frames;
        self
    }

    pub const fn with_display_title(mut self, title: &'static str) -> Self {
        self.display_title = title;
        self
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::new()
    }
}
