//! Register-level view of an SJA1000-style CAN controller (ESP32 TWAI
//! layout), limited to what bus-off detection and recovery touch.

/// TX error counter value written during recovery: just under the
/// error-passive limit so the controller re-enters error-active quickly.
pub const RECOVERY_TX_ERROR_COUNT: u8 = 127;

//==================================================================================STATUS
/// Status register (SR), read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusRegister(pub u8);

impl StatusRegister {
    pub const RECEIVE_BUFFER: u8 = 1 << 0;
    pub const DATA_OVERRUN: u8 = 1 << 1;
    pub const TRANSMIT_BUFFER: u8 = 1 << 2;
    pub const TRANSMISSION_COMPLETE: u8 = 1 << 3;
    pub const RECEIVING: u8 = 1 << 4;
    pub const TRANSMITTING: u8 = 1 << 5;
    pub const ERROR: u8 = 1 << 6;
    pub const BUS_OFF: u8 = 1 << 7;

    #[inline]
    pub const fn is_set(&self, bit: u8) -> bool {
        self.0 & bit != 0
    }

    /// BS bit: the controller left the bus after too many transmit errors.
    #[inline]
    pub const fn is_bus_off(&self) -> bool {
        self.is_set(Self::BUS_OFF)
    }

    #[inline]
    pub const fn has_error(&self) -> bool {
        self.is_set(Self::ERROR)
    }
}

//==================================================================================COMMAND
/// Command register (CMR), write-only. Bits are one-shot requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandRegister(pub u8);

impl CommandRegister {
    pub const TRANSMISSION_REQUEST: u8 = 1 << 0;
    pub const ABORT_TRANSMISSION: u8 = 1 << 1;
    pub const RELEASE_RECEIVE_BUFFER: u8 = 1 << 2;
    pub const CLEAR_DATA_OVERRUN: u8 = 1 << 3;
    pub const SELF_RECEPTION_REQUEST: u8 = 1 << 4;

    pub const fn abort_transmission() -> Self {
        Self(Self::ABORT_TRANSMISSION)
    }
}

//==================================================================================MODE
/// Mode register (MOD).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModeRegister(pub u8);

impl ModeRegister {
    pub const RESET_MODE: u8 = 1 << 0;
    pub const LISTEN_ONLY: u8 = 1 << 1;
    pub const SELF_TEST: u8 = 1 << 2;
    pub const ACCEPTANCE_FILTER: u8 = 1 << 3;

    /// RM bit: set by hardware on bus-off, cleared to rejoin the bus.
    #[inline]
    pub const fn is_reset_mode(&self) -> bool {
        self.0 & Self::RESET_MODE != 0
    }

    #[inline]
    pub const fn with_reset_mode(self, enabled: bool) -> Self {
        if enabled {
            Self(self.0 | Self::RESET_MODE)
        } else {
            Self(self.0 & !Self::RESET_MODE)
        }
    }
}

//==================================================================================CAPABILITY
/// Narrow register access granted to the bus health monitor.
///
/// Implementations map these calls onto the memory-mapped registers of the
/// real controller; host tests use a simulated register set.
pub trait ControllerRegisters {
    fn read_status(&mut self) -> StatusRegister;
    fn write_command(&mut self, command: CommandRegister);
    fn read_mode(&mut self) -> ModeRegister;
    fn write_mode(&mut self, mode: ModeRegister);
    fn write_tx_error_counter(&mut self, count: u8);
    fn write_rx_error_counter(&mut self, count: u8);
}

impl<T: ControllerRegisters + ?Sized> ControllerRegisters for &mut T {
    fn read_status(&mut self) -> StatusRegister {
        (**self).read_status()
    }

    fn write_command(&mut self, command: CommandRegister) {
        (**self).write_command(command)
    }

    fn read_mode(&mut self) -> ModeRegister {
        (**self).read_mode()
    }

    fn write_mode(&mut self, mode: ModeRegister) {
        (**self).write_mode(mode)
    }

    fn write_tx_error_counter(&mut self, count: u8) {
        (**self).write_tx_error_counter(count)
    }

    fn write_rx_error_counter(&mut self, count: u8) {
        (**self).write_rx_error_counter(count)
    }
}
