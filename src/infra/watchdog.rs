//! Hardware restart watchdog capability.
use embassy_time::Duration;

/// One-way watchdog: once armed it restarts the device when the calling
/// context stops feeding it, and the gateway never feeds it.
pub trait HardwareWatchdog {
    /// Arm with `timeout` and subscribe the current execution context.
    fn arm(&mut self, timeout: Duration);
}

impl<T: HardwareWatchdog + ?Sized> HardwareWatchdog for &mut T {
    fn arm(&mut self, timeout: Duration) {
        (**self).arm(timeout)
    }
}
