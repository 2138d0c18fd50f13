//! Non-blocking CAN bus access expressed in NMEA 2000 frames. Any
//! `embedded_can::nb::Can` driver gets it for free.
use embedded_can::nb::Can;

use crate::protocol::transport::can_frame::CanFrame;

/// Frame-level view over a non-blocking CAN driver.
pub trait CanBus {
    type Error: core::fmt::Debug;

    /// Queue `frame` for transmission.
    ///
    /// `Ok(Some(_))` returns a lower-priority frame the driver evicted to make
    /// room; `WouldBlock` means the transmit mailbox is full.
    fn send_frame(&mut self, frame: &CanFrame) -> nb::Result<Option<CanFrame>, Self::Error>;

    /// Next received NMEA 2000 frame. Standard-id and remote frames are skipped.
    fn recv_frame(&mut self) -> nb::Result<CanFrame, Self::Error>;
}

impl<C> CanBus for C
where
    C: Can,
    C::Error: core::fmt::Debug,
{
    type Error = C::Error;

    fn send_frame(&mut self, frame: &CanFrame) -> nb::Result<Option<CanFrame>, Self::Error> {
        // Extended ids are 29 bits so the conversion only fails on a corrupted id.
        let Some(driver_frame) = frame.to_driver::<C::Frame>() else {
            return Ok(None);
        };
        let evicted = self.transmit(&driver_frame)?;
        Ok(evicted.as_ref().and_then(CanFrame::from_driver))
    }

    fn recv_frame(&mut self) -> nb::Result<CanFrame, Self::Error> {
        loop {
            let frame = self.receive()?;
            if let Some(frame) = CanFrame::from_driver(&frame) {
                return Ok(frame);
            }
        }
    }
}
