use super::*;
use core::convert::Infallible;
use embedded_io::{ErrorKind, ErrorType};
use embedded_io::WriteReady;

/// Serial sink collecting written bytes, with `room` bytes of output buffer.
struct Sink {
    bytes: Vec<u8, 512>,
    room: usize,
}

impl Default for Sink {
    fn default() -> Self {
        Self {
            bytes: Vec::new(),
            room: 512,
        }
    }
}

impl Sink {
    fn with_room(room: usize) -> Self {
        Self {
            room,
            ..Self::default()
        }
    }
}

impl ErrorType for Sink {
    type Error = Infallible;
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Infallible> {
        let n = buf.len().min(self.room - self.bytes.len());
        self.bytes.extend_from_slice(&buf[..n]).ok();
        Ok(n)
    }

    fn flush(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

impl WriteReady for Sink {
    fn write_ready(&mut self) -> Result<bool, Infallible> {
        Ok(self.bytes.len() < self.room)
    }
}

struct Unplugged;

impl ErrorType for Unplugged {
    type Error = ErrorKind;
}

impl Write for Unplugged {
    fn write(&mut self, _buf: &[u8]) -> Result<usize, ErrorKind> {
        Err(ErrorKind::NotConnected)
    }

    fn flush(&mut self) -> Result<(), ErrorKind> {
        Ok(())
    }
}

impl WriteReady for Unplugged {
    fn write_ready(&mut self) -> Result<bool, ErrorKind> {
        Ok(true)
    }
}

#[test]
fn test_encode_send_frame() {
    let message = N2kMessage::new(127250, 2, 75, 255, &[1, 2, 3]).unwrap();
    let mut frame = EncodedFrame::new();
    encode(ActisenseCommand::N2kSend, &message, &mut frame).unwrap();
    assert_eq!(
        frame.as_slice(),
        &[0x10, 0x02, 0x94, 0x09, 0x02, 0x12, 0xF1, 0x01, 0xFF, 0x03, 0x01, 0x02, 0x03, 0x55, 0x10, 0x03]
    );
}

#[test]
/// 0x93 carries source and timestamp; the length byte counts them.
fn test_encode_received_frame_layout() {
    let message = N2kMessage::new(127250, 2, 0x23, 255, &[0xAA])
        .unwrap()
        .with_timestamp(0x0403_0201);
    let mut frame = EncodedFrame::new();
    encode(ActisenseCommand::N2kReceived, &message, &mut frame).unwrap();

    assert_eq!(&frame[..4], &[0x10, 0x02, 0x93, 12]);
    assert_eq!(&frame[9..15], &[0x23, 0x01, 0x02, 0x03, 0x04, 0x01]);
    assert_eq!(&frame[frame.len() - 2..], &[0x10, 0x03]);
    let content = &frame[2..frame.len() - 2];
    assert_eq!(content.iter().fold(0u8, |s, b| s.wrapping_add(*b)), 0);
}

#[test]
fn test_dle_bytes_are_doubled() {
    let message = N2kMessage::new(127250, 2, 75, 255, &[0x10]).unwrap();
    let mut frame = EncodedFrame::new();
    encode(ActisenseCommand::N2kSend, &message, &mut frame).unwrap();
    // cmd len prio pgn[3] dst dlen, then the escaped data byte.
    assert_eq!(&frame[10..12], &[0x10, 0x10]);
}

#[test]
fn test_largest_message_fits() {
    let message = N2kMessage::new(129029, 3, 1, 255, &[0x10; 223]).unwrap();
    let mut frame = EncodedFrame::new();
    assert!(encode(ActisenseCommand::N2kReceived, &message, &mut frame).is_ok());
}

#[test]
fn test_write_reaches_serial() {
    let message = N2kMessage::new(127250, 2, 75, 255, &[1, 2, 3]).unwrap();
    let mut sink = Sink::default();
    write(&mut sink, &message).unwrap();
    assert_eq!(sink.bytes[2], 0x93);
    assert_eq!(&sink.bytes[sink.bytes.len() - 2..], &[0x10, 0x03]);
}

#[test]
fn test_serial_failure_is_reported() {
    let message = N2kMessage::new(127250, 2, 75, 255, &[1, 2, 3]).unwrap();
    assert_eq!(
        write(&mut Unplugged, &message),
        Err(ActisenseWriteError::Io(ErrorKind::NotConnected))
    );
}

#[test]
fn test_full_port_is_not_waited_on() {
    let message = N2kMessage::new(127250, 2, 75, 255, &[1, 2, 3]).unwrap();
    let mut sink = Sink::with_room(0);
    assert_eq!(
        write(&mut sink, &message),
        Err(ActisenseWriteError::NotReady { written: 0 })
    );
    assert!(sink.bytes.is_empty());
}

#[test]
/// The port fills up mid-frame: what fitted stays written, the rest is dropped.
fn test_port_filling_mid_frame_truncates() {
    let message = N2kMessage::new(127250, 2, 75, 255, &[1, 2, 3]).unwrap();
    let mut sink = Sink::with_room(6);
    assert_eq!(
        write(&mut sink, &message),
        Err(ActisenseWriteError::NotReady { written: 6 })
    );
    assert_eq!(&sink.bytes[..3], &[0x10, 0x02, 0x93]);
}
