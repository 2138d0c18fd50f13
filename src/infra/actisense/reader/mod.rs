//! Incremental Actisense frame reader. Bytes can arrive in any chunking;
//! the reader keeps its position between calls and yields one
//! [`N2kMessage`] per complete, valid frame.
use embedded_io::{Read, ReadReady};
use heapless::Vec;

use super::{ActisenseCommand, DLE, ETX, MAX_FRAME_BODY, N2K_RECEIVED_HEADER, N2K_SEND_HEADER, STX};
use crate::core::{N2kMessage, MAX_N2K_PAYLOAD};
use crate::error::ActisenseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReaderState {
    /// Outside a frame, waiting for DLE.
    AwaitDle,
    /// DLE seen outside a frame, waiting for STX.
    AwaitStx,
    /// Inside a frame.
    Body,
    /// DLE seen inside a frame.
    Escape,
}

#[derive(Debug, Clone)]
pub struct ActisenseReader {
    state: ReaderState,
    body: Vec<u8, MAX_FRAME_BODY>,
    default_source: u8,
    rejected_frames: u32,
}

impl ActisenseReader {
    /// `default_source` is the source address given to 0x94 frames.
    pub fn new(default_source: u8) -> Self {
        Self {
            state: ReaderState::AwaitDle,
            body: Vec::new(),
            default_source,
            rejected_frames: 0,
        }
    }

    /// Frames dropped so far for a framing or content error.
    pub fn rejected_frames(&self) -> u32 {
        self.rejected_frames
    }

    /// Drain the bytes `serial` has ready and return the first complete message.
    ///
    /// Malformed frames are dropped. Call again until `Ok(None)` to empty the port.
    pub fn read_message<S>(
        &mut self,
        serial: &mut S,
        timestamp_ms: u32,
    ) -> Result<Option<N2kMessage>, S::Error>
    where
        S: Read + ReadReady,
    {
        let mut byte = [0u8; 1];
        while serial.read_ready()? {
            if serial.read(&mut byte)? == 0 {
                break;
            }
            match self.push_byte(byte[0], timestamp_ms) {
                Ok(Some(message)) => return Ok(Some(message)),
                Ok(None) => {}
                Err(_error) => {
                    self.rejected_frames = self.rejected_frames.wrapping_add(1);
                    #[cfg(feature = "defmt")]
                    defmt::debug!("Actisense frame dropped: {}", _error);
                }
            }
        }
        Ok(None)
    }

    /// Feed one byte. Returns a message when it closes a valid frame.
    pub fn push_byte(
        &mut self,
        byte: u8,
        timestamp_ms: u32,
    ) -> Result<Option<N2kMessage>, ActisenseError> {
        match self.state {
            ReaderState::AwaitDle => {
                if byte == DLE {
                    self.state = ReaderState::AwaitStx;
                }
            }
            ReaderState::AwaitStx => match byte {
                STX => self.start_frame(),
                DLE => {}
                _ => self.state = ReaderState::AwaitDle,
            },
            ReaderState::Body => {
                if byte == DLE {
                    self.state = ReaderState::Escape;
                } else {
                    self.store(byte)?;
                }
            }
            ReaderState::Escape => match byte {
                DLE => {
                    self.state = ReaderState::Body;
                    self.store(DLE)?;
                }
                ETX => {
                    self.state = ReaderState::AwaitDle;
                    return self.decode(timestamp_ms).map(Some);
                }
                // A frame start inside a frame: the previous one was truncated.
                STX => self.start_frame(),
                byte => {
                    self.state = ReaderState::AwaitDle;
                    return Err(ActisenseError::InvalidEscape { byte });
                }
            },
        }
        Ok(None)
    }

    fn start_frame(&mut self) {
        self.body.clear();
        self.state = ReaderState::Body;
    }

    fn store(&mut self, byte: u8) -> Result<(), ActisenseError> {
        self.body.push(byte).map_err(|_| {
            self.state = ReaderState::AwaitDle;
            ActisenseError::FrameOverflow
        })
    }

    fn decode(&self, timestamp_ms: u32) -> Result<N2kMessage, ActisenseError> {
        let frame = self.body.as_slice();
        if frame.len() < 3 {
            return Err(ActisenseError::MessageTooShort { len: frame.len() });
        }
        let sum = frame.iter().fold(0u8, |sum, b| sum.wrapping_add(*b));
        if sum != 0 {
            return Err(ActisenseError::ChecksumMismatch { sum });
        }

        let body = &frame[2..frame.len() - 1];
        let declared = frame[1] as usize;
        if declared != body.len() {
            return Err(ActisenseError::LengthMismatch {
                declared,
                received: body.len(),
            });
        }

        match ActisenseCommand::try_from(frame[0])? {
            ActisenseCommand::N2kReceived => decode_n2k_received(body),
            ActisenseCommand::N2kSend => decode_n2k_send(body, self.default_source, timestamp_ms),
        }
    }
}

fn pgn_from(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], 0])
}

/// Check the N2K data length byte against what the frame carries.
fn n2k_data(body: &[u8], header: usize) -> Result<&[u8], ActisenseError> {
    if body.len() < header {
        return Err(ActisenseError::MessageTooShort { len: body.len() });
    }
    let declared = body[header - 1] as usize;
    if declared > MAX_N2K_PAYLOAD {
        return Err(ActisenseError::PayloadTooLong { len: declared });
    }
    let data = &body[header..];
    if declared != data.len() {
        return Err(ActisenseError::LengthMismatch {
            declared,
            received: data.len(),
        });
    }
    Ok(data)
}

/// `prio, pgn[3], dst, src, timestamp[4], len, data`
fn decode_n2k_received(body: &[u8]) -> Result<N2kMessage, ActisenseError> {
    let data = n2k_data(body, N2K_RECEIVED_HEADER)?;
    let timestamp_ms = u32::from_le_bytes([body[6], body[7], body[8], body[9]]);
    N2kMessage::new(pgn_from(&body[1..4]), body[0], body[5], body[4], data)
        .map(|message| message.with_timestamp(timestamp_ms))
        .map_err(|_| ActisenseError::PayloadTooLong { len: data.len() })
}

/// `prio, pgn[3], dst, len, data`
fn decode_n2k_send(
    body: &[u8],
    default_source: u8,
    timestamp_ms: u32,
) -> Result<N2kMessage, ActisenseError> {
    let data = n2k_data(body, N2K_SEND_HEADER)?;
    N2kMessage::new(pgn_from(&body[1..4]), body[0], default_source, body[4], data)
        .map(|message| message.with_timestamp(timestamp_ms))
        .map_err(|_| ActisenseError::PayloadTooLong { len: data.len() })
}
