//! Actisense frame encoder.
use embedded_io::{Write, WriteReady};
use heapless::Vec;

use super::{checksum, ActisenseCommand, DLE, ETX, MAX_FRAME_BODY, STX};
use crate::core::N2kMessage;
use crate::error::{ActisenseError, ActisenseWriteError};

/// Worst case on the wire: every content byte escaped, plus start and end markers.
pub const MAX_ENCODED_FRAME: usize = 2 * MAX_FRAME_BODY + 4;

pub type EncodedFrame = Vec<u8, MAX_ENCODED_FRAME>;

/// Encode `message` as a `command` frame into `out` (cleared first).
pub fn encode(
    command: ActisenseCommand,
    message: &N2kMessage,
    out: &mut EncodedFrame,
) -> Result<(), ActisenseError> {
    let mut body: Vec<u8, MAX_FRAME_BODY> = Vec::new();
    let overflow = |_| ActisenseError::FrameOverflow;
    let pgn = message.pgn.to_le_bytes();

    body.push(command as u8).map_err(overflow)?;
    // Length placeholder, patched once the body is known.
    body.push(0).map_err(overflow)?;
    body.push(message.priority).map_err(overflow)?;
    body.extend_from_slice(&pgn[..3]).map_err(|_| ActisenseError::FrameOverflow)?;
    body.push(message.destination).map_err(overflow)?;
    if command == ActisenseCommand::N2kReceived {
        body.push(message.source).map_err(overflow)?;
        body.extend_from_slice(&message.timestamp_ms.to_le_bytes())
            .map_err(|_| ActisenseError::FrameOverflow)?;
    }
    body.push(message.len() as u8).map_err(overflow)?;
    body.extend_from_slice(message.payload())
        .map_err(|_| ActisenseError::PayloadTooLong { len: message.len() })?;
    body[1] = (body.len() - 2) as u8;
    let check = checksum(&body);
    body.push(check).map_err(overflow)?;

    out.clear();
    let mut put = |byte: u8| out.push(byte).map_err(|_| ActisenseError::FrameOverflow);
    put(DLE)?;
    put(STX)?;
    for &byte in body.iter() {
        if byte == DLE {
            put(DLE)?;
        }
        put(byte)?;
    }
    put(DLE)?;
    put(ETX)
}

/// Write `message` to `serial` as a `command` frame without blocking.
///
/// Bytes go out only while the port reports it can take them. When it stops,
/// the rest of the frame is dropped and [`ActisenseWriteError::NotReady`]
/// tells how much reached the port; the host reader resynchronises on the
/// next frame start.
pub fn write_command<S: Write + WriteReady>(
    serial: &mut S,
    command: ActisenseCommand,
    message: &N2kMessage,
) -> Result<(), ActisenseWriteError<S::Error>> {
    let mut frame = EncodedFrame::new();
    encode(command, message, &mut frame).map_err(ActisenseWriteError::Encode)?;

    let mut written = 0;
    while written < frame.len() {
        if !serial.write_ready().map_err(ActisenseWriteError::Io)? {
            return Err(ActisenseWriteError::NotReady { written });
        }
        match serial.write(&frame[written..]).map_err(ActisenseWriteError::Io)? {
            0 => return Err(ActisenseWriteError::NotReady { written }),
            n => written += n,
        }
    }
    Ok(())
}

/// Forward stream entry: `message` as an "N2K received" (0x93) frame.
pub fn write<S: Write + WriteReady>(
    serial: &mut S,
    message: &N2kMessage,
) -> Result<(), ActisenseWriteError<S::Error>> {
    write_command(serial, ActisenseCommand::N2kReceived, message)
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
