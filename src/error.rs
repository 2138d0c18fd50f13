//! Error definitions shared across library modules.
//! Each type models a specific failure scenario (frame construction,
//! management frame extraction, message submission, Actisense framing).
//!
//! None of these ever reach the top of the gateway: the bridge applies its
//! best-effort policy and drops the offending message.
use thiserror_no_std::Error;

//==================================================================================FRAME_BUILD
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors that can occur while building a 29-bit CAN identifier or the
/// frames carrying a message.
pub enum FrameBuildError {
    /// Attempt to build a broadcast message (PDU2) with PF < 240.
    #[error("Invalid for broadcast message: PF is too low")]
    InvalidForBroadcast,
    /// Attempt to send an addressed message (PDU1) with PF ≥ 240.
    #[error("Invalid for addressed message: PF is too high: {pf}")]
    InvalidForFocusedMessage { pf: u8 },
    /// In PDU1 the lower 8 bits of the PGN must remain zero.
    #[error("PDU1 PGNs require PS = 0")]
    PsFocusMessageMustBeNull,
    /// Payload does not fit in a Fast Packet session.
    #[error("Payload too long: {len} bytes")]
    PayloadTooLong { len: usize },
}

//==================================================================================EXTRACTION
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Failures while extracting information from a raw CAN frame or message.
pub enum ExtractionError {
    /// The frame does not carry the expected PGN.
    #[error("Invalid incoming N2K frame")]
    InvalidIncomingFrame,
    /// Payload length does not match the PGN layout.
    #[error("Invalid data length for PGN")]
    InvalidDataLen,
}

//==================================================================================SEND_ERROR
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors encountered when submitting a message to the network node.
///
/// Driver failures are not among them: they surface from
/// [`N2kNode::flush`](crate::protocol::node::N2kNode::flush) once the
/// message is queued.
pub enum SendError {
    /// Node runs in listen-only mode and never transmits.
    #[error("Node is listen-only")]
    ListenOnly,
    /// No source address could be claimed on the bus.
    #[error("No source address available")]
    NoAddress,
    /// The send frame buffer cannot hold every frame of the message.
    #[error("Send buffer full: {needed} frames needed, {free} free")]
    BufferFull { needed: usize, free: usize },
    /// CAN identifier or frame could not be built.
    #[error("Frame build failed: {0:?}")]
    Build(FrameBuildError),
}

impl From<FrameBuildError> for SendError {
    fn from(err: FrameBuildError) -> Self {
        SendError::Build(err)
    }
}

//==================================================================================ACTISENSE
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Issues encountered while decoding an Actisense BST frame.
pub enum ActisenseError {
    /// Byte sum over command, length, body and checksum is not zero.
    #[error("Checksum mismatch: sum {sum:#04X}")]
    ChecksumMismatch { sum: u8 },
    /// The length byte disagrees with the number of bytes received.
    #[error("Length mismatch: declared {declared}, received {received}")]
    LengthMismatch { declared: usize, received: usize },
    /// Command byte is neither N2K received (0x93) nor N2K send (0x94).
    #[error("Unsupported command {command:#04X}")]
    UnsupportedCommand { command: u8 },
    /// Frame body is shorter than the fixed N2K header.
    #[error("Message too short: {len} bytes")]
    MessageTooShort { len: usize },
    /// N2K data length exceeds the maximum message size.
    #[error("Payload too long: {len} bytes")]
    PayloadTooLong { len: usize },
    /// Frame body overflowed the reader buffer before the end marker.
    #[error("Frame overflow")]
    FrameOverflow,
    /// DLE followed by something other than DLE, STX or ETX.
    #[error("Invalid escape sequence: {byte:#04X}")]
    InvalidEscape { byte: u8 },
}

#[derive(Debug, Error, PartialEq, Eq)]
/// Failures while writing an Actisense frame to the serial port.
pub enum ActisenseWriteError<E: core::fmt::Debug> {
    /// Message does not fit the frame buffer.
    #[error("Frame encoding failed: {0}")]
    Encode(ActisenseError),
    /// Serial port rejected the write.
    #[error("Serial write error: {0:?}")]
    Io(E),
    /// Serial port stopped accepting bytes; the rest of the frame is dropped.
    #[error("Serial port not ready after {written} bytes")]
    NotReady { written: usize },
}
