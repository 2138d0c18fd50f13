//! NMEA 2000 node on top of a non-blocking CAN driver.
//!
//! The node owns the send buffer and the receive path. Each [`N2kNode::poll`]
//! reads at most one CAN frame, answers the network management traffic
//! (address claims, ISO requests) and hands back complete messages. Outgoing
//! messages are split into frames, queued, then flushed as far as the driver
//! accepts them.
use embassy_time::Instant;
use heapless::Deque;

use crate::config::{GatewayConfig, NodeMode, ProductInformation};
use crate::core::N2kMessage;
use crate::error::{FrameBuildError, SendError};
use crate::protocol::managment::address_claiming::{AddressClaim, PGN_ISO_ADDRESS_CLAIM};
use crate::protocol::managment::iso_request::{build_nak, IsoRequest, PGN_ISO_REQUEST};
use crate::protocol::managment::product_information::{self, PGN_PRODUCT_INFORMATION};
use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::transport::can_id::CanId;
use crate::protocol::transport::fast_packet::assembler::{FastPacketAssembler, ProcessResult};
use crate::protocol::transport::fast_packet::builder::FastPacketBuilder;
use crate::protocol::transport::fast_packet::is_fast_packet;
use crate::protocol::transport::traits::can_bus::CanBus;

/// Outcome of one receive step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    /// Nothing pending on the bus (or a driver error).
    Nothing,
    /// A frame was read but did not complete a message.
    Consumed,
    /// A complete message arrived.
    Message(N2kMessage),
}

/// Queued frame, tagged with the message it belongs to.
#[derive(Debug, Clone, Copy)]
struct QueuedFrame {
    frame: CanFrame,
    message: u16,
}

pub struct N2kNode<C: CanBus, const TX_FRAMES: usize = 250> {
    can: C,
    mode: NodeMode,
    claim: AddressClaim,
    product: ProductInformation,
    assembler: FastPacketAssembler,
    tx_queue: Deque<QueuedFrame, TX_FRAMES>,
    sequence_id: u8,
    next_message: u16,
}

impl<C: CanBus, const TX_FRAMES: usize> N2kNode<C, TX_FRAMES> {
    pub fn new(can: C, config: &GatewayConfig) -> Self {
        Self {
            can,
            mode: config.node_mode,
            claim: AddressClaim::new(config.device.iso_name(), config.preferred_address),
            product: config.product,
            assembler: FastPacketAssembler::new(),
            tx_queue: Deque::new(),
            sequence_id: 0,
            next_message: 0,
        }
    }

    /// Join the network. A full node starts claiming its address.
    pub fn open(&mut self, now: Instant) {
        #[cfg(feature = "defmt")]
        defmt::info!("N2K node open, mode {}", self.mode);
        if self.mode == NodeMode::ListenAndNode {
            if let Some(frame) = self.claim.start(now) {
                self.enqueue_frame(frame);
            }
            self.flush().ok();
        }
    }

    pub fn mode(&self) -> NodeMode {
        self.mode
    }

    /// Claimed source address, if any.
    pub fn address(&self) -> Option<u8> {
        self.claim.address()
    }

    pub fn address_claim(&self) -> &AddressClaim {
        &self.claim
    }

    /// Frames waiting in the send buffer.
    pub fn pending_frames(&self) -> usize {
        self.tx_queue.len()
    }

    pub fn can(&self) -> &C {
        &self.can
    }

    pub fn can_mut(&mut self) -> &mut C {
        &mut self.can
    }

    //==================================================================================RECEIVE
    /// Read and process at most one frame.
    pub fn poll(&mut self, now: Instant) -> Received {
        if self.mode == NodeMode::ListenAndNode {
            self.claim.poll(now);
        }

        let frame = match self.can.recv_frame() {
            Ok(frame) => frame,
            Err(nb::Error::WouldBlock) => return Received::Nothing,
            Err(nb::Error::Other(_error)) => {
                #[cfg(feature = "defmt")]
                defmt::debug!("CAN receive error: {}", defmt::Debug2Format(&_error));
                return Received::Nothing;
            }
        };

        if self.mode == NodeMode::ListenAndNode {
            self.handle_management(&frame, now);
        }

        match self.assemble(&frame, now) {
            Some(message) => Received::Message(message),
            None => Received::Consumed,
        }
    }

    fn assemble(&mut self, frame: &CanFrame, now: Instant) -> Option<N2kMessage> {
        let id = frame.id;
        let pgn = id.pgn();
        let timestamp_ms = now.as_millis() as u32;

        let build = |payload: &[u8]| {
            N2kMessage::new(
                pgn,
                id.priority(),
                id.source_address(),
                id.destination_or_broadcast(),
                payload,
            )
            .map(|message| message.with_timestamp(timestamp_ms))
            .ok()
        };

        if !is_fast_packet(pgn) {
            return build(frame.payload());
        }
        match self
            .assembler
            .process_frame(id.source_address(), pgn, &frame.data)
        {
            ProcessResult::MessageComplete(completed) => build(completed.as_slice()),
            ProcessResult::FragmentConsumed | ProcessResult::Ignored => None,
        }
    }

    fn handle_management(&mut self, frame: &CanFrame, now: Instant) {
        match frame.id.pgn() {
            PGN_ISO_ADDRESS_CLAIM => {
                if let Some(response) = self.claim.on_claim(frame, now) {
                    self.enqueue_frame(response);
                }
            }
            PGN_ISO_REQUEST => {
                if let Ok(request) = IsoRequest::from_frame(frame) {
                    self.answer_request(&request);
                }
            }
            _ => {}
        }
    }

    fn answer_request(&mut self, request: &IsoRequest) {
        match request.requested_pgn {
            // Claims are answered even while the address is not settled.
            PGN_ISO_ADDRESS_CLAIM => {
                if let Some(claim) = self.claim.claim_frame() {
                    if request.is_for(claim.id.source_address()) {
                        self.enqueue_frame(claim);
                    }
                }
            }
            pgn => {
                let Some(address) = self.claim.address() else {
                    return;
                };
                if !request.is_for(address) {
                    return;
                }
                if pgn == PGN_PRODUCT_INFORMATION {
                    let payload = product_information::encode(&self.product);
                    let queued = CanId::builder(PGN_PRODUCT_INFORMATION, address)
                        .build()
                        .and_then(|id| self.enqueue_payload(id, &payload));
                    if queued.is_err() {
                        #[cfg(feature = "defmt")]
                        defmt::debug!("product information not queued");
                    }
                } else if !request.is_global() {
                    if let Ok(nak) = build_nak(address, request.requester, pgn) {
                        self.enqueue_frame(nak);
                    }
                }
            }
        }
    }

    //==================================================================================SEND
    /// Queue `message` for transmission and flush what the driver accepts.
    ///
    /// Returns the message as put on the wire (source address applied) once
    /// all its frames are queued. A message whose frames do not all fit in the
    /// send buffer is rejected whole. Driver errors met while flushing belong
    /// to whichever frame was at the head of the queue and are only logged.
    pub fn send(&mut self, message: &N2kMessage) -> Result<N2kMessage, SendError> {
        let source = match self.mode {
            NodeMode::ListenOnly => return Err(SendError::ListenOnly),
            NodeMode::ListenAndNode => self.claim.address().ok_or(SendError::NoAddress)?,
            NodeMode::ListenAndSend => message.source,
        };

        let id = CanId::for_message(message, source)?;
        let builder = FastPacketBuilder::new(id, message.payload())?;
        let needed = builder.frame_count();
        let free = TX_FRAMES - self.tx_queue.len();
        if needed > free {
            return Err(SendError::BufferFull { needed, free });
        }
        self.push_frames(builder);
        if let Err(_error) = self.flush() {
            #[cfg(feature = "defmt")]
            defmt::debug!("CAN transmit error: {}", defmt::Debug2Format(&_error));
        }

        let mut sent = message.clone();
        sent.source = source;
        Ok(sent)
    }

    /// Hand queued frames to the driver until its mailbox is full.
    ///
    /// A frame the driver fails on is dropped together with the frames left
    /// of its message, and the error returned.
    pub fn flush(&mut self) -> Result<(), C::Error> {
        while let Some(queued) = self.tx_queue.pop_front() {
            match self.can.send_frame(&queued.frame) {
                Ok(None) => {}
                Ok(Some(evicted)) => {
                    let message = self.take_message_tag();
                    self.tx_queue
                        .push_front(QueuedFrame {
                            frame: evicted,
                            message,
                        })
                        .ok();
                }
                Err(nb::Error::WouldBlock) => {
                    self.tx_queue.push_front(queued).ok();
                    return Ok(());
                }
                Err(nb::Error::Other(error)) => {
                    self.drop_message(queued.message);
                    #[cfg(feature = "defmt")]
                    defmt::debug!("CAN transmit error, PGN {} dropped", queued.frame.id.pgn());
                    return Err(error);
                }
            }
        }
        Ok(())
    }

    fn drop_message(&mut self, message: u16) {
        while matches!(self.tx_queue.front(), Some(next) if next.message == message) {
            self.tx_queue.pop_front();
        }
    }

    fn take_message_tag(&mut self) -> u16 {
        let tag = self.next_message;
        self.next_message = self.next_message.wrapping_add(1);
        tag
    }

    fn enqueue_payload(&mut self, id: CanId, payload: &[u8]) -> Result<(), FrameBuildError> {
        let builder = FastPacketBuilder::new(id, payload)?;
        if builder.frame_count() > TX_FRAMES - self.tx_queue.len() {
            #[cfg(feature = "defmt")]
            defmt::debug!("send buffer full, PGN {} dropped", id.pgn());
            return Ok(());
        }
        self.push_frames(builder);
        Ok(())
    }

    fn push_frames(&mut self, builder: FastPacketBuilder<'_>) {
        let sequence_id = self.sequence_id;
        self.sequence_id = (self.sequence_id + 1) & 0x07;
        let message = self.take_message_tag();
        for frame in builder.with_sequence_id(sequence_id).build() {
            self.tx_queue.push_back(QueuedFrame { frame, message }).ok();
        }
    }

    fn enqueue_frame(&mut self, frame: CanFrame) {
        let message = self.take_message_tag();
        if self.tx_queue.push_back(QueuedFrame { frame, message }).is_err() {
            #[cfg(feature = "defmt")]
            defmt::debug!("send buffer full, management frame dropped");
        }
    }
}
