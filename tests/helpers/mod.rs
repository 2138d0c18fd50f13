//! Test doubles for the gateway peripherals. Every double shares its state
//! through `Rc<RefCell<_>>` so tests can inspect it after handing a clone to
//! the gateway.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

use embassy_time::{Duration, Instant};
use embedded_can::{ErrorKind, Frame, Id};
use korri_gateway::config::GatewayConfig;
use korri_gateway::core::N2kMessage;
use korri_gateway::gateway::status::{StatusDisplay, StatusReport};
use korri_gateway::gateway::{Gateway, GatewayPeripherals};
use korri_gateway::infra::actisense::reader::ActisenseReader;
use korri_gateway::infra::actisense::writer::{encode, EncodedFrame};
use korri_gateway::infra::actisense::ActisenseCommand;
use korri_gateway::infra::controller::{
    CommandRegister, ControllerRegisters, ModeRegister, StatusRegister,
};
use korri_gateway::infra::watchdog::HardwareWatchdog;
use korri_gateway::protocol::transport::can_frame::CanFrame;
use korri_gateway::protocol::transport::can_id::CanId;

pub fn at(ms: u64) -> Instant {
    Instant::from_millis(ms)
}

//==================================================================================CAN
#[derive(Debug, Clone)]
pub struct TestFrame {
    id: Id,
    data: Vec<u8>,
}

impl Frame for TestFrame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        if data.len() > 8 {
            return None;
        }
        Some(Self {
            id: id.into(),
            data: data.to_vec(),
        })
    }

    fn new_remote(_id: impl Into<Id>, _dlc: usize) -> Option<Self> {
        None
    }

    fn is_extended(&self) -> bool {
        matches!(self.id, Id::Extended(_))
    }

    fn is_remote_frame(&self) -> bool {
        false
    }

    fn id(&self) -> Id {
        self.id
    }

    fn dlc(&self) -> usize {
        self.data.len()
    }

    fn data(&self) -> &[u8] {
        &self.data
    }
}

#[derive(Debug, Default)]
pub struct CanWire {
    /// Frames waiting to be received by the gateway.
    pub rx: VecDeque<CanFrame>,
    /// Frames the gateway transmitted.
    pub tx: Vec<CanFrame>,
    /// Transmit mailbox full: every transmit would block.
    pub mailbox_full: bool,
    pub transmit_attempts: usize,
}

/// Loopback-free CAN driver: the test plays the rest of the network.
#[derive(Debug, Clone, Default)]
pub struct MockCan(pub Rc<RefCell<CanWire>>);

impl MockCan {
    pub fn inject(&self, frame: CanFrame) {
        self.0.borrow_mut().rx.push_back(frame);
    }

    pub fn sent(&self) -> Vec<CanFrame> {
        self.0.borrow().tx.clone()
    }

    pub fn sent_pgn(&self, pgn: u32) -> Vec<CanFrame> {
        self.sent().into_iter().filter(|f| f.id.pgn() == pgn).collect()
    }

    pub fn set_mailbox_full(&self, full: bool) {
        self.0.borrow_mut().mailbox_full = full;
    }
}

impl embedded_can::nb::Can for MockCan {
    type Frame = TestFrame;
    type Error = ErrorKind;

    fn transmit(&mut self, frame: &TestFrame) -> nb::Result<Option<TestFrame>, ErrorKind> {
        let mut wire = self.0.borrow_mut();
        wire.transmit_attempts += 1;
        if wire.mailbox_full {
            return Err(nb::Error::WouldBlock);
        }
        let frame = CanFrame::from_driver(frame).ok_or(nb::Error::Other(ErrorKind::Other))?;
        wire.tx.push(frame);
        Ok(None)
    }

    fn receive(&mut self) -> nb::Result<TestFrame, ErrorKind> {
        let frame = self.0.borrow_mut().rx.pop_front().ok_or(nb::Error::WouldBlock)?;
        frame.to_driver().ok_or(nb::Error::Other(ErrorKind::Other))
    }
}

/// Single-frame PGN 127250 (vessel heading) from `source`.
pub fn heading_frame(source: u8) -> CanFrame {
    let id = CanId::builder(127250, source).with_priority(2).build().unwrap();
    CanFrame::new(id, &[0xFF, 0x10, 0x27, 0xFF, 0x7F, 0xFF, 0x7F, 0xFD])
}

pub fn iso_request(requester: u8, destination: u8, pgn: u32) -> CanFrame {
    let id = CanId::builder(59904, requester)
        .to_destination(destination)
        .build()
        .unwrap();
    CanFrame::new(id, &pgn.to_le_bytes()[..3])
}

//==================================================================================SERIAL
#[derive(Debug, Default)]
pub struct SerialWire {
    pub rx: VecDeque<u8>,
    pub tx: Vec<u8>,
    /// Bytes the output buffer still takes; `None` for an unbounded port.
    pub tx_room: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct MockSerial(pub Rc<RefCell<SerialWire>>);

impl MockSerial {
    pub fn inject(&self, bytes: &[u8]) {
        self.0.borrow_mut().rx.extend(bytes.iter().copied());
    }

    /// Host tool sending `message` as an Actisense 0x94 frame.
    pub fn inject_send(&self, message: &N2kMessage) {
        let mut frame = EncodedFrame::new();
        encode(ActisenseCommand::N2kSend, message, &mut frame).unwrap();
        self.inject(&frame);
    }

    /// Decode every frame the gateway wrote to the serial link.
    pub fn written_messages(&self) -> Vec<N2kMessage> {
        let bytes = self.0.borrow().tx.clone();
        let mut reader = ActisenseReader::new(0);
        bytes
            .iter()
            .filter_map(|byte| reader.push_byte(*byte, 0).ok().flatten())
            .collect()
    }

    pub fn written_len(&self) -> usize {
        self.0.borrow().tx.len()
    }

    /// Host stopped reading: only `room` more bytes fit (`None` unblocks).
    pub fn set_tx_room(&self, room: Option<usize>) {
        self.0.borrow_mut().tx_room = room;
    }
}

impl embedded_io::ErrorType for MockSerial {
    type Error = Infallible;
}

impl embedded_io::Read for MockSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Infallible> {
        let mut wire = self.0.borrow_mut();
        let mut n = 0;
        while n < buf.len() {
            match wire.rx.pop_front() {
                Some(byte) => {
                    buf[n] = byte;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }
}

impl embedded_io::ReadReady for MockSerial {
    fn read_ready(&mut self) -> Result<bool, Infallible> {
        Ok(!self.0.borrow().rx.is_empty())
    }
}

impl embedded_io::WriteReady for MockSerial {
    fn write_ready(&mut self) -> Result<bool, Infallible> {
        Ok(self.0.borrow().tx_room != Some(0))
    }
}

impl embedded_io::Write for MockSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Infallible> {
        let mut wire = self.0.borrow_mut();
        let n = wire.tx_room.map_or(buf.len(), |room| room.min(buf.len()));
        assert!(n > 0 || buf.is_empty(), "write on a full port would block");
        wire.tx.extend_from_slice(&buf[..n]);
        if let Some(room) = wire.tx_room.as_mut() {
            *room -= n;
        }
        Ok(n)
    }

    fn flush(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

//==================================================================================CONTROLLER
#[derive(Debug, Default)]
pub struct RegisterFile {
    pub status: u8,
    pub mode: u8,
    pub tx_error_counter: u8,
    pub rx_error_counter: u8,
    pub aborts: usize,
}

/// Simulated SJA1000 register set.
#[derive(Debug, Clone, Default)]
pub struct SimRegisters(pub Rc<RefCell<RegisterFile>>);

impl SimRegisters {
    pub fn set_bus_off(&self, bus_off: bool) {
        let mut regs = self.0.borrow_mut();
        if bus_off {
            regs.status |= StatusRegister::BUS_OFF;
            regs.mode |= ModeRegister::RESET_MODE;
        } else {
            regs.status &= !StatusRegister::BUS_OFF;
        }
    }

    pub fn aborts(&self) -> usize {
        self.0.borrow().aborts
    }
}

impl ControllerRegisters for SimRegisters {
    fn read_status(&mut self) -> StatusRegister {
        StatusRegister(self.0.borrow().status)
    }

    fn write_command(&mut self, command: CommandRegister) {
        if command.0 & CommandRegister::ABORT_TRANSMISSION != 0 {
            self.0.borrow_mut().aborts += 1;
        }
    }

    fn read_mode(&mut self) -> ModeRegister {
        ModeRegister(self.0.borrow().mode)
    }

    fn write_mode(&mut self, mode: ModeRegister) {
        self.0.borrow_mut().mode = mode.0;
    }

    fn write_tx_error_counter(&mut self, count: u8) {
        self.0.borrow_mut().tx_error_counter = count;
    }

    fn write_rx_error_counter(&mut self, count: u8) {
        self.0.borrow_mut().rx_error_counter = count;
    }
}

//==================================================================================WATCHDOG / LED / DISPLAY
#[derive(Debug, Clone, Default)]
pub struct MockWatchdog(pub Rc<RefCell<Vec<Duration>>>);

impl MockWatchdog {
    pub fn armed(&self) -> Vec<Duration> {
        self.0.borrow().clone()
    }
}

impl HardwareWatchdog for MockWatchdog {
    fn arm(&mut self, timeout: Duration) {
        self.0.borrow_mut().push(timeout);
    }
}

#[derive(Debug, Default)]
pub struct LedState {
    pub on: bool,
    pub toggles: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MockLed(pub Rc<RefCell<LedState>>);

impl MockLed {
    pub fn toggles(&self) -> usize {
        self.0.borrow().toggles
    }
}

impl embedded_hal::digital::ErrorType for MockLed {
    type Error = Infallible;
}

impl embedded_hal::digital::OutputPin for MockLed {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.borrow_mut().on = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.borrow_mut().on = true;
        Ok(())
    }
}

impl embedded_hal::digital::StatefulOutputPin for MockLed {
    fn is_set_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.0.borrow().on)
    }

    fn is_set_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.0.borrow().on)
    }

    fn toggle(&mut self) -> Result<(), Infallible> {
        let mut led = self.0.borrow_mut();
        led.on = !led.on;
        led.toggles += 1;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct Panel {
    pub fail_init: bool,
    pub initialised: bool,
    pub frames: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MockDisplay(pub Rc<RefCell<Panel>>);

impl MockDisplay {
    pub fn broken() -> Self {
        let display = Self::default();
        display.0.borrow_mut().fail_init = true;
        display
    }

    pub fn frames(&self) -> Vec<String> {
        self.0.borrow().frames.clone()
    }
}

impl StatusDisplay for MockDisplay {
    type Error = &'static str;

    fn init(&mut self) -> Result<(), Self::Error> {
        let mut panel = self.0.borrow_mut();
        if panel.fail_init {
            return Err("no display on I2C bus");
        }
        panel.initialised = true;
        Ok(())
    }

    fn show(&mut self, report: &StatusReport) -> Result<(), Self::Error> {
        self.0.borrow_mut().frames.push(report.to_string());
        Ok(())
    }
}

//==================================================================================RIG
pub type TestGateway<const TX: usize = 250> =
    Gateway<MockCan, MockSerial, SimRegisters, MockWatchdog, MockLed, MockDisplay, TX>;

/// Gateway wired to test doubles, with handles kept for inspection.
pub struct Rig<const TX: usize = 250> {
    pub gateway: TestGateway<TX>,
    pub can: MockCan,
    pub serial: MockSerial,
    pub registers: SimRegisters,
    pub watchdog: MockWatchdog,
    pub led: MockLed,
    pub display: MockDisplay,
    /// Last instant handed to `tick`.
    pub now_ms: u64,
}

impl<const TX: usize> Rig<TX> {
    pub fn new(config: GatewayConfig) -> Self {
        Self::with_display(config, MockDisplay::default())
    }

    pub fn with_display(config: GatewayConfig, display: MockDisplay) -> Self {
        let can = MockCan::default();
        let serial = MockSerial::default();
        let registers = SimRegisters::default();
        let watchdog = MockWatchdog::default();
        let led = MockLed::default();
        let gateway = Gateway::new(
            GatewayPeripherals {
                can: can.clone(),
                serial: serial.clone(),
                registers: registers.clone(),
                watchdog: watchdog.clone(),
                led: led.clone(),
                display: display.clone(),
            },
            config,
            at(0),
        );
        Self {
            gateway,
            can,
            serial,
            registers,
            watchdog,
            led,
            display,
            now_ms: 0,
        }
    }

    /// Tick every millisecond up to and including `end_ms`.
    pub fn run_until(&mut self, end_ms: u64) {
        while self.now_ms < end_ms {
            self.now_ms += 1;
            self.gateway.tick(at(self.now_ms));
        }
    }
}
