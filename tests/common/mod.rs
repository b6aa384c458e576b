//! In-memory USB backend for driving sessions without hardware.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use ftdi_fifo::constants::{pid, FTDI_VID};
use ftdi_fifo::{
    Backend, DeviceDescriptor, DeviceSession, Interface, Location, SessionConfig, Transport,
    TransportError,
};

/// Everything the fake device saw, plus knobs to make it misbehave.
#[derive(Debug, Default)]
pub struct MockState {
    /// `(request, value, index)` of every control OUT request.
    pub controls: Vec<(u8, u16, u16)>,
    /// Request codes of every control IN request.
    pub control_ins: Vec<u8>,
    /// Bytes accepted by each bulk write.
    pub writes: Vec<Vec<u8>>,
    /// Requested length of each bulk read.
    pub read_requests: Vec<usize>,
    /// Raw bulk-in replies; an empty queue times out.
    pub reads: VecDeque<Result<Vec<u8>, TransportError>>,
    /// Accept at most this many bytes per bulk write.
    pub accept_limit: Option<usize>,
    /// Stall every control OUT request with this code.
    pub reject_request: Option<u8>,
    /// Answer control IN requests with no data.
    pub empty_control_in: bool,
    /// Fail every transfer as if unplugged.
    pub disconnected: bool,
    /// Number of transports currently alive.
    pub open_handles: usize,
    /// Fail every open call.
    pub busy: bool,
    /// Fail every listing call.
    pub list_fails: bool,
}

impl MockState {
    /// Total number of transfers of any kind.
    pub fn io_count(&self) -> usize {
        self.controls.len() + self.control_ins.len() + self.writes.len() + self.read_requests.len()
    }
}

pub type Shared = Rc<RefCell<MockState>>;

pub struct MockBackend {
    pub devices: Vec<DeviceDescriptor>,
    pub state: Shared,
    pub max_packet_size: usize,
}

impl Backend for MockBackend {
    type Transport = MockTransport;

    fn list_devices(&self) -> Result<Vec<DeviceDescriptor>, TransportError> {
        if self.state.borrow().list_fails {
            return Err(TransportError::Other("bus query failed".into()));
        }
        Ok(self.devices.clone())
    }

    fn open(
        &self,
        descriptor: &DeviceDescriptor,
        _interface: Interface,
    ) -> Result<MockTransport, TransportError> {
        let mut state = self.state.borrow_mut();
        if state.busy {
            return Err(TransportError::Other("device busy".into()));
        }
        if !self.devices.contains(descriptor) {
            return Err(TransportError::NotFound);
        }
        state.open_handles += 1;
        Ok(MockTransport {
            state: Rc::clone(&self.state),
            max_packet_size: self.max_packet_size,
        })
    }
}

pub struct MockTransport {
    state: Shared,
    max_packet_size: usize,
}

impl Drop for MockTransport {
    fn drop(&mut self) {
        self.state.borrow_mut().open_handles -= 1;
    }
}

impl Transport for MockTransport {
    fn max_packet_size(&self) -> usize {
        self.max_packet_size
    }

    fn control_out(
        &mut self,
        request: u8,
        value: u16,
        index: u16,
        _timeout: Duration,
    ) -> Result<(), TransportError> {
        let mut state = self.state.borrow_mut();
        state.controls.push((request, value, index));
        if state.disconnected {
            return Err(TransportError::Disconnected);
        }
        if state.reject_request == Some(request) {
            return Err(TransportError::Stall);
        }
        Ok(())
    }

    fn control_in(
        &mut self,
        request: u8,
        _value: u16,
        _index: u16,
        length: u16,
        _timeout: Duration,
    ) -> Result<Vec<u8>, TransportError> {
        let mut state = self.state.borrow_mut();
        state.control_ins.push(request);
        if state.disconnected {
            return Err(TransportError::Disconnected);
        }
        if state.empty_control_in {
            return Ok(Vec::new());
        }
        let reply = match request {
            0x05 => vec![0x31, 0x60],
            0x0A => vec![2],
            _ => vec![0; length as usize],
        };
        Ok(reply)
    }

    fn bulk_write(&mut self, data: &[u8], _timeout: Duration) -> Result<usize, TransportError> {
        let mut state = self.state.borrow_mut();
        if state.disconnected {
            return Err(TransportError::Disconnected);
        }
        let n = state.accept_limit.map_or(data.len(), |l| l.min(data.len()));
        state.writes.push(data[..n].to_vec());
        Ok(n)
    }

    fn bulk_read(&mut self, len: usize, _timeout: Duration) -> Result<Vec<u8>, TransportError> {
        let mut state = self.state.borrow_mut();
        state.read_requests.push(len);
        if state.disconnected {
            return Err(TransportError::Disconnected);
        }
        state.reads.pop_front().unwrap_or(Err(TransportError::Timeout))
    }
}

/// An FT2232H at `bus`-`port`.
pub fn ft2232h(bus: &str, port: u8) -> DeviceDescriptor {
    DeviceDescriptor::new(FTDI_VID, pid::FT2232, Location::new(bus, vec![port], port + 1))
        .with_serial(format!("FT{port:04}"))
        .with_description("Dual RS232-HS")
        .with_release(0x0700)
}

/// An FT232R, which has no synchronous FIFO mode.
pub fn ft232r(bus: &str, port: u8) -> DeviceDescriptor {
    DeviceDescriptor::new(FTDI_VID, pid::FT232, Location::new(bus, vec![port], port + 1))
        .with_serial("A50285BI")
        .with_description("FT232R USB UART")
        .with_release(0x0600)
}

/// A closed session over `devices`, with 64-byte packets.
pub fn session_with(devices: Vec<DeviceDescriptor>) -> (DeviceSession<MockBackend>, Shared) {
    session_with_config(devices, SessionConfig::default())
}

pub fn session_with_config(
    devices: Vec<DeviceDescriptor>,
    config: SessionConfig,
) -> (DeviceSession<MockBackend>, Shared) {
    let state = Shared::default();
    let backend = MockBackend {
        devices,
        state: Rc::clone(&state),
        max_packet_size: 64,
    };
    (DeviceSession::with_backend(backend, config), state)
}

/// A session already open on the first device and in synchronous FIFO mode.
pub fn sync_session() -> (DeviceSession<MockBackend>, Shared) {
    let (mut session, state) = session_with(vec![ft2232h("1", 1)]);
    let devices = session.list_devices();
    session.open(&devices[0], 0, 0).unwrap();
    session.set_sync_mode(true).unwrap();
    state.borrow_mut().controls.clear();
    (session, state)
}

/// One raw bulk-in packet: modem status header followed by `payload`.
pub fn packet(payload: &[u8]) -> Vec<u8> {
    let mut raw = vec![0x31, 0x60];
    raw.extend_from_slice(payload);
    raw
}
