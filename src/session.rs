//! The device session: one open FTDI interface and its transfer mode.
//!
//! [`DeviceSession`] binds to a device with [`open`](DeviceSession::open),
//! switches it into synchronous FIFO mode with
//! [`set_sync_mode`](DeviceSession::set_sync_mode), and then moves bytes
//! with [`send`](DeviceSession::send) and [`read`](DeviceSession::read).
//! The handle is released by [`close`](DeviceSession::close) or on drop.

use std::time::Duration;

use crate::config::SessionConfig;
use crate::constants::*;
use crate::device_info::{matching_devices, DeviceDescriptor, Enumerator};
use crate::error::{Error, ErrorKind, Result};
use crate::transfer;
use crate::transport::{Backend, Transport, TransportError};
use crate::types::*;
use crate::usb::NusbBackend;

/// A claimed interface together with what was opened.
struct Handle<T> {
    transport: T,
    descriptor: DeviceDescriptor,
    interface: Interface,
    usb_index: u16,
}

impl<T: Transport> Handle<T> {
    fn control_out(
        &mut self,
        request: u8,
        value: u16,
        timeout: Duration,
    ) -> std::result::Result<(), TransportError> {
        self.transport
            .control_out(request, value, self.usb_index, timeout)
    }

    fn usb_reset(&mut self, timeout: Duration) -> std::result::Result<(), TransportError> {
        self.control_out(SIO_RESET_REQUEST, SIO_RESET_SIO, timeout)
    }

    fn purge(&mut self, timeout: Duration) -> std::result::Result<(), TransportError> {
        self.control_out(SIO_RESET_REQUEST, SIO_TCIFLUSH, timeout)?;
        self.control_out(SIO_RESET_REQUEST, SIO_TCOFLUSH, timeout)
    }

    fn write_bitmode(
        &mut self,
        bitmask: u8,
        mode: BitMode,
        timeout: Duration,
    ) -> std::result::Result<(), TransportError> {
        let val = (bitmask as u16) | ((mode.wire_value() as u16) << 8);
        self.control_out(SIO_SET_BITMODE_REQUEST, val, timeout)
    }

    fn write_flow_control(
        &mut self,
        flow: FlowControl,
        timeout: Duration,
    ) -> std::result::Result<(), TransportError> {
        let flow_val = match flow {
            FlowControl::Disabled => SIO_DISABLE_FLOW_CTRL,
            FlowControl::RtsCts => SIO_RTS_CTS_HS,
            FlowControl::DtrDsr => SIO_DTR_DSR_HS,
        };
        self.transport.control_out(
            SIO_SET_FLOW_CTRL_REQUEST,
            0,
            flow_val | self.usb_index,
            timeout,
        )
    }

    fn write_latency_timer(
        &mut self,
        latency_ms: u8,
        timeout: Duration,
    ) -> std::result::Result<(), TransportError> {
        self.control_out(SIO_SET_LATENCY_TIMER_REQUEST, latency_ms as u16, timeout)
    }

    /// Reset the chip, drop queued data, and leave bitbang off.
    fn initialise(&mut self, config: &SessionConfig) -> std::result::Result<(), TransportError> {
        let timeout = config.control_timeout;
        self.usb_reset(timeout)?;
        self.purge(timeout)?;
        self.write_bitmode(ALL_PINS_OUTPUT, BitMode::Reset, timeout)?;
        self.write_flow_control(config.flow_control, timeout)?;
        self.write_latency_timer(config.latency_timer, timeout)
    }

    /// The mode-switch sequence: initialise, then enter `mode`.
    fn switch_bitmode(
        &mut self,
        mode: BitMode,
        config: &SessionConfig,
    ) -> std::result::Result<(), TransportError> {
        let timeout = config.control_timeout;
        self.usb_reset(timeout)?;
        self.purge(timeout)?;
        self.write_bitmode(ALL_PINS_OUTPUT, BitMode::Reset, timeout)?;
        self.write_bitmode(ALL_PINS_OUTPUT, mode, timeout)?;
        self.write_flow_control(config.flow_control, timeout)?;
        self.write_latency_timer(config.latency_timer, timeout)
    }
}

/// A session with at most one open FTDI device interface.
///
/// The session starts [`Closed`](TransferMode::Closed). Opening moves it to
/// [`Async`](TransferMode::Async), the chip's power-on mode; transfers need
/// [`SyncFifo`](TransferMode::SyncFifo).
///
/// Every operation takes `&mut self`, so one session is driven by one
/// thread at a time. Independent sessions share nothing.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use ftdi_fifo::DeviceSession;
///
/// let devices = ftdi_fifo::list_devices();
/// let mut session = DeviceSession::new();
/// session.open(&devices[0], 0, 0)?;
/// session.set_sync_mode(true)?;
/// session.send(&[0x55, 0x01, 0x00, 0x00, 0xAA])?;
/// let reply = session.read(2, Duration::from_secs(1))?;
/// println!("{reply:02x?}");
/// session.close();
/// # Ok::<(), ftdi_fifo::Error>(())
/// ```
pub struct DeviceSession<B: Backend = NusbBackend> {
    backend: B,
    config: SessionConfig,
    handle: Option<Handle<B::Transport>>,
    mode: TransferMode,
    last_error: Option<ErrorKind>,
    modem_status: Option<ModemStatus>,
}

impl<B: Backend> std::fmt::Debug for DeviceSession<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSession")
            .field("mode", &self.mode)
            .field("device", &self.descriptor().map(|d| d.location().to_string()))
            .field("interface", &self.interface())
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}

// ---- Construction ----

impl DeviceSession<NusbBackend> {
    /// A closed session on the nusb backend with default configuration.
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    /// A closed session on the nusb backend.
    pub fn with_config(config: SessionConfig) -> Self {
        Self::with_backend(NusbBackend, config)
    }
}

impl Default for DeviceSession<NusbBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> DeviceSession<B> {
    /// A closed session on a custom backend.
    pub fn with_backend(backend: B, config: SessionConfig) -> Self {
        Self {
            backend,
            config,
            handle: None,
            mode: TransferMode::Closed,
            last_error: None,
            modem_status: None,
        }
    }

    /// List FTDI-class devices visible to this session's backend.
    pub fn list_devices(&self) -> Vec<DeviceDescriptor> {
        Enumerator::new().list(&self.backend)
    }

    /// The backend this session opens devices through.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The current transfer mode.
    pub fn mode(&self) -> TransferMode {
        self.mode
    }

    /// Whether a device is open.
    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// Descriptor of the open device.
    pub fn descriptor(&self) -> Option<&DeviceDescriptor> {
        self.handle.as_ref().map(|h| &h.descriptor)
    }

    /// Interface claimed on the open device.
    pub fn interface(&self) -> Option<Interface> {
        self.handle.as_ref().map(|h| h.interface)
    }

    /// Chip family of the open device, if recognised.
    pub fn chip_type(&self) -> Option<ChipType> {
        self.descriptor().and_then(DeviceDescriptor::chip_type)
    }

    /// Bulk-in packet size used by [`read`](Self::read).
    ///
    /// The configured override if set, otherwise the endpoint's size.
    /// `None` while closed and no override is configured.
    pub fn max_packet_size(&self) -> Option<usize> {
        self.config.max_packet_size.or_else(|| {
            self.handle
                .as_ref()
                .map(|h| h.transport.max_packet_size())
        })
    }

    /// Kind of the error returned by the most recent operation, or `None`
    /// if it succeeded.
    pub fn last_error(&self) -> Option<ErrorKind> {
        self.last_error
    }

    /// Modem status header of the most recent bulk-in packet.
    pub fn modem_status(&self) -> Option<ModemStatus> {
        self.modem_status
    }

    fn record<T>(&mut self, result: Result<T>) -> Result<T> {
        self.last_error = result.as_ref().err().map(Error::kind);
        result
    }
}

// ---- Open / Close ----

impl<B: Backend> DeviceSession<B> {
    /// Open a device and claim one of its interfaces.
    ///
    /// `index` selects among the attached devices that share
    /// `descriptor`'s vendor and product IDs, in enumeration order.
    /// `interface` is the 0-based channel (0 = A).
    ///
    /// The chip is reset, its FIFOs purged, bitbang disabled, and the
    /// configured flow control and latency timer applied. On success the
    /// mode is [`Async`](TransferMode::Async).
    pub fn open(&mut self, descriptor: &DeviceDescriptor, index: usize, interface: u8) -> Result<()> {
        let result = self.open_inner(descriptor, index, interface);
        self.record(result)
    }

    fn open_inner(&mut self, descriptor: &DeviceDescriptor, index: usize, interface: u8) -> Result<()> {
        if self.handle.is_some() {
            return Err(Error::AlreadyOpen);
        }
        let iface = Interface::try_from(interface)?;

        let target = matching_devices(&self.backend, descriptor)
            .map_err(Error::OpenFailed)?
            .into_iter()
            .nth(index)
            .ok_or(Error::DeviceNotFound)?;

        log::info!(
            "Opening {:04X}:{:04X} #{} at {} interface {:?}",
            target.vendor_id(),
            target.product_id(),
            index,
            target.location(),
            iface
        );

        let transport = self
            .backend
            .open(&target, iface)
            .map_err(Error::OpenFailed)?;
        let mut handle = Handle {
            transport,
            descriptor: target,
            interface: iface,
            usb_index: iface.config().usb_index,
        };

        // Dropping the handle on failure releases the interface.
        handle.initialise(&self.config).map_err(Error::OpenFailed)?;

        self.handle = Some(handle);
        self.mode = TransferMode::Async;
        self.modem_status = None;
        Ok(())
    }

    /// Release the device. Safe to call at any time, any number of times.
    ///
    /// A session left in synchronous FIFO mode is first switched back to
    /// the chip's default mode; failures there are logged and ignored.
    pub fn close(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            if self.mode == TransferMode::SyncFifo {
                if let Err(e) =
                    handle.write_bitmode(ALL_PINS_OUTPUT, BitMode::Reset, self.config.control_timeout)
                {
                    log::debug!("Ignoring bitmode reset failure on close: {}", e);
                }
            }
            log::info!(
                "Closing {:04X}:{:04X} at {}",
                handle.descriptor.vendor_id(),
                handle.descriptor.product_id(),
                handle.descriptor.location()
            );
        }
        self.mode = TransferMode::Closed;
        self.modem_status = None;
        self.last_error = None;
    }
}

impl<B: Backend> Drop for DeviceSession<B> {
    fn drop(&mut self) {
        self.close();
    }
}

// ---- Mode Controller ----

impl<B: Backend> DeviceSession<B> {
    /// Enter (`true`) or leave (`false`) synchronous FIFO mode.
    ///
    /// The chip is reset and its RX/TX FIFOs purged as part of the switch,
    /// so data queued before the call is lost. Leaving selects
    /// asynchronous bitbang mode. On failure the mode is unchanged.
    pub fn set_sync_mode(&mut self, enable: bool) -> Result<()> {
        let result = self.switch_mode(enable);
        self.record(result)
    }

    fn switch_mode(&mut self, enable: bool) -> Result<()> {
        let Some(handle) = self.handle.as_mut() else {
            return Err(Error::ModeSwitchFailed("session is closed".into()));
        };

        if enable {
            if let Some(chip) = handle.descriptor.chip_type() {
                if !chip.supports_sync_fifo() {
                    return Err(Error::ModeSwitchFailed(format!(
                        "{chip:?} does not support synchronous FIFO"
                    )));
                }
            }
        }

        let (bitmode, mode) = if enable {
            (BitMode::SyncFf, TransferMode::SyncFifo)
        } else {
            (BitMode::BitBang, TransferMode::Async)
        };
        log::debug!("Switching interface {:?} to {:?}", handle.interface, mode);

        handle
            .switch_bitmode(bitmode, &self.config)
            .map_err(|e| Error::ModeSwitchFailed(e.to_string()))?;

        self.mode = mode;
        self.modem_status = None;
        Ok(())
    }

    /// Write a single bitmode request.
    ///
    /// `bitmask` configures which pins are outputs (bit = 1). No reset or
    /// purge is performed. The session mode becomes
    /// [`SyncFifo`](TransferMode::SyncFifo) for [`BitMode::SyncFf`] and
    /// [`Async`](TransferMode::Async) for anything else.
    pub fn set_bitmode(&mut self, bitmask: u8, mode: BitMode) -> Result<()> {
        let result = match self.handle.as_mut() {
            None => Err(Error::ModeSwitchFailed("session is closed".into())),
            Some(handle) => handle
                .write_bitmode(bitmask, mode, self.config.control_timeout)
                .map_err(|e| Error::ModeSwitchFailed(e.to_string())),
        };
        if result.is_ok() {
            self.mode = if mode == BitMode::SyncFf {
                TransferMode::SyncFifo
            } else {
                TransferMode::Async
            };
        }
        self.record(result)
    }
}

// ---- Data Transfer ----

impl<B: Backend> DeviceSession<B> {
    /// Write `data` to the device.
    ///
    /// Data is sent in chunks of at most the configured write chunk size.
    /// Returns `data.len()` once every chunk is accepted. A chunk the device
    /// only partly accepts ends the call with [`Error::ShortWrite`].
    pub fn send(&mut self, data: &[u8]) -> Result<usize> {
        let result = self.send_inner(data);
        self.record(result)
    }

    fn send_inner(&mut self, data: &[u8]) -> Result<usize> {
        let handle = match self.handle.as_mut() {
            Some(handle) if self.mode == TransferMode::SyncFifo => handle,
            _ => return Err(Error::NotInSyncMode),
        };
        if data.is_empty() {
            return Ok(0);
        }

        transfer::send_chunked(
            &mut handle.transport,
            data,
            self.config.write_chunksize,
            self.config.write_timeout,
        )
    }

    /// Read up to `num_packets` packets and return their payload.
    ///
    /// The 2-byte modem status header of every packet is removed. `timeout`
    /// bounds each underlying transfer; if no payload arrives within it the
    /// call fails with [`Error::Timeout`]. Fewer bytes than
    /// `num_packets * (max_packet_size - 2)` is a normal result. Large
    /// packet counts are split into bulk transfers of at most the
    /// configured read chunk size.
    pub fn read(&mut self, num_packets: usize, timeout: Duration) -> Result<Vec<u8>> {
        let result = self.read_inner(num_packets, timeout);
        self.record(result)
    }

    fn read_inner(&mut self, num_packets: usize, timeout: Duration) -> Result<Vec<u8>> {
        let handle = match self.handle.as_mut() {
            Some(handle) if self.mode == TransferMode::SyncFifo => handle,
            _ => return Err(Error::NotInSyncMode),
        };
        if num_packets == 0 {
            return Err(Error::InvalidArgument("packet count must be at least 1"));
        }

        let packet_size = self
            .config
            .max_packet_size
            .unwrap_or_else(|| handle.transport.max_packet_size());
        if packet_size <= MODEM_STATUS_LEN {
            return Err(Error::InvalidArgument(
                "max packet size must exceed the modem status header",
            ));
        }

        let outcome = transfer::read_packets(
            &mut handle.transport,
            num_packets,
            packet_size,
            self.config.read_chunksize,
            timeout,
        )?;
        if outcome.status.is_some() {
            self.modem_status = outcome.status;
        }
        Ok(outcome.payload)
    }
}

// ---- Configuration ----

impl<B: Backend> DeviceSession<B> {
    /// Set the timeout for each bulk-out chunk.
    pub fn set_write_timeout(&mut self, timeout: Duration) {
        self.config.write_timeout = timeout;
    }

    /// Set the write chunk size. Zero is raised to one.
    pub fn set_write_chunksize(&mut self, chunksize: usize) {
        self.config.write_chunksize = chunksize.max(1);
    }

    /// Set the read chunk size. Zero is raised to one.
    pub fn set_read_chunksize(&mut self, chunksize: usize) {
        self.config.read_chunksize = chunksize.max(1);
    }

    /// Override the bulk-in packet size, or `None` to use the endpoint's.
    pub fn set_max_packet_size(&mut self, size: Option<usize>) {
        self.config.max_packet_size = size;
    }

    /// Set the latency timer value (1-255 ms).
    ///
    /// The value is also re-applied after every mode switch.
    pub fn set_latency_timer(&mut self, latency_ms: u8) -> Result<()> {
        let result = if latency_ms < 1 {
            Err(Error::InvalidArgument("latency must be between 1 and 255"))
        } else {
            match self.handle.as_mut() {
                None => Err(Error::DeviceUnavailable),
                Some(handle) => handle
                    .write_latency_timer(latency_ms, self.config.control_timeout)
                    .map_err(Error::from),
            }
        };
        if result.is_ok() {
            self.config.latency_timer = latency_ms;
        }
        self.record(result)
    }

    /// Get the current latency timer value in milliseconds.
    pub fn latency_timer(&mut self) -> Result<u8> {
        let result = match self.handle.as_mut() {
            None => Err(Error::DeviceUnavailable),
            Some(handle) => handle
                .transport
                .control_in(
                    SIO_GET_LATENCY_TIMER_REQUEST,
                    0,
                    handle.usb_index,
                    1,
                    self.config.control_timeout,
                )
                .map_err(Error::from)
                .and_then(|data| {
                    data.first()
                        .copied()
                        .ok_or_else(|| short_reply("latency timer"))
                }),
        };
        self.record(result)
    }

    /// Set the flow control mode.
    ///
    /// The value is also re-applied after every mode switch.
    pub fn set_flow_control(&mut self, flow: FlowControl) -> Result<()> {
        let result = match self.handle.as_mut() {
            None => Err(Error::DeviceUnavailable),
            Some(handle) => handle
                .write_flow_control(flow, self.config.control_timeout)
                .map_err(Error::from),
        };
        if result.is_ok() {
            self.config.flow_control = flow;
        }
        self.record(result)
    }
}

// ---- Status / Maintenance ----

impl<B: Backend> DeviceSession<B> {
    /// Whether the device is open and still answering control requests.
    pub fn is_connected(&mut self) -> bool {
        let timeout = self.config.control_timeout;
        match self.handle.as_mut() {
            None => false,
            Some(handle) => handle
                .transport
                .control_in(SIO_GET_LATENCY_TIMER_REQUEST, 0, handle.usb_index, 1, timeout)
                .is_ok(),
        }
    }

    /// Purge the chip's RX and TX FIFOs.
    pub fn clear_buffers(&mut self) -> Result<()> {
        let result = match self.handle.as_mut() {
            None => Err(Error::DeviceUnavailable),
            Some(handle) => handle
                .purge(self.config.control_timeout)
                .map_err(Error::from),
        };
        self.record(result)
    }

    /// Poll the modem status with a control request.
    ///
    /// Unlike [`modem_status`](Self::modem_status) this does not depend on a
    /// previous read.
    pub fn poll_modem_status(&mut self) -> Result<ModemStatus> {
        let result = match self.handle.as_mut() {
            None => Err(Error::DeviceUnavailable),
            Some(handle) => handle
                .transport
                .control_in(
                    SIO_POLL_MODEM_STATUS_REQUEST,
                    0,
                    handle.usb_index,
                    2,
                    self.config.control_timeout,
                )
                .map_err(Error::from)
                .and_then(|data| match data[..] {
                    [lo, hi, ..] => Ok(ModemStatus::from_header([lo, hi])),
                    _ => Err(short_reply("modem status")),
                }),
        };
        self.record(result)
    }
}

fn short_reply(what: &str) -> Error {
    TransportError::Other(format!("short {what} reply")).into()
}
