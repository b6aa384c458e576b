//! The seam between a [`DeviceSession`](crate::DeviceSession) and the USB
//! stack.
//!
//! [`Backend`] lists devices and opens them; the [`Transport`] it returns
//! carries the control and bulk transfers of one claimed interface. The
//! production implementation lives in [`usb`](crate::usb) and is backed by
//! `nusb`. Anything else implementing these traits (an in-memory fake, a
//! different USB library) can drive a session unchanged.

use std::time::Duration;

use nusb::transfer::TransferError;

use crate::device_info::DeviceDescriptor;
use crate::types::Interface;

/// Errors reported by a [`Backend`] or [`Transport`].
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The transfer did not complete before its deadline.
    #[error("USB transfer timed out")]
    Timeout,

    /// The device went away.
    #[error("USB device disconnected")]
    Disconnected,

    /// The endpoint returned a STALL handshake.
    #[error("USB endpoint stalled")]
    Stall,

    /// The requested device is not (or no longer) attached.
    #[error("USB device not present")]
    NotFound,

    /// An error from the nusb USB layer.
    #[error("USB error: {0}")]
    Usb(#[from] nusb::Error),

    /// A USB transfer error not covered by the variants above.
    #[error("USB transfer error: {0}")]
    Transfer(TransferError),

    /// Any other backend failure.
    #[error("{0}")]
    Other(String),
}

impl From<TransferError> for TransportError {
    fn from(err: TransferError) -> Self {
        match err {
            // Blocking transfers are cancelled when their timeout expires.
            TransferError::Cancelled => Self::Timeout,
            TransferError::Disconnected => Self::Disconnected,
            TransferError::Stall => Self::Stall,
            other => Self::Transfer(other),
        }
    }
}

/// Device listing and opening.
pub trait Backend {
    /// Handle type produced by [`open`](Self::open).
    type Transport: Transport;

    /// List every attached USB device.
    ///
    /// Filtering down to FTDI-class devices happens in the
    /// [`Enumerator`](crate::device_info::Enumerator).
    fn list_devices(&self) -> Result<Vec<DeviceDescriptor>, TransportError>;

    /// Open the device at `descriptor`'s location and claim `interface`.
    ///
    /// Returns [`TransportError::NotFound`] if the device is no longer
    /// attached.
    fn open(
        &self,
        descriptor: &DeviceDescriptor,
        interface: Interface,
    ) -> Result<Self::Transport, TransportError>;
}

/// Transfers on one claimed interface of an open device.
///
/// Dropping the transport releases the interface and closes the device.
pub trait Transport {
    /// Maximum packet size of the bulk IN endpoint, in bytes.
    fn max_packet_size(&self) -> usize;

    /// Send a vendor OUT control request with no data stage.
    fn control_out(
        &mut self,
        request: u8,
        value: u16,
        index: u16,
        timeout: Duration,
    ) -> Result<(), TransportError>;

    /// Send a vendor IN control request and return the data stage.
    fn control_in(
        &mut self,
        request: u8,
        value: u16,
        index: u16,
        length: u16,
        timeout: Duration,
    ) -> Result<Vec<u8>, TransportError>;

    /// Issue one bulk OUT transfer of `data`.
    ///
    /// Returns the number of bytes the device accepted. A transfer that
    /// times out reports the bytes accepted before the deadline (possibly
    /// zero) instead of an error.
    fn bulk_write(&mut self, data: &[u8], timeout: Duration) -> Result<usize, TransportError>;

    /// Issue one bulk IN transfer of at most `len` bytes.
    ///
    /// The returned bytes are raw packets, modem status headers included.
    /// A transfer that times out with nothing received fails with
    /// [`TransportError::Timeout`]; one that times out after receiving
    /// some bytes returns them.
    fn bulk_read(&mut self, len: usize, timeout: Duration) -> Result<Vec<u8>, TransportError>;
}
