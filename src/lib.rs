//! Synchronous FIFO session driver for FTDI USB bridge chips.
//!
//! This crate opens an FTDI chip (FT2232H, FT232H), switches it into
//! synchronous FIFO mode, and moves raw bytes to and from an attached
//! board such as a detector readout. It does not interpret those bytes.
//! USB access goes through [nusb](https://crates.io/crates/nusb): no C
//! dependencies or `libusb` required.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use ftdi_fifo::DeviceSession;
//!
//! let devices = ftdi_fifo::list_devices();
//! let first = devices.first().ok_or(ftdi_fifo::Error::DeviceNotFound)?;
//!
//! let mut session = DeviceSession::new();
//! session.open(first, 0, 0)?;
//! session.set_sync_mode(true)?;
//! session.send(&[0x55, 0x01, 0x00, 0x00, 0xAA])?;
//! match session.read(2, Duration::from_secs(1)) {
//!     Ok(reply) => println!("reply: {reply:02x?}"),
//!     Err(ftdi_fifo::Error::Timeout) => println!("no reply"),
//!     Err(e) => return Err(e),
//! }
//! session.close();
//! # Ok::<(), ftdi_fifo::Error>(())
//! ```
//!
//! # Features
//!
//! - **Device discovery**: Snapshot of attached FTDI-class devices with
//!   serial, description and bus location ([`list_devices`]).
//! - **Sessions**: One owned handle per [`DeviceSession`], released on
//!   [`close`](DeviceSession::close) or drop.
//! - **Mode control**: Switch between asynchronous and synchronous FIFO
//!   mode ([`DeviceSession::set_sync_mode`]).
//! - **Transfers**: Chunked writes and packet-budgeted reads with modem
//!   status headers stripped.
//! - **Pluggable transport**: Implement [`Backend`] and [`Transport`] to
//!   drive a session without real hardware.

pub mod config;
pub mod constants;
pub mod device_info;
pub mod error;
pub mod session;
mod transfer;
pub mod transport;
pub mod types;
pub mod usb;

// ---- Convenience re-exports ----

pub use config::SessionConfig;
pub use constants::FTDI_VID;
pub use device_info::{list_devices, try_list_devices, DeviceDescriptor, Enumerator, Location};
pub use error::{Error, ErrorKind, Result};
pub use session::DeviceSession;
pub use transport::{Backend, Transport, TransportError};
pub use types::*;
pub use usb::{NusbBackend, NusbTransport};
