//! Device discovery and enumeration.
//!
//! Use [`list_devices`] to get a snapshot of connected FTDI devices, or an
//! [`Enumerator`] with extra vendor/product pairs for re-branded parts.

use std::fmt;

use crate::constants::DEFAULT_VID_PIDS;
use crate::error::Result;
use crate::transport::{Backend, TransportError};
use crate::types::ChipType;
use crate::usb::NusbBackend;

/// Physical position of a device on the USB tree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    bus: String,
    ports: Vec<u8>,
    address: u8,
}

impl Location {
    /// Create a location from a bus identifier, hub port chain and device address.
    pub fn new(bus: impl Into<String>, ports: Vec<u8>, address: u8) -> Self {
        Self {
            bus: bus.into(),
            ports,
            address,
        }
    }

    /// Bus identifier as reported by the operating system.
    pub fn bus(&self) -> &str {
        &self.bus
    }

    /// Hub ports from the root hub down to the device.
    pub fn ports(&self) -> &[u8] {
        &self.ports
    }

    /// Device address on its bus.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Whether this is the position described by `bus`, `ports` and `address`.
    pub fn is_at(&self, bus: &str, ports: &[u8], address: u8) -> bool {
        self.address == address && self.bus == bus && self.ports == ports
    }
}

impl fmt::Display for Location {
    /// Formats as `bus-port.port...`, or `bus:address` when no port chain is known.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ports.is_empty() {
            return write!(f, "{}:{}", self.bus, self.address);
        }
        write!(f, "{}-", self.bus)?;
        for (i, port) in self.ports.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{port}")?;
        }
        Ok(())
    }
}

/// One attached device, as seen at enumeration time.
///
/// Descriptors are snapshots: they are never updated and never tied to an
/// open handle. Pass one to [`DeviceSession::open`](crate::DeviceSession::open)
/// to select which device to bind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceDescriptor {
    vendor_id: u16,
    product_id: u16,
    serial: String,
    description: String,
    location: Location,
    release: u16,
}

impl DeviceDescriptor {
    /// Create a descriptor with empty strings and a zero release number.
    pub fn new(vendor_id: u16, product_id: u16, location: Location) -> Self {
        Self {
            vendor_id,
            product_id,
            serial: String::new(),
            description: String::new(),
            location,
            release: 0,
        }
    }

    /// Set the serial number string.
    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.serial = serial.into();
        self
    }

    /// Set the product description string.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the USB release number (`bcdDevice`).
    pub fn with_release(mut self, release: u16) -> Self {
        self.release = release;
        self
    }

    /// USB vendor ID.
    pub fn vendor_id(&self) -> u16 {
        self.vendor_id
    }

    /// USB product ID.
    pub fn product_id(&self) -> u16 {
        self.product_id
    }

    /// Serial number, empty if the device reports none.
    pub fn serial(&self) -> &str {
        &self.serial
    }

    /// Product description, empty if the device reports none.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Position on the USB tree.
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// USB release number (`bcdDevice`).
    pub fn release(&self) -> u16 {
        self.release
    }

    /// Chip family derived from the release number, if recognised.
    pub fn chip_type(&self) -> Option<ChipType> {
        ChipType::from_release(self.release, !self.serial.is_empty())
    }

    /// Whether `other` has the same vendor and product IDs.
    pub fn same_model(&self, other: &DeviceDescriptor) -> bool {
        self.vendor_id == other.vendor_id && self.product_id == other.product_id
    }
}

/// Lists FTDI-class devices through a [`Backend`].
///
/// A device is FTDI-class when its vendor/product pair is in the
/// enumerator's table, which starts as [`DEFAULT_VID_PIDS`].
///
/// # Example
///
/// ```no_run
/// use ftdi_fifo::{Enumerator, NusbBackend};
///
/// let devices = Enumerator::new()
///     .with_vid_pid(0x1234, 0x0001)
///     .list(&NusbBackend);
/// for dev in &devices {
///     println!("{:04x}:{:04x} at {}", dev.vendor_id(), dev.product_id(), dev.location());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Enumerator {
    vid_pids: Vec<(u16, u16)>,
}

impl Default for Enumerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Enumerator {
    /// An enumerator recognising the default FTDI product IDs.
    pub fn new() -> Self {
        Self {
            vid_pids: DEFAULT_VID_PIDS.to_vec(),
        }
    }

    /// Also recognise devices with this vendor/product pair.
    pub fn with_vid_pid(mut self, vendor_id: u16, product_id: u16) -> Self {
        if !self.recognises(vendor_id, product_id) {
            self.vid_pids.push((vendor_id, product_id));
        }
        self
    }

    /// Whether a vendor/product pair is in the table.
    pub fn recognises(&self, vendor_id: u16, product_id: u16) -> bool {
        self.vid_pids.contains(&(vendor_id, product_id))
    }

    /// List recognised devices, sorted by location.
    pub fn try_list<B: Backend>(&self, backend: &B) -> Result<Vec<DeviceDescriptor>> {
        let mut devices: Vec<DeviceDescriptor> = backend
            .list_devices()?
            .into_iter()
            .filter(|d| self.recognises(d.vendor_id, d.product_id))
            .collect();
        devices.sort_by(|a, b| a.location.cmp(&b.location));
        Ok(devices)
    }

    /// Like [`try_list`](Self::try_list), but an enumeration failure yields
    /// an empty list.
    pub fn list<B: Backend>(&self, backend: &B) -> Vec<DeviceDescriptor> {
        self.try_list(backend).unwrap_or_else(|e| {
            log::warn!("USB enumeration failed: {}", e);
            Vec::new()
        })
    }
}

/// List connected FTDI devices using the nusb backend.
///
/// Returns an empty `Vec` when enumeration fails; use [`try_list_devices`]
/// to see the error.
///
/// # Example
///
/// ```no_run
/// for dev in ftdi_fifo::list_devices() {
///     println!("{} serial={:?}", dev.description(), dev.serial());
/// }
/// ```
pub fn list_devices() -> Vec<DeviceDescriptor> {
    Enumerator::new().list(&NusbBackend)
}

/// List connected FTDI devices using the nusb backend, reporting failures.
pub fn try_list_devices() -> Result<Vec<DeviceDescriptor>> {
    Enumerator::new().try_list(&NusbBackend)
}

/// Devices of `descriptor`'s model in enumeration order.
pub(crate) fn matching_devices<B: Backend>(
    backend: &B,
    descriptor: &DeviceDescriptor,
) -> std::result::Result<Vec<DeviceDescriptor>, TransportError> {
    let mut devices: Vec<DeviceDescriptor> = backend
        .list_devices()?
        .into_iter()
        .filter(|d| d.same_model(descriptor))
        .collect();
    devices.sort_by(|a, b| a.location.cmp(&b.location));
    Ok(devices)
}
