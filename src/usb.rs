//! [`Backend`] and [`Transport`] implementations on top of `nusb`.
//!
//! No C dependencies or `libusb` are required. On Linux the kernel's
//! `ftdi_sio` driver is detached from the claimed interface when a device
//! is opened.

use std::time::Duration;

use nusb::transfer::{Bulk, ControlIn, ControlOut, ControlType, In, Out, Recipient};
use nusb::{self, DeviceInfo, MaybeFuture};

use crate::device_info::{DeviceDescriptor, Location};
use crate::transport::{Backend, Transport, TransportError};
use crate::types::{ChipType, Interface, InterfaceConfig};

/// The `nusb` USB backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct NusbBackend;

fn descriptor_from_info(info: &DeviceInfo) -> DeviceDescriptor {
    let location = Location::new(
        info.bus_id(),
        info.port_chain().to_vec(),
        info.device_address(),
    );
    DeviceDescriptor::new(info.vendor_id(), info.product_id(), location)
        .with_serial(info.serial_number().unwrap_or_default())
        .with_description(info.product_string().unwrap_or_default())
        .with_release(info.device_version())
}

impl Backend for NusbBackend {
    type Transport = NusbTransport;

    fn list_devices(&self) -> Result<Vec<DeviceDescriptor>, TransportError> {
        let devices = nusb::list_devices()
            .wait()?
            .map(|info| descriptor_from_info(&info))
            .collect();
        Ok(devices)
    }

    fn open(
        &self,
        descriptor: &DeviceDescriptor,
        iface: Interface,
    ) -> Result<NusbTransport, TransportError> {
        let dev_info = nusb::list_devices()
            .wait()?
            .find(|info| {
                info.vendor_id() == descriptor.vendor_id()
                    && info.product_id() == descriptor.product_id()
                    && descriptor.location().is_at(
                        info.bus_id(),
                        info.port_chain(),
                        info.device_address(),
                    )
            })
            .ok_or(TransportError::NotFound)?;

        let config = iface.config();
        let device = dev_info.open().wait()?;

        // Detach kernel driver and claim interface
        let interface = device
            .detach_and_claim_interface(config.interface_num)
            .wait()?;

        let max_packet_size =
            determine_max_packet_size(&device, descriptor.chip_type(), &config);

        log::debug!(
            "Claimed interface {} of {:04X}:{:04X} at {} (max packet {} bytes)",
            config.interface_num,
            descriptor.vendor_id(),
            descriptor.product_id(),
            descriptor.location(),
            max_packet_size
        );

        Ok(NusbTransport {
            device,
            interface,
            config,
            max_packet_size,
        })
    }
}

/// A claimed interface of an open FTDI device.
pub struct NusbTransport {
    #[allow(dead_code)] // Kept to ensure the USB device stays open
    device: nusb::Device,
    interface: nusb::Interface,
    config: InterfaceConfig,
    max_packet_size: usize,
}

impl std::fmt::Debug for NusbTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NusbTransport")
            .field("interface", &self.config.interface_num)
            .field("max_packet_size", &self.max_packet_size)
            .finish_non_exhaustive()
    }
}

impl Transport for NusbTransport {
    fn max_packet_size(&self) -> usize {
        self.max_packet_size
    }

    fn control_out(
        &mut self,
        request: u8,
        value: u16,
        index: u16,
        timeout: Duration,
    ) -> Result<(), TransportError> {
        self.interface
            .control_out(
                ControlOut {
                    control_type: ControlType::Vendor,
                    recipient: Recipient::Device,
                    request,
                    value,
                    index,
                    data: &[],
                },
                timeout,
            )
            .wait()?;
        Ok(())
    }

    fn control_in(
        &mut self,
        request: u8,
        value: u16,
        index: u16,
        length: u16,
        timeout: Duration,
    ) -> Result<Vec<u8>, TransportError> {
        let data = self
            .interface
            .control_in(
                ControlIn {
                    control_type: ControlType::Vendor,
                    recipient: Recipient::Device,
                    request,
                    value,
                    index,
                    length,
                },
                timeout,
            )
            .wait()?;
        Ok(data)
    }

    fn bulk_write(&mut self, data: &[u8], timeout: Duration) -> Result<usize, TransportError> {
        let mut ep = self.interface.endpoint::<Bulk, Out>(self.config.write_ep)?;

        let mut transfer_buf = nusb::transfer::Buffer::new(data.len());
        transfer_buf.extend_from_slice(data);

        let completion = ep.transfer_blocking(transfer_buf, timeout);
        match completion.status {
            Ok(()) => Ok(completion.actual_len),
            // Timed out: report what made it across before cancellation.
            Err(nusb::transfer::TransferError::Cancelled) => Ok(completion.actual_len),
            Err(e) => Err(e.into()),
        }
    }

    fn bulk_read(&mut self, len: usize, timeout: Duration) -> Result<Vec<u8>, TransportError> {
        let mut ep = self.interface.endpoint::<Bulk, In>(self.config.read_ep)?;

        // IN transfers must request a whole number of endpoint packets.
        let ep_packet = ep.max_packet_size().max(1);
        let requested_len = len.div_ceil(ep_packet) * ep_packet;
        let mut transfer_buf = nusb::transfer::Buffer::new(requested_len);
        transfer_buf.set_requested_len(requested_len);

        let completion = ep.transfer_blocking(transfer_buf, timeout);
        let actual_len = completion.actual_len;
        match completion.status {
            Ok(()) => {}
            Err(nusb::transfer::TransferError::Cancelled) if actual_len > 0 => {}
            Err(e) => return Err(e.into()),
        }

        let mut raw = completion.buffer.into_vec();
        raw.truncate(actual_len);
        Ok(raw)
    }
}

/// Determine the bulk IN packet size for a claimed interface.
fn determine_max_packet_size(
    device: &nusb::Device,
    chip_type: Option<ChipType>,
    config: &InterfaceConfig,
) -> usize {
    // Default based on chip type
    let default_size = chip_type.map_or(64, ChipType::default_max_packet_size);

    // Try to read from the configuration descriptor
    let active = match device.active_configuration() {
        Ok(c) => c,
        Err(_) => return default_size,
    };

    for iface_group in active.interfaces() {
        if iface_group.interface_number() != config.interface_num {
            continue;
        }
        for alt in iface_group.alt_settings() {
            if let Some(ep) = alt.endpoints().find(|ep| ep.address() == config.read_ep) {
                return ep.max_packet_size();
            }
        }
    }

    default_size
}
