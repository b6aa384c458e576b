//! Type definitions for FTDI chip communication.
//!
//! These types model the chip variants, interface selection, bitmodes,
//! modem status and the session transfer mode.

use crate::error::{Error, Result};

/// Supported FTDI chip types.
///
/// Derived from the USB `bcdDevice` descriptor field when a device is
/// enumerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChipType {
    /// Original FTDI chip (FT8U232AM).
    Am,
    /// B-type chip (FT232BM, FT245BM).
    Bm,
    /// Dual-port chip (FT2232C/D/L).
    Ft2232C,
    /// FT232R / FT245R.
    Ft232R,
    /// Dual hi-speed chip (FT2232H).
    Ft2232H,
    /// Quad-port chip (FT4232H).
    Ft4232H,
    /// Single hi-speed chip (FT232H).
    Ft232H,
    /// FT230X / FT231X / FT234XD.
    Ft230X,
}

impl ChipType {
    /// Identify the chip from its USB release number (`bcdDevice`).
    ///
    /// `has_serial` disambiguates the BM bug where `bcdDevice` reads 0x200
    /// when no serial number is programmed. Returns `None` for release
    /// numbers that match no known family.
    pub fn from_release(bcd: u16, has_serial: bool) -> Option<Self> {
        match bcd {
            0x0400 => Some(Self::Bm),
            0x0200 if !has_serial => Some(Self::Bm),
            0x0200 => Some(Self::Am),
            0x0500 => Some(Self::Ft2232C),
            0x0600 => Some(Self::Ft232R),
            0x0700 => Some(Self::Ft2232H),
            0x0800 => Some(Self::Ft4232H),
            0x0900 => Some(Self::Ft232H),
            0x1000 => Some(Self::Ft230X),
            _ => None,
        }
    }

    /// Whether this is an H-type (hi-speed) chip.
    #[inline]
    pub fn is_h_type(self) -> bool {
        matches!(self, Self::Ft2232H | Self::Ft4232H | Self::Ft232H)
    }

    /// Whether the chip implements the synchronous FIFO bitmode.
    pub fn supports_sync_fifo(self) -> bool {
        matches!(self, Self::Ft2232H | Self::Ft232H)
    }

    /// Bulk packet size used when the endpoint descriptor is unavailable.
    pub fn default_max_packet_size(self) -> usize {
        if self.is_h_type() {
            512
        } else {
            64
        }
    }
}

/// Bitbang / FIFO mode selection.
///
/// Used with [`DeviceSession::set_bitmode`](crate::DeviceSession::set_bitmode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BitMode {
    /// Normal serial/FIFO mode (bitbang disabled).
    #[default]
    Reset,
    /// Asynchronous bitbang mode (B-type and later).
    BitBang,
    /// MPSSE mode (FT2232x and later).
    Mpsse,
    /// Synchronous bitbang mode (FT2232x, FT232R and later).
    SyncBB,
    /// MCU host bus emulation mode (FT2232x).
    Mcu,
    /// Fast opto-isolated serial mode (FT2232x).
    Opto,
    /// CBUS bitbang mode (FT232R, configure in EEPROM first).
    Cbus,
    /// Synchronous FIFO mode (FT2232H, FT232H).
    SyncFf,
    /// FT1284 mode (FT232H).
    Ft1284,
}

impl BitMode {
    /// Wire value for the SIO_SET_BITMODE request.
    pub(crate) fn wire_value(self) -> u8 {
        match self {
            Self::Reset => 0x00,
            Self::BitBang => 0x01,
            Self::Mpsse => 0x02,
            Self::SyncBB => 0x04,
            Self::Mcu => 0x08,
            Self::Opto => 0x10,
            Self::Cbus => 0x20,
            Self::SyncFf => 0x40,
            Self::Ft1284 => 0x80,
        }
    }
}

/// Port interface selection for multi-interface chips.
///
/// Chips like the FT2232H (dual) and FT4232H (quad) expose multiple
/// independent interfaces. Single-channel parts only have `A`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Interface {
    /// Interface A (port 0).
    #[default]
    A,
    /// Interface B (port 1).
    B,
    /// Interface C (port 2, FT4232H only).
    C,
    /// Interface D (port 3, FT4232H only).
    D,
}

impl TryFrom<u8> for Interface {
    type Error = Error;

    /// Map a 0-based interface index to an [`Interface`].
    fn try_from(index: u8) -> Result<Self> {
        match index {
            0 => Ok(Self::A),
            1 => Ok(Self::B),
            2 => Ok(Self::C),
            3 => Ok(Self::D),
            _ => Err(Error::InvalidArgument("interface index must be 0..=3")),
        }
    }
}

/// Interface configuration resolved to concrete USB endpoint values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceConfig {
    /// The USB interface number (0-based).
    pub interface_num: u8,
    /// The USB index value used in control transfers (1-based).
    pub usb_index: u16,
    /// The bulk OUT endpoint address (host-to-device, for writing data).
    pub write_ep: u8,
    /// The bulk IN endpoint address (device-to-host, for reading data).
    pub read_ep: u8,
}

impl Interface {
    /// Resolve to concrete USB endpoint configuration.
    pub fn config(self) -> InterfaceConfig {
        match self {
            Self::A => InterfaceConfig {
                interface_num: 0,
                usb_index: 1,
                write_ep: 0x02,
                read_ep: 0x81,
            },
            Self::B => InterfaceConfig {
                interface_num: 1,
                usb_index: 2,
                write_ep: 0x04,
                read_ep: 0x83,
            },
            Self::C => InterfaceConfig {
                interface_num: 2,
                usb_index: 3,
                write_ep: 0x06,
                read_ep: 0x85,
            },
            Self::D => InterfaceConfig {
                interface_num: 3,
                usb_index: 4,
                write_ep: 0x08,
                read_ep: 0x87,
            },
        }
    }
}

/// Flow control mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FlowControl {
    /// No flow control.
    #[default]
    Disabled,
    /// Hardware RTS/CTS flow control.
    RtsCts,
    /// Hardware DTR/DSR flow control.
    DtrDsr,
}

/// Transfer mode of a [`DeviceSession`](crate::DeviceSession).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransferMode {
    /// No device handle is held.
    #[default]
    Closed,
    /// Asynchronous (UART-like) mode, the chip's power-on default.
    Async,
    /// Synchronous FIFO mode. Required for send and read.
    SyncFifo,
}

/// Decoded modem status from the FTDI chip.
///
/// The FTDI chip sends two status bytes as a header with every USB read.
/// This struct represents the decoded content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModemStatus {
    raw: u16,
}

impl ModemStatus {
    /// Create from the raw two-byte status value.
    pub(crate) fn from_raw(raw: u16) -> Self {
        Self { raw }
    }

    /// Decode the two header bytes of a bulk-in packet.
    pub(crate) fn from_header(header: [u8; 2]) -> Self {
        Self::from_raw(u16::from_le_bytes(header))
    }

    /// Raw 16-bit status value.
    pub fn raw(self) -> u16 {
        self.raw
    }

    // -- Byte 0 (modem status lines) --

    /// Clear To Send (CTS) is active.
    pub fn cts(self) -> bool {
        self.raw & 0x10 != 0
    }

    /// Data Set Ready (DSR) is active.
    pub fn dsr(self) -> bool {
        self.raw & 0x20 != 0
    }

    /// Ring Indicator (RI) is active.
    pub fn ri(self) -> bool {
        self.raw & 0x40 != 0
    }

    /// Receive Line Signal Detect (RLSD / DCD) is active.
    pub fn rlsd(self) -> bool {
        self.raw & 0x80 != 0
    }

    // -- Byte 1 (line status) --

    /// Data Ready (DR).
    pub fn data_ready(self) -> bool {
        self.raw & 0x0100 != 0
    }

    /// Overrun Error (OE).
    pub fn overrun_error(self) -> bool {
        self.raw & 0x0200 != 0
    }

    /// Transmitter Holding Register Empty (THRE).
    pub fn transmitter_holding_empty(self) -> bool {
        self.raw & 0x2000 != 0
    }

    /// Transmitter Empty (TEMT).
    pub fn transmitter_empty(self) -> bool {
        self.raw & 0x4000 != 0
    }

    /// Error in RCVR FIFO.
    pub fn fifo_error(self) -> bool {
        self.raw & 0x8000 != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chip_from_release() {
        assert_eq!(ChipType::from_release(0x0700, true), Some(ChipType::Ft2232H));
        assert_eq!(ChipType::from_release(0x0900, false), Some(ChipType::Ft232H));
        assert_eq!(ChipType::from_release(0x0200, false), Some(ChipType::Bm));
        assert_eq!(ChipType::from_release(0x0200, true), Some(ChipType::Am));
        assert_eq!(ChipType::from_release(0x1234, true), None);
    }

    #[test]
    fn sync_fifo_support() {
        assert!(ChipType::Ft2232H.supports_sync_fifo());
        assert!(ChipType::Ft232H.supports_sync_fifo());
        assert!(!ChipType::Ft4232H.supports_sync_fifo());
        assert!(!ChipType::Ft232R.supports_sync_fifo());
    }

    #[test]
    fn interface_from_index() {
        assert_eq!(Interface::try_from(0).unwrap(), Interface::A);
        assert_eq!(Interface::try_from(3).unwrap(), Interface::D);
        assert!(matches!(
            Interface::try_from(4),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(Interface::B.config().read_ep, 0x83);
    }

    #[test]
    fn modem_status_header_is_little_endian() {
        let status = ModemStatus::from_header([0x31, 0x60]);
        assert_eq!(status.raw(), 0x6031);
        assert!(status.cts());
        assert!(status.dsr());
        assert!(status.transmitter_empty());
        assert!(!status.data_ready());
    }

    #[test]
    fn bitmode_wire_values() {
        assert_eq!(BitMode::SyncFf.wire_value(), 0x40);
        assert_eq!(BitMode::BitBang.wire_value(), 0x01);
        assert_eq!(BitMode::Reset.wire_value(), 0x00);
    }
}
