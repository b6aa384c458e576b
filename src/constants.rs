//! Protocol constants for FTDI chip communication.
//!
//! These constants define the USB vendor request codes and wire values used
//! by the session and mode controller. Most users should not need them
//! directly, except for the vendor/product IDs when filtering descriptors.

// ---- FTDI Vendor ID and known Product IDs ----

/// Default FTDI vendor ID.
pub const FTDI_VID: u16 = 0x0403;

/// Known FTDI product IDs.
pub mod pid {
    /// FT232AM, FT232BM, FT232R.
    pub const FT232: u16 = 0x6001;
    /// FT2232C/D/H.
    pub const FT2232: u16 = 0x6010;
    /// FT4232H.
    pub const FT4232: u16 = 0x6011;
    /// FT232H.
    pub const FT232H: u16 = 0x6014;
    /// FT230X.
    pub const FT230X: u16 = 0x6015;
}

/// Vendor/product pairs recognised as FTDI-class by a default
/// [`Enumerator`](crate::device_info::Enumerator).
pub const DEFAULT_VID_PIDS: [(u16, u16); 5] = [
    (FTDI_VID, pid::FT2232),
    (FTDI_VID, pid::FT232),
    (FTDI_VID, pid::FT4232),
    (FTDI_VID, pid::FT232H),
    (FTDI_VID, pid::FT230X),
];

/// Size of the modem status header the chip prepends to every bulk-in packet.
pub const MODEM_STATUS_LEN: usize = 2;

// ---- SIO vendor request codes ----

/// Reset the port.
pub(crate) const SIO_RESET_REQUEST: u8 = 0x00;
/// Set flow control register.
pub(crate) const SIO_SET_FLOW_CTRL_REQUEST: u8 = 0x02;
/// Poll modem status.
pub(crate) const SIO_POLL_MODEM_STATUS_REQUEST: u8 = 0x05;
/// Set latency timer.
pub(crate) const SIO_SET_LATENCY_TIMER_REQUEST: u8 = 0x09;
/// Get latency timer.
pub(crate) const SIO_GET_LATENCY_TIMER_REQUEST: u8 = 0x0A;
/// Set bitbang mode.
pub(crate) const SIO_SET_BITMODE_REQUEST: u8 = 0x0B;

// ---- Reset sub-commands ----

/// SIO reset (device reset).
pub(crate) const SIO_RESET_SIO: u16 = 0;
/// Flush RX FIFO (chip -> host direction).
pub(crate) const SIO_TCIFLUSH: u16 = 2;
/// Flush TX FIFO (host -> chip direction).
pub(crate) const SIO_TCOFLUSH: u16 = 1;

// ---- Flow control values ----

/// Disable flow control.
pub(crate) const SIO_DISABLE_FLOW_CTRL: u16 = 0x0;
/// RTS/CTS hardware flow control.
pub(crate) const SIO_RTS_CTS_HS: u16 = 0x1 << 8;
/// DTR/DSR hardware flow control.
pub(crate) const SIO_DTR_DSR_HS: u16 = 0x2 << 8;

/// Pin mask used for every bitmode request issued by the mode controller.
pub(crate) const ALL_PINS_OUTPUT: u8 = 0xFF;
