//! Session configuration.

use std::time::Duration;

use crate::types::FlowControl;

/// Default bulk-out timeout per chunk.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default control transfer timeout.
pub const DEFAULT_CONTROL_TIMEOUT: Duration = Duration::from_secs(5);

/// Default write chunk size.
pub const DEFAULT_WRITE_CHUNKSIZE: usize = 0x10000;

/// Default read chunk size.
pub const DEFAULT_READ_CHUNKSIZE: usize = 0x10000;

/// Default latency timer in milliseconds.
pub const DEFAULT_LATENCY_MS: u8 = 2;

/// Transfer and initialisation parameters of a
/// [`DeviceSession`](crate::DeviceSession).
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use ftdi_fifo::SessionConfig;
///
/// // FT2232H high-speed bulk endpoints use 512-byte packets.
/// let config = SessionConfig::default()
///     .max_packet_size(512)
///     .write_timeout(Duration::from_millis(500));
/// assert_eq!(config.max_packet_size, Some(512));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Timeout for each bulk-out chunk.
    pub write_timeout: Duration,
    /// Timeout for each control transfer.
    pub control_timeout: Duration,
    /// Largest number of bytes sent in a single bulk write.
    pub write_chunksize: usize,
    /// Largest number of bytes requested in a single bulk read.
    ///
    /// Rounded down to whole packets; at least one packet is always
    /// requested.
    pub read_chunksize: usize,
    /// Bulk-in packet size used to strip modem status headers.
    ///
    /// `None` uses the size reported by the endpoint descriptor.
    pub max_packet_size: Option<usize>,
    /// Latency timer applied on open and after every mode switch.
    pub latency_timer: u8,
    /// Flow control applied on open and after every mode switch.
    pub flow_control: FlowControl,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            control_timeout: DEFAULT_CONTROL_TIMEOUT,
            write_chunksize: DEFAULT_WRITE_CHUNKSIZE,
            read_chunksize: DEFAULT_READ_CHUNKSIZE,
            max_packet_size: None,
            latency_timer: DEFAULT_LATENCY_MS,
            flow_control: FlowControl::Disabled,
        }
    }
}

impl SessionConfig {
    /// Set the bulk-out timeout.
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Set the control transfer timeout.
    pub fn control_timeout(mut self, timeout: Duration) -> Self {
        self.control_timeout = timeout;
        self
    }

    /// Set the write chunk size. Zero is raised to one.
    pub fn write_chunksize(mut self, chunksize: usize) -> Self {
        self.write_chunksize = chunksize.max(1);
        self
    }

    /// Set the read chunk size. Zero is raised to one.
    pub fn read_chunksize(mut self, chunksize: usize) -> Self {
        self.read_chunksize = chunksize.max(1);
        self
    }

    /// Override the bulk-in packet size.
    pub fn max_packet_size(mut self, size: usize) -> Self {
        self.max_packet_size = Some(size);
        self
    }

    /// Set the latency timer (1-255 ms). Zero is raised to one.
    pub fn latency_timer(mut self, latency_ms: u8) -> Self {
        self.latency_timer = latency_ms.max(1);
        self
    }

    /// Set the flow control mode.
    pub fn flow_control(mut self, flow: FlowControl) -> Self {
        self.flow_control = flow;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.write_chunksize, 0x10000);
        assert_eq!(config.read_chunksize, 0x10000);
        assert_eq!(config.latency_timer, 2);
        assert_eq!(config.max_packet_size, None);
        assert_eq!(config.flow_control, FlowControl::Disabled);
    }

    #[test]
    fn zero_values_are_raised() {
        let config = SessionConfig::default()
            .write_chunksize(0)
            .read_chunksize(0)
            .latency_timer(0);
        assert_eq!(config.write_chunksize, 1);
        assert_eq!(config.read_chunksize, 1);
        assert_eq!(config.latency_timer, 1);
    }
}
