//! Chunked bulk transfers over a [`Transport`].
//!
//! Writes are split into chunks no larger than the session's write chunk
//! size. Reads request whole packets and strip the modem status header the
//! chip puts in front of every packet.

use std::time::{Duration, Instant};

use crate::constants::MODEM_STATUS_LEN;
use crate::error::{Error, Result};
use crate::transport::{Transport, TransportError};
use crate::types::ModemStatus;

/// Payload collected by [`read_packets`].
#[derive(Debug, Default)]
pub(crate) struct ReadOutcome {
    /// Concatenated packet payloads, headers removed.
    pub payload: Vec<u8>,
    /// Header of the last packet received.
    pub status: Option<ModemStatus>,
}

/// Write `data` in chunks of at most `chunksize` bytes.
///
/// Stops at the first chunk the device does not fully accept and reports
/// [`Error::ShortWrite`] with the total accepted so far.
pub(crate) fn send_chunked<T: Transport + ?Sized>(
    transport: &mut T,
    data: &[u8],
    chunksize: usize,
    timeout: Duration,
) -> Result<usize> {
    debug_assert!(chunksize > 0);

    let mut written = 0;
    for chunk in data.chunks(chunksize) {
        let accepted = transport.bulk_write(chunk, timeout)?.min(chunk.len());
        log::trace!("USB write {} of {} bytes", accepted, chunk.len());

        written += accepted;
        if accepted < chunk.len() {
            return Err(Error::ShortWrite {
                written,
                requested: data.len(),
            });
        }
    }

    Ok(written)
}

/// Read up to `num_packets` packets of payload.
///
/// `timeout` bounds each bulk transfer. While nothing has arrived the chip
/// keeps answering with header-only packets; those polls continue until
/// `timeout` has passed since the call started. Once payload has arrived,
/// the first poll without payload ends the read.
///
/// Each bulk transfer requests at most `chunksize` bytes, rounded down to
/// whole packets but never below one packet.
pub(crate) fn read_packets<T: Transport + ?Sized>(
    transport: &mut T,
    num_packets: usize,
    packet_size: usize,
    chunksize: usize,
    timeout: Duration,
) -> Result<ReadOutcome> {
    debug_assert!(packet_size > MODEM_STATUS_LEN);

    let packets_per_transfer = (chunksize / packet_size).max(1);
    let started = Instant::now();
    let mut outcome = ReadOutcome {
        payload: Vec::with_capacity(
            num_packets.min(packets_per_transfer) * (packet_size - MODEM_STATUS_LEN),
        ),
        status: None,
    };
    let mut packets_left = num_packets;

    while packets_left > 0 {
        let request = packets_left.min(packets_per_transfer) * packet_size;
        let raw = match transport.bulk_read(request, timeout) {
            Ok(raw) => raw,
            Err(TransportError::Timeout) => break,
            Err(e) => return Err(e.into()),
        };

        let packets = append_payload(&raw, packet_size, packets_left, &mut outcome.payload);
        log::trace!(
            "USB read {} bytes ({} packets with payload)",
            raw.len(),
            packets.with_payload
        );
        if packets.status.is_some() {
            outcome.status = packets.status;
        }
        packets_left -= packets.with_payload;

        if packets.with_payload == 0
            && (!outcome.payload.is_empty() || started.elapsed() >= timeout)
        {
            break;
        }
    }

    if outcome.payload.is_empty() {
        return Err(Error::Timeout);
    }
    Ok(outcome)
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Packets {
    with_payload: usize,
    status: Option<ModemStatus>,
}

/// Strip the 2-byte modem status header from each packet of a raw USB bulk
/// read result and append the payloads to `out`.
///
/// At most `max_packets` payloads are taken; header-only packets do not
/// count towards that limit.
fn append_payload(raw: &[u8], packet_size: usize, max_packets: usize, out: &mut Vec<u8>) -> Packets {
    let mut packets = Packets::default();

    for packet in raw.chunks(packet_size) {
        if packet.len() >= MODEM_STATUS_LEN {
            packets.status = Some(ModemStatus::from_header([packet[0], packet[1]]));
        }
        if packet.len() <= MODEM_STATUS_LEN {
            // Packet is only status bytes, skip entirely
            continue;
        }
        if packets.with_payload == max_packets {
            break;
        }
        out.extend_from_slice(&packet[MODEM_STATUS_LEN..]);
        packets.with_payload += 1;
    }

    packets
}
