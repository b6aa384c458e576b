//! Property-based tests for send and read length bounds.
//!
//! Uses `proptest` to drive a synchronous FIFO session over the in-memory
//! backend with random payloads, chunk sizes and device replies.

mod common;

use std::time::Duration;

use common::*;
use ftdi_fifo::{Error, SessionConfig};
use proptest::prelude::*;

/// Raw bulk-in replies: some empty, some header-only, some with payload.
fn raw_reads() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(any::<u8>(), 0..200), 0..6)
}

proptest! {
    /// A send either reports every byte or a short write with fewer.
    #[test]
    fn send_accounts_for_every_byte(
        data in prop::collection::vec(any::<u8>(), 1..2000),
        chunksize in 1usize..600,
        accept_limit in prop::option::of(1usize..600),
    ) {
        let (mut session, state) = sync_session();
        session.set_write_chunksize(chunksize);
        state.borrow_mut().accept_limit = accept_limit;

        let accepted: usize = match session.send(&data) {
            Ok(n) => {
                prop_assert_eq!(n, data.len());
                n
            }
            Err(Error::ShortWrite { written, requested }) => {
                prop_assert!(written < data.len());
                prop_assert_eq!(requested, data.len());
                written
            }
            Err(e) => return Err(TestCaseError::fail(format!("unexpected error: {e}"))),
        };

        let state = state.borrow();
        prop_assert!(state.writes.iter().all(|w| w.len() <= chunksize));
        prop_assert_eq!(state.writes.iter().map(Vec::len).sum::<usize>(), accepted);
        prop_assert_eq!(state.writes.concat(), &data[..accepted]);
    }

    /// A read never returns more than its packet budget allows.
    #[test]
    fn read_stays_within_packet_budget(
        num_packets in 1usize..8,
        packet_size in 3usize..64,
        replies in raw_reads(),
    ) {
        let (mut session, state) = session_with_config(
            vec![ft2232h("1", 1)],
            SessionConfig::default().max_packet_size(packet_size),
        );
        let devices = session.list_devices();
        session.open(&devices[0], 0, 0).unwrap();
        session.set_sync_mode(true).unwrap();
        state.borrow_mut().reads.extend(replies.into_iter().map(Ok));

        match session.read(num_packets, Duration::ZERO) {
            Ok(payload) => {
                prop_assert!(!payload.is_empty());
                prop_assert!(payload.len() <= num_packets * (packet_size - 2));
            }
            Err(Error::Timeout) => {}
            Err(e) => return Err(TestCaseError::fail(format!("unexpected error: {e}"))),
        }
        prop_assert!(state.borrow().read_requests.iter().all(|&len| len <= num_packets * packet_size));
    }
}
