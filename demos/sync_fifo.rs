//! Synchronous FIFO command/response example.
//!
//! Opens interface A of the first FT2232H/FT232H, switches it into
//! synchronous FIFO mode, sends a 5-byte command frame and prints whatever
//! the attached board answers.
//!
//! Usage: cargo run --example sync_fifo

use std::time::Duration;

use ftdi_fifo::{DeviceSession, Error, SessionConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let devices = ftdi_fifo::list_devices();
    let Some(dev) = devices
        .iter()
        .find(|d| d.chip_type().is_some_and(|c| c.supports_sync_fifo()))
    else {
        println!("No FT2232H/FT232H found.");
        return Ok(());
    };

    println!("Opening {} ({})...", dev.location(), dev.description());
    let config = SessionConfig::default().write_timeout(Duration::from_millis(500));
    let mut session = DeviceSession::with_config(config);
    session.open(dev, 0, 0)?;
    session.set_sync_mode(true)?;
    println!("Mode: {:?}", session.mode());

    let command = [0x55, 0x01, 0x00, 0x00, 0xAA];
    let n = session.send(&command)?;
    println!("Sent {n} bytes");

    match session.read(2, Duration::from_secs(1)) {
        Ok(reply) => println!("Received {} bytes: {:02x?}", reply.len(), reply),
        Err(Error::Timeout) => println!("No data received (timeout)."),
        Err(e) => println!("Read error: {e}"),
    }
    if let Some(status) = session.modem_status() {
        println!("Modem status: {:#06x}", status.raw());
    }

    session.close();
    Ok(())
}
