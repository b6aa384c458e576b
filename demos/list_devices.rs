//! List all connected FTDI devices.
//!
//! Usage: cargo run --example list_devices

fn main() -> Result<(), ftdi_fifo::Error> {
    env_logger::init();

    let devices = ftdi_fifo::try_list_devices()?;
    if devices.is_empty() {
        println!("No FTDI devices found.");
        return Ok(());
    }

    for (i, dev) in devices.iter().enumerate() {
        println!(
            "#{i}: {:04x}:{:04x} at {} chip={:?} serial={:?} description={:?}",
            dev.vendor_id(),
            dev.product_id(),
            dev.location(),
            dev.chip_type(),
            dev.serial(),
            dev.description(),
        );
    }

    Ok(())
}
