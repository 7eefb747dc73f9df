//! Example: Reading and writing SLC 500 / MicroLogix data files
//!
//! Run with: cargo run --example slc_read_write -- 192.168.1.20
//!
//! Set `RUST_LOG=ab_eip=debug` to see the session handshake and the
//! read-modify-write steps of bit writes.

use ab_eip::utils::format_binary;
use ab_eip::{ClientConfig, FileType, PcccAddress, PcccValue, SlcClient};
use std::net::Ipv4Addr;

fn main() -> ab_eip::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let ip: Ipv4Addr = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(Ipv4Addr::new(192, 168, 1, 20));

    // =========================================================================
    // Connect (Register Session + Forward Open)
    // =========================================================================

    let mut plc = SlcClient::new(ClientConfig::new(ip));
    plc.connect()?;
    println!("Connected: {:?}", plc.status());

    // =========================================================================
    // Integer file
    // =========================================================================

    let n7_0: PcccAddress = "N7:0".parse()?;
    plc.write(&n7_0, -50)?;
    println!("N7:0 = {}", plc.read(&n7_0)?);

    let block = PcccAddress::new(FileType::Integer, 10).with_count(5)?;
    let values = plc.read_elements(&block)?;
    println!("N7:10-14 = {:?}", values);

    // =========================================================================
    // Binary file bits
    // =========================================================================

    let b3_0_5: PcccAddress = "B3:0/5".parse()?;
    plc.write(&b3_0_5, 1)?;
    println!("B3:0/5 = {}", plc.read(&b3_0_5)?);

    if let PcccValue::Binary(word) = plc.read(&"B3:0".parse::<PcccAddress>()?)? {
        println!("B3:0 = {}", format_binary(word));
    }

    // =========================================================================
    // Read-only files
    // =========================================================================

    println!("F8:0 = {}", plc.read(&"F8:0".parse::<PcccAddress>()?)?);
    println!("T4:0 = {}", plc.read(&"T4:0".parse::<PcccAddress>()?)?);

    plc.disconnect();
    Ok(())
}
