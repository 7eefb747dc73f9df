//! Example: Reading and writing ControlLogix / CompactLogix tags
//!
//! Run with: cargo run --example logix_read_write -- 192.168.1.30 1
//!
//! The optional second argument is the controller's backplane slot; when
//! given, requests are routed through the backplane.

use ab_eip::{CipType, CipValue, ClientConfig, EipError, LogixClient, TypeRequest};
use std::net::Ipv4Addr;

fn main() -> ab_eip::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let ip: Ipv4Addr = args
        .next()
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(Ipv4Addr::new(192, 168, 1, 30));
    let slot: Option<u8> = args.next().and_then(|arg| arg.parse().ok());

    let mut config = ClientConfig::new(ip);
    if let Some(slot) = slot {
        config = config.with_slot(slot).with_routing(true);
    }

    let mut plc = LogixClient::new(config);
    plc.connect()?;
    println!("Connected via {:?}", plc.route());

    // Type detected from the controller
    plc.write("Temperature", 72.5)?;
    println!("Temperature = {}", plc.read("Temperature")?);

    // Explicit type, no detection read
    plc.write_as("Counts[3]", 12, TypeRequest::Explicit(CipType::Dint))?;

    // Several elements of one type
    plc.write_elements("Recipe[0]", &[CipValue::Real(1.0), CipValue::Real(2.5)])?;
    println!("Recipe[0..2] = {:?}", plc.read_elements("Recipe[0]", 2)?);

    match plc.read("DoesNotExist") {
        Ok(value) => println!("DoesNotExist = {}", value),
        Err(e @ EipError::CipStatus { .. }) => println!("Rejected as expected: {}", e),
        Err(e) => return Err(e),
    }

    plc.disconnect();
    Ok(())
}
