//! # Allen-Bradley EtherNet/IP Client
//!
//! A Rust library for reading and writing data in Allen-Bradley PLCs over
//! EtherNet/IP: SLC 500 and MicroLogix controllers through PCCC data files,
//! ControlLogix and CompactLogix controllers through symbolic CIP tags.
//!
//! This is a **protocol-only** library. Each read or write issues one request
//! and waits for its reply (bit writes on PCCC files issue two). No automatic
//! retries, polling, caching or reconnection.
//!
//! ## Features
//!
//! - **Both addressing models**: `N7:0`, `B3:0/5` file addresses and
//!   `Program:Main.Values[3]` tag paths
//! - **Type-safe**: file types and the eleven CIP elementary types are enums,
//!   out-of-range writes are rejected before anything is sent
//! - **Explicit type choice** for tag writes: explicit, auto-detected from a
//!   read, or defaulted from the Rust value
//! - **No panics**: all errors returned as `Result<T, EipError>`
//! - **Pluggable transport**: any [`Transport`] implementation; TCP by default
//!
//! ## Quick Start
//!
//! ```no_run
//! use ab_eip::{ClientConfig, LogixClient, PcccAddress, SlcClient};
//! use std::net::Ipv4Addr;
//!
//! fn main() -> ab_eip::Result<()> {
//!     // SLC 500 / MicroLogix: session + Forward Open connection
//!     let mut slc = SlcClient::new(ClientConfig::new(Ipv4Addr::new(192, 168, 1, 20)));
//!     slc.connect()?;
//!
//!     let n7_0: PcccAddress = "N7:0".parse()?;
//!     slc.write(&n7_0, -50)?;
//!     println!("N7:0 = {}", slc.read(&n7_0)?);
//!     slc.disconnect();
//!
//!     // ControlLogix in slot 1, routed through the backplane
//!     let config = ClientConfig::new(Ipv4Addr::new(192, 168, 1, 30))
//!         .with_slot(1)
//!         .with_routing(true);
//!     let mut logix = LogixClient::new(config);
//!     logix.connect()?;
//!
//!     logix.write("Temperature", 72.5)?;
//!     println!("Temperature = {}", logix.read("Temperature")?);
//!     logix.disconnect();
//!
//!     Ok(())
//! }
//! ```
//!
//! ## PCCC Data Files
//!
//! | File | Type | Element | Read | Write | Bit access |
//! |------|------|:-------:|:----:|:-----:|:----------:|
//! | `N7` | [`FileType::Integer`] | 2 bytes, signed | ✓ | ✓ | ✓ |
//! | `B3` | [`FileType::Binary`] | 2 bytes, unsigned | ✓ | ✓ | ✓ |
//! | `F8` | [`FileType::Float`] | 4 bytes, IEEE-754 | ✓ | ✗ | ✗ |
//! | `T4` | [`FileType::Timer`] | 6 bytes | ✓ | ✗ | ✗ |
//! | `C5` | [`FileType::Counter`] | 6 bytes | ✓ | ✗ | ✗ |
//!
//! Bit writes read the word, change the bit and write the word back. They
//! are not atomic with respect to other writers of the same word.
//!
//! ## Logix Tag Writes
//!
//! ```no_run
//! # use ab_eip::{ClientConfig, LogixClient};
//! # use std::net::Ipv4Addr;
//! # let mut plc = LogixClient::new(ClientConfig::new(Ipv4Addr::new(192, 168, 1, 30)));
//! use ab_eip::{CipType, CipValue, TypeRequest};
//!
//! // One read to learn the type, then the write
//! plc.write("Speed", 1500)?;
//!
//! // Known type, no read
//! plc.write_as("Speed", 1500, TypeRequest::Explicit(CipType::Int))?;
//!
//! // Integers default to DINT, floats to REAL, booleans to BOOL
//! plc.write_as("Ratio", 0.5, TypeRequest::DefaultForKind)?;
//!
//! // Several elements of one type
//! plc.write_elements("Recipe[0]", &[CipValue::Real(1.0), CipValue::Real(2.5)])?;
//! # Ok::<(), ab_eip::EipError>(())
//! ```
//!
//! ## Error Handling
//!
//! ```no_run
//! use ab_eip::{ClientConfig, EipError, LogixClient};
//! use std::net::Ipv4Addr;
//!
//! let mut plc = LogixClient::new(ClientConfig::new(Ipv4Addr::new(192, 168, 1, 30)));
//! plc.connect()?;
//!
//! match plc.read("Speed") {
//!     Ok(value) => println!("Speed = {}", value),
//!     Err(EipError::Timeout) => println!("Communication timeout"),
//!     Err(EipError::CipStatus { general, extended, .. }) => {
//!         println!("PLC rejected the read: 0x{:02X} {:04X?}", general, extended);
//!     }
//!     Err(e) => println!("Error: {}", e),
//! }
//! # Ok::<(), EipError>(())
//! ```
//!
//! ## Configuration
//!
//! ```no_run
//! use ab_eip::{ClientConfig, OriginatorIdentity};
//! use std::net::Ipv4Addr;
//! use std::time::Duration;
//!
//! let config = ClientConfig::new(Ipv4Addr::new(192, 168, 1, 30))
//!     .with_port(44818)                        // default
//!     .with_timeout(Duration::from_secs(2))    // default: 5 s
//!     .with_slot(1)                            // default: 0
//!     .with_routing(true)                      // default: false
//!     .with_originator(OriginatorIdentity::new(0x1009, 0x0102_0304));
//! ```
//!
//! ## Logging
//!
//! The library emits [`tracing`] events (session lifecycle at `info`/`debug`,
//! swallowed teardown failures at `warn`, wire frames at `trace`) and
//! installs no subscriber.

#![warn(clippy::all)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod cip;
mod config;
mod connection;
mod cpf;
mod encapsulation;
mod error;
mod file_type;
mod logix;
mod pccc;
mod session;
mod slc;
mod tag;
mod transport;
pub mod utils;

// Public re-exports
pub use cip::{
    class, parse_routed_response, service, unconnected_send, EPath, MessageRouterRequest,
    MessageRouterResponse, RoutePath, BACKPLANE_PORT, MAX_PATH_WORDS, MAX_PORT, REPLY_FLAG,
};
pub use config::{ClientConfig, OriginatorIdentity, DEFAULT_VENDOR_ID, FALLBACK_SERIAL_NUMBER};
pub use connection::{
    ForwardCloseRequest, ForwardOpenReply, ForwardOpenRequest, DEFAULT_RPI_US,
    CONNECTION_PARAMETERS,
};
pub use cpf::{CommonPacket, CpfItem};
pub use encapsulation::{
    EncapsulationCommand, EncapsulationHeader, EncapsulationPacket, ENCAPSULATION_HEADER_SIZE,
};
pub use error::{cip_status_description, pccc_status_description, EipError, Result};
pub use file_type::FileType;
pub use logix::LogixClient;
pub use pccc::{
    encode_word, execute_pccc, PcccAddress, PcccReply, PcccValue, TypedReadCommand,
    TypedWriteCommand,
};
pub use session::{ConnectionIds, Session, SessionStatus};
pub use slc::SlcClient;
pub use tag::{
    CipType, CipValue, NativeValue, ReadTagCommand, TagReadReply, TypeRequest, WriteTagCommand,
};
pub use transport::{TcpTransport, Transport, DEFAULT_EIP_PORT, DEFAULT_TIMEOUT};
