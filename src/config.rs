//! Client configuration and originator identity.
//!
//! # Example
//!
//! ```
//! use ab_eip::{ClientConfig, OriginatorIdentity};
//! use std::net::Ipv4Addr;
//! use std::time::Duration;
//!
//! let config = ClientConfig::new(Ipv4Addr::new(192, 168, 1, 10))
//!     .with_timeout(Duration::from_secs(2))
//!     .with_slot(2)
//!     .with_routing(true)
//!     .with_originator(OriginatorIdentity::new(0x1009, 0x12345678));
//!
//! assert_eq!(config.plc_addr.port(), 44818);
//! assert_eq!(config.slot, 2);
//! ```

use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::cip::RoutePath;
use crate::transport::{DEFAULT_EIP_PORT, DEFAULT_TIMEOUT};

/// Vendor ID sent as the originator in Forward Open and the PCCC requestor ID.
pub const DEFAULT_VENDOR_ID: u16 = 0x1009;

/// Serial number used when no hardware identity is available.
pub const FALLBACK_SERIAL_NUMBER: u32 = 0xAABB_CCDD;

/// Files consulted, in order, for the host's machine identifier.
const MACHINE_ID_PATHS: [&str; 2] = ["/etc/machine-id", "/var/lib/dbus/machine-id"];

/// Identity this client presents to the controller.
///
/// The controller keys connections on (vendor, serial, connection serial),
/// so the serial number must be non-zero and should be unique per host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OriginatorIdentity {
    /// Originator vendor ID.
    pub vendor_id: u16,
    /// Originator serial number, never zero.
    pub serial_number: u32,
}

impl OriginatorIdentity {
    /// Creates an identity from explicit values. A zero serial is replaced by
    /// [`FALLBACK_SERIAL_NUMBER`].
    pub fn new(vendor_id: u16, serial_number: u32) -> Self {
        let serial_number = if serial_number == 0 {
            FALLBACK_SERIAL_NUMBER
        } else {
            serial_number
        };
        Self {
            vendor_id,
            serial_number,
        }
    }

    /// Derives the serial number from raw hardware identity bytes: the first
    /// four bytes read as a little-endian `u32`.
    ///
    /// # Example
    ///
    /// ```
    /// use ab_eip::OriginatorIdentity;
    ///
    /// let id = OriginatorIdentity::from_hardware_id(&[0x78, 0x56, 0x34, 0x12, 0xFF]);
    /// assert_eq!(id.serial_number, 0x12345678);
    ///
    /// let short = OriginatorIdentity::from_hardware_id(&[0x01]);
    /// assert_eq!(short.serial_number, 0xAABBCCDD);
    /// ```
    pub fn from_hardware_id(id: &[u8]) -> Self {
        let serial = match id {
            [a, b, c, d, ..] => u32::from_le_bytes([*a, *b, *c, *d]),
            _ => 0,
        };
        Self::new(DEFAULT_VENDOR_ID, serial)
    }

    /// Derives the identity from the host's machine identifier, falling back
    /// to [`FALLBACK_SERIAL_NUMBER`] if none can be read.
    pub fn detect() -> Self {
        for path in MACHINE_ID_PATHS {
            if let Some(id) = read_machine_id(Path::new(path)) {
                let identity = Self::from_hardware_id(&id);
                debug!(
                    source = path,
                    serial = identity.serial_number,
                    "originator serial derived from machine identifier"
                );
                return identity;
            }
        }
        debug!("no machine identifier available, using fallback originator serial");
        Self::new(DEFAULT_VENDOR_ID, FALLBACK_SERIAL_NUMBER)
    }
}

impl Default for OriginatorIdentity {
    fn default() -> Self {
        Self::detect()
    }
}

/// Reads a machine-id style file (hex text) and decodes its first four bytes.
fn read_machine_id(path: &Path) -> Option<Vec<u8>> {
    let text = std::fs::read_to_string(path).ok()?;
    decode_hex_prefix(text.trim(), 4)
}

fn decode_hex_prefix(text: &str, bytes: usize) -> Option<Vec<u8>> {
    let prefix = text.get(..bytes * 2)?;
    hex::decode(prefix).ok()
}

/// Configuration for creating an SLC or Logix client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// PLC socket address.
    pub plc_addr: SocketAddr,
    /// Transport timeout for connect, send and each reply.
    pub timeout: Duration,
    /// Backplane slot of the target controller.
    pub slot: u8,
    /// Whether Logix requests are routed through the backplane with
    /// Unconnected Send.
    pub use_routing: bool,
    /// Identity presented in Forward Open and PCCC requestor IDs.
    pub originator: OriginatorIdentity,
}

impl ClientConfig {
    /// Creates a configuration with the default port (44818), timeout (5 s),
    /// slot 0, routing disabled and a detected originator identity.
    ///
    /// # Example
    ///
    /// ```
    /// use ab_eip::ClientConfig;
    /// use std::net::Ipv4Addr;
    ///
    /// let config = ClientConfig::new(Ipv4Addr::new(192, 168, 1, 10));
    /// assert!(!config.use_routing);
    /// assert_ne!(config.originator.serial_number, 0);
    /// ```
    pub fn new(plc_ip: Ipv4Addr) -> Self {
        Self {
            plc_addr: SocketAddr::from((plc_ip, DEFAULT_EIP_PORT)),
            timeout: DEFAULT_TIMEOUT,
            slot: 0,
            use_routing: false,
            originator: OriginatorIdentity::detect(),
        }
    }

    /// Sets a custom PLC port (default is 44818).
    pub fn with_port(mut self, port: u16) -> Self {
        self.plc_addr.set_port(port);
        self
    }

    /// Sets a custom timeout (default is 5 seconds).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the backplane slot of the controller.
    pub fn with_slot(mut self, slot: u8) -> Self {
        self.slot = slot;
        self
    }

    /// Enables or disables backplane routing.
    pub fn with_routing(mut self, use_routing: bool) -> Self {
        self.use_routing = use_routing;
        self
    }

    /// Overrides the originator identity.
    pub fn with_originator(mut self, originator: OriginatorIdentity) -> Self {
        self.originator = originator;
        self
    }

    /// Returns the route for requests that use Unconnected Send.
    pub fn route(&self) -> RoutePath {
        RoutePath::for_slot(self.slot, self.use_routing)
    }
}
