//! Forward Open and Forward Close requests to the Connection Manager.
//!
//! PCCC traffic rides a class 3 explicit connection. Forward Open negotiates
//! the two network connection IDs; Forward Close releases them. Both are
//! sent unconnected (Send RR Data) to the Connection Manager (class 0x06,
//! instance 1) and target the Message Router (`20 02 24 01 2C 01`).
//!
//! # Forward Open Request Data
//!
//! | Field | Size | Value |
//! |-------|------|-------|
//! | Priority/tick time | 1 | 0x0A |
//! | Timeout ticks | 1 | 0xF9 |
//! | O→T connection ID | 4 | 0, chosen by the target |
//! | T→O connection ID | 4 | Proposed by this client |
//! | Connection serial | 2 | Non-zero, per connection |
//! | Originator vendor | 2 | [`OriginatorIdentity::vendor_id`] |
//! | Originator serial | 4 | [`OriginatorIdentity::serial_number`] |
//! | Timeout multiplier | 1 | 0x07 |
//! | Reserved | 3 | 0 |
//! | O→T RPI | 4 | 500 000 µs |
//! | O→T parameters | 2 | 0x43F4 |
//! | T→O RPI | 4 | 500 000 µs |
//! | T→O parameters | 2 | 0x43F4 |
//! | Transport trigger | 1 | 0xA3 |
//! | Connection path | var | size in words + path |

use std::time::{SystemTime, UNIX_EPOCH};

use crate::cip::{class, service, EPath, MessageRouterRequest};
use crate::config::OriginatorIdentity;
use crate::error::{EipError, Result};

/// Priority/tick time byte for connection management requests.
pub const CONNECTION_TICK: u8 = 0x0A;
/// Timeout ticks for connection management requests.
pub const CONNECTION_TIMEOUT_TICKS: u8 = 0xF9;
/// Connection timeout multiplier (RPI × 512).
pub const TIMEOUT_MULTIPLIER: u8 = 0x07;
/// Requested packet interval in microseconds.
pub const DEFAULT_RPI_US: u32 = 500_000;
/// Network connection parameters: owner exclusive, point-to-point, low
/// priority, variable size, 500 byte connection size.
pub const CONNECTION_PARAMETERS: u16 = 0x43F4;
/// Transport class 3, application trigger, server.
pub const TRANSPORT_TRIGGER: u8 = 0xA3;

/// Size of a successful Forward Open reply body.
const FORWARD_OPEN_REPLY_SIZE: usize = 26;

fn connection_manager() -> EPath {
    EPath::new().class(class::CONNECTION_MANAGER).instance(0x01)
}

/// Connection path to the Message Router, connection point 1.
pub fn message_router_path() -> EPath {
    EPath::new()
        .class(class::MESSAGE_ROUTER)
        .instance(0x01)
        .connection_point(0x01)
}

/// Generates a non-zero connection serial number from the system clock.
pub fn generate_connection_serial() -> u16 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() ^ (d.as_secs() as u32))
        .unwrap_or(0x1971);
    match (nanos ^ (nanos >> 16)) as u16 {
        0 => 0x1971,
        serial => serial,
    }
}

/// Forward Open (0x54) request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardOpenRequest {
    /// T→O connection ID proposed by this client.
    pub t_to_o_connection_id: u32,
    /// Connection serial number.
    pub connection_serial: u16,
    /// Originator vendor and serial.
    pub originator: OriginatorIdentity,
    /// Requested packet interval for both directions, in microseconds.
    pub rpi_us: u32,
    /// Network connection parameters for both directions.
    pub connection_parameters: u16,
}

impl ForwardOpenRequest {
    /// Creates a request with the default timing and connection parameters.
    pub fn new(
        t_to_o_connection_id: u32,
        connection_serial: u16,
        originator: OriginatorIdentity,
    ) -> Self {
        Self {
            t_to_o_connection_id,
            connection_serial,
            originator,
            rpi_us: DEFAULT_RPI_US,
            connection_parameters: CONNECTION_PARAMETERS,
        }
    }

    /// Builds the Message Router request.
    pub fn to_request(&self) -> Result<MessageRouterRequest> {
        let path = message_router_path();
        let mut data = Vec::with_capacity(36 + path.as_bytes().len());
        data.push(CONNECTION_TICK);
        data.push(CONNECTION_TIMEOUT_TICKS);
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&self.t_to_o_connection_id.to_le_bytes());
        data.extend_from_slice(&self.connection_serial.to_le_bytes());
        data.extend_from_slice(&self.originator.vendor_id.to_le_bytes());
        data.extend_from_slice(&self.originator.serial_number.to_le_bytes());
        data.push(TIMEOUT_MULTIPLIER);
        data.extend_from_slice(&[0x00; 3]);
        data.extend_from_slice(&self.rpi_us.to_le_bytes());
        data.extend_from_slice(&self.connection_parameters.to_le_bytes());
        data.extend_from_slice(&self.rpi_us.to_le_bytes());
        data.extend_from_slice(&self.connection_parameters.to_le_bytes());
        data.push(TRANSPORT_TRIGGER);
        data.push(path.word_len()?);
        data.extend_from_slice(path.as_bytes());

        Ok(MessageRouterRequest::new(
            service::FORWARD_OPEN,
            connection_manager(),
            data,
        ))
    }

    /// Serializes the request to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.to_request()?.to_bytes()
    }
}

/// Successful Forward Open reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardOpenReply {
    /// Connection ID this client puts on requests (O→T).
    pub o_to_t_connection_id: u32,
    /// Connection ID the target puts on replies (T→O).
    pub t_to_o_connection_id: u32,
    /// Echoed connection serial number.
    pub connection_serial: u16,
    /// Echoed originator vendor ID.
    pub originator_vendor_id: u16,
    /// Echoed originator serial number.
    pub originator_serial: u32,
    /// Actual O→T packet interval, microseconds.
    pub o_to_t_api_us: u32,
    /// Actual T→O packet interval, microseconds.
    pub t_to_o_api_us: u32,
}

impl ForwardOpenReply {
    /// Parses the reply data of a successful Forward Open.
    ///
    /// # Errors
    ///
    /// Returns `EipError::MalformedReply` if the data is shorter than the
    /// fixed reply layout.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < FORWARD_OPEN_REPLY_SIZE {
            return Err(EipError::malformed(format!(
                "Forward Open reply too short: expected {} bytes, got {}",
                FORWARD_OPEN_REPLY_SIZE,
                data.len()
            )));
        }
        let u32_at = |i: usize| u32::from_le_bytes([data[i], data[i + 1], data[i + 2], data[i + 3]]);
        let u16_at = |i: usize| u16::from_le_bytes([data[i], data[i + 1]]);

        Ok(Self {
            o_to_t_connection_id: u32_at(0),
            t_to_o_connection_id: u32_at(4),
            connection_serial: u16_at(8),
            originator_vendor_id: u16_at(10),
            originator_serial: u32_at(12),
            o_to_t_api_us: u32_at(16),
            t_to_o_api_us: u32_at(20),
        })
    }

    /// Checks that the reply echoes the identity of `request`.
    ///
    /// # Errors
    ///
    /// Returns `EipError::MalformedReply` on any mismatch.
    pub fn check_matches(&self, request: &ForwardOpenRequest) -> Result<()> {
        if self.connection_serial != request.connection_serial
            || self.originator_vendor_id != request.originator.vendor_id
            || self.originator_serial != request.originator.serial_number
        {
            return Err(EipError::malformed(format!(
                "Forward Open reply identity (serial 0x{:04X}, vendor 0x{:04X}, originator 0x{:08X}) \
                 does not match request",
                self.connection_serial, self.originator_vendor_id, self.originator_serial
            )));
        }
        Ok(())
    }
}

/// Forward Close (0x4E) request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardCloseRequest {
    /// Serial number of the connection to close.
    pub connection_serial: u16,
    /// Originator vendor and serial used when the connection was opened.
    pub originator: OriginatorIdentity,
}

impl ForwardCloseRequest {
    /// Creates a new request.
    pub fn new(connection_serial: u16, originator: OriginatorIdentity) -> Self {
        Self {
            connection_serial,
            originator,
        }
    }

    /// Builds the Message Router request.
    pub fn to_request(&self) -> Result<MessageRouterRequest> {
        let path = message_router_path();
        let mut data = Vec::with_capacity(12 + path.as_bytes().len());
        data.push(CONNECTION_TICK);
        data.push(CONNECTION_TIMEOUT_TICKS);
        data.extend_from_slice(&self.connection_serial.to_le_bytes());
        data.extend_from_slice(&self.originator.vendor_id.to_le_bytes());
        data.extend_from_slice(&self.originator.serial_number.to_le_bytes());
        data.push(path.word_len()?);
        data.push(0x00);
        data.extend_from_slice(path.as_bytes());

        Ok(MessageRouterRequest::new(
            service::FORWARD_CLOSE,
            connection_manager(),
            data,
        ))
    }

    /// Serializes the request to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.to_request()?.to_bytes()
    }
}
