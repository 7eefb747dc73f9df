//! Error types for EtherNet/IP, CIP and PCCC communication.

use std::io;
use thiserror::Error;

/// Result type alias for EtherNet/IP operations.
pub type Result<T> = std::result::Result<T, EipError>;

/// Errors that can occur while talking to an Allen-Bradley controller.
///
/// Every variant is recoverable at the call boundary: a failed `read` or
/// `write` leaves the session usable for the next call. Only failures during
/// the connection handshake leave the session disconnected.
#[derive(Debug, Error)]
pub enum EipError {
    /// No reply arrived before the transport timeout elapsed.
    #[error("Communication timeout")]
    Timeout,

    /// I/O error on the underlying byte stream.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Non-zero status in the outer encapsulation frame.
    #[error("Encapsulation error: command 0x{command:04X}, status 0x{status:08X}")]
    EncapsulationStatus {
        /// Encapsulation command of the failing reply.
        command: u16,
        /// Raw status value from the reply header.
        status: u32,
    },

    /// Non-zero general status in a CIP reply.
    #[error(
        "CIP error: service 0x{service:02X}, general status 0x{general:02X} ({}), extended {extended:04X?}",
        cip_status_description(*.general)
    )]
    CipStatus {
        /// Service code of the request that failed (without the reply bit).
        service: u8,
        /// General status code.
        general: u8,
        /// Extended status words, verbatim.
        extended: Vec<u16>,
    },

    /// Non-zero status in a PCCC reply.
    #[error("PCCC error: status 0x{status:02X} ({})", pccc_status_description(*.status))]
    PcccStatus {
        /// PCCC STS byte.
        status: u8,
        /// EXT STS byte, present when `status` is 0xF0.
        extended: Option<u8>,
    },

    /// Reply whose length or structure does not match the protocol.
    #[error("Malformed reply: {reason}")]
    MalformedReply {
        /// Description of the structural problem.
        reason: String,
    },

    /// File type, data type or access mode not implemented for the operation.
    #[error("Unsupported address: {reason}")]
    UnsupportedAddress {
        /// Description of the unsupported combination.
        reason: String,
    },

    /// Invalid parameter provided by the caller.
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// Name of the invalid parameter.
        parameter: String,
        /// Description of why the parameter is invalid.
        reason: String,
    },

    /// Value cannot be represented by the target data type.
    #[error("Value {value} out of range for {data_type}")]
    ValueOutOfRange {
        /// The rejected value, rendered as text.
        value: String,
        /// Name of the target data type.
        data_type: String,
    },

    /// Operation attempted before `connect()` succeeded or after `disconnect()`.
    #[error("Not connected to PLC")]
    NotConnected,
}

impl EipError {
    /// Creates a new `MalformedReply` error.
    ///
    /// # Example
    ///
    /// ```
    /// use ab_eip::EipError;
    ///
    /// let err = EipError::malformed("reply too short");
    /// assert_eq!(err.to_string(), "Malformed reply: reply too short");
    /// ```
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedReply {
            reason: reason.into(),
        }
    }

    /// Creates a new `UnsupportedAddress` error.
    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self::UnsupportedAddress {
            reason: reason.into(),
        }
    }

    /// Creates a new `InvalidParameter` error.
    ///
    /// # Example
    ///
    /// ```
    /// use ab_eip::EipError;
    ///
    /// let err = EipError::invalid_parameter("bit", "must be 0-15");
    /// ```
    pub fn invalid_parameter(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new `CipStatus` error.
    pub fn cip_status(service: u8, general: u8, extended: Vec<u16>) -> Self {
        Self::CipStatus {
            service,
            general,
            extended,
        }
    }

    /// Creates a new `ValueOutOfRange` error.
    pub fn out_of_range(value: impl std::fmt::Display, data_type: impl std::fmt::Display) -> Self {
        Self::ValueOutOfRange {
            value: value.to_string(),
            data_type: data_type.to_string(),
        }
    }

    /// Returns whether the error is a transport timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns whether the controller itself rejected the request, as
    /// opposed to a network or framing failure on this side.
    ///
    /// # Example
    ///
    /// ```
    /// use ab_eip::EipError;
    ///
    /// assert!(EipError::cip_status(0x4D, 0x0F, vec![]).is_plc_rejection());
    /// assert!(!EipError::Timeout.is_plc_rejection());
    /// ```
    pub fn is_plc_rejection(&self) -> bool {
        matches!(
            self,
            Self::EncapsulationStatus { .. } | Self::CipStatus { .. } | Self::PcccStatus { .. }
        )
    }
}

/// Returns a short description of a CIP general status code.
pub fn cip_status_description(general: u8) -> &'static str {
    match general {
        0x00 => "success",
        0x01 => "connection failure",
        0x02 => "resource unavailable",
        0x03 => "invalid parameter value",
        0x04 => "path segment error",
        0x05 => "path destination unknown",
        0x06 => "partial transfer",
        0x07 => "connection lost",
        0x08 => "service not supported",
        0x09 => "invalid attribute value",
        0x0A => "attribute list error",
        0x0B => "already in requested mode/state",
        0x0C => "object state conflict",
        0x0D => "object already exists",
        0x0E => "attribute not settable",
        0x0F => "privilege violation",
        0x10 => "device state conflict",
        0x11 => "reply data too large",
        0x13 => "not enough data",
        0x14 => "attribute not supported",
        0x15 => "too much data",
        0x1E => "embedded service error",
        0x26 => "invalid path size",
        0xFF => "general error",
        _ => "unknown status",
    }
}

/// Returns a short description of a PCCC STS code.
///
/// Only the high nibble carries remote-node errors; the low nibble carries
/// local ones.
pub fn pccc_status_description(status: u8) -> &'static str {
    match status {
        0x00 => "success",
        0x01 => "destination node out of buffer space",
        0x02 => "remote node does not acknowledge",
        0x03 => "duplicate token holder",
        0x04 => "local port disconnected",
        0x10 => "illegal command or format",
        0x20 => "host has a problem and will not communicate",
        0x30 => "remote node host is missing, disconnected or shut down",
        0x40 => "host could not complete function due to hardware fault",
        0x50 => "addressing problem or memory protect rungs",
        0x60 => "function not allowed due to command protection selection",
        0x70 => "processor is in program mode",
        0x80 => "compatibility mode file missing or communication zone problem",
        0x90 => "remote node cannot buffer command",
        0xA0 | 0xC0 => "wait ACK (1775-KA buffer full)",
        0xB0 => "remote node problem due to download",
        0xF0 => "error code in extended status byte",
        _ => "unknown status",
    }
}
