//! EtherNet/IP encapsulation header and packet framing.
//!
//! Every message exchanged over the TCP connection is wrapped in a 24-byte
//! encapsulation header followed by command-specific data.
//!
//! # Encapsulation Header Structure
//!
//! All fields are little-endian.
//!
//! | Offset | Size | Field | Description |
//! |--------|------|-------|-------------|
//! | 0 | 2 | Command | Encapsulation command code |
//! | 2 | 2 | Length | Length of the data following the header |
//! | 4 | 4 | Session handle | 0 for Register Session, PLC-assigned afterwards |
//! | 8 | 4 | Status | 0 on requests, error code on replies |
//! | 12 | 8 | Sender context | Opaque token echoed by the PLC |
//! | 20 | 4 | Options | Always 0 |
//!
//! # Example
//!
//! ```
//! use ab_eip::{EncapsulationCommand, EncapsulationPacket};
//!
//! let packet = EncapsulationPacket::register_session([0; 8]);
//! let bytes = packet.to_bytes();
//! assert_eq!(bytes.len(), 28);
//! assert_eq!(packet.header.command, EncapsulationCommand::RegisterSession.code());
//! ```

use crate::error::{EipError, Result};

/// Encapsulation header size in bytes.
pub const ENCAPSULATION_HEADER_SIZE: usize = 24;

/// EtherNet/IP encapsulation protocol version sent in Register Session.
pub const PROTOCOL_VERSION: u16 = 1;

/// Encapsulation commands used by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncapsulationCommand {
    /// Register Session (0x0065).
    RegisterSession,
    /// Unregister Session (0x0066).
    UnregisterSession,
    /// Send RR Data (0x006F), unconnected messaging.
    SendRRData,
    /// Send Unit Data (0x0070), connected messaging.
    SendUnitData,
}

impl EncapsulationCommand {
    /// Returns the wire code of this command.
    pub fn code(self) -> u16 {
        match self {
            EncapsulationCommand::RegisterSession => 0x0065,
            EncapsulationCommand::UnregisterSession => 0x0066,
            EncapsulationCommand::SendRRData => 0x006F,
            EncapsulationCommand::SendUnitData => 0x0070,
        }
    }

    /// Looks up a command by its wire code.
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0x0065 => Some(EncapsulationCommand::RegisterSession),
            0x0066 => Some(EncapsulationCommand::UnregisterSession),
            0x006F => Some(EncapsulationCommand::SendRRData),
            0x0070 => Some(EncapsulationCommand::SendUnitData),
            _ => None,
        }
    }
}

/// Encapsulation header (24 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncapsulationHeader {
    /// Command code.
    pub command: u16,
    /// Number of data bytes following the header.
    pub length: u16,
    /// Session handle.
    pub session_handle: u32,
    /// Status (0 on requests).
    pub status: u32,
    /// Sender context, echoed unchanged by the PLC.
    pub sender_context: [u8; 8],
    /// Options (always 0).
    pub options: u32,
}

impl EncapsulationHeader {
    /// Creates a request header.
    pub fn new(
        command: EncapsulationCommand,
        length: u16,
        session_handle: u32,
        sender_context: [u8; 8],
    ) -> Self {
        Self {
            command: command.code(),
            length,
            session_handle,
            status: 0,
            sender_context,
            options: 0,
        }
    }

    /// Serializes the header to bytes.
    pub fn to_bytes(self) -> [u8; ENCAPSULATION_HEADER_SIZE] {
        let mut bytes = [0u8; ENCAPSULATION_HEADER_SIZE];
        bytes[0..2].copy_from_slice(&self.command.to_le_bytes());
        bytes[2..4].copy_from_slice(&self.length.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.session_handle.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.status.to_le_bytes());
        bytes[12..20].copy_from_slice(&self.sender_context);
        bytes[20..24].copy_from_slice(&self.options.to_le_bytes());
        bytes
    }

    /// Parses a header from bytes.
    ///
    /// # Errors
    ///
    /// Returns `EipError::MalformedReply` if the slice is too short.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < ENCAPSULATION_HEADER_SIZE {
            return Err(EipError::malformed(format!(
                "encapsulation header too short: expected {} bytes, got {}",
                ENCAPSULATION_HEADER_SIZE,
                data.len()
            )));
        }

        let mut sender_context = [0u8; 8];
        sender_context.copy_from_slice(&data[12..20]);

        Ok(Self {
            command: u16::from_le_bytes([data[0], data[1]]),
            length: u16::from_le_bytes([data[2], data[3]]),
            session_handle: u32::from_le_bytes([data[4], data[5], data[6], data[7]]),
            status: u32::from_le_bytes([data[8], data[9], data[10], data[11]]),
            sender_context,
            options: u32::from_le_bytes([data[20], data[21], data[22], data[23]]),
        })
    }
}

/// A complete encapsulation packet: header plus command data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncapsulationPacket {
    /// Packet header.
    pub header: EncapsulationHeader,
    /// Command-specific data.
    pub data: Vec<u8>,
}

impl EncapsulationPacket {
    /// Creates a request packet, filling in the length field from `data`.
    ///
    /// # Errors
    ///
    /// Returns `EipError::InvalidParameter` if the data does not fit the
    /// 16-bit length field.
    pub fn new(
        command: EncapsulationCommand,
        session_handle: u32,
        sender_context: [u8; 8],
        data: Vec<u8>,
    ) -> Result<Self> {
        let length = u16::try_from(data.len()).map_err(|_| {
            EipError::invalid_parameter("data", "encapsulated data exceeds 65535 bytes")
        })?;
        Ok(Self {
            header: EncapsulationHeader::new(command, length, session_handle, sender_context),
            data,
        })
    }

    /// Builds a Register Session request (protocol version 1, no options).
    pub fn register_session(sender_context: [u8; 8]) -> Self {
        let mut data = Vec::with_capacity(4);
        data.extend_from_slice(&PROTOCOL_VERSION.to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes());
        Self {
            header: EncapsulationHeader::new(
                EncapsulationCommand::RegisterSession,
                4,
                0,
                sender_context,
            ),
            data,
        }
    }

    /// Builds an Unregister Session request. The PLC sends no reply.
    pub fn unregister_session(session_handle: u32, sender_context: [u8; 8]) -> Self {
        Self {
            header: EncapsulationHeader::new(
                EncapsulationCommand::UnregisterSession,
                0,
                session_handle,
                sender_context,
            ),
            data: Vec::new(),
        }
    }

    /// Serializes the packet to bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(ENCAPSULATION_HEADER_SIZE + self.data.len());
        bytes.extend_from_slice(&self.header.to_bytes());
        bytes.extend_from_slice(&self.data);
        bytes
    }

    /// Parses a packet from bytes.
    ///
    /// # Errors
    ///
    /// Returns `EipError::MalformedReply` if the declared length does not
    /// match the bytes available, or `EipError::EncapsulationStatus` if the
    /// status field is non-zero.
    ///
    /// # Example
    ///
    /// ```
    /// use ab_eip::EncapsulationPacket;
    ///
    /// let mut bytes = vec![0x65, 0x00, 0x04, 0x00, 0x01, 0x02, 0x03, 0x04];
    /// bytes.extend_from_slice(&[0u8; 16]);
    /// bytes.extend_from_slice(&[0x01, 0x00, 0x00, 0x00]);
    ///
    /// let packet = EncapsulationPacket::from_bytes(&bytes).unwrap();
    /// assert_eq!(packet.header.session_handle, 0x04030201);
    /// ```
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let header = EncapsulationHeader::from_bytes(data)?;
        let available = data.len() - ENCAPSULATION_HEADER_SIZE;
        if usize::from(header.length) != available {
            return Err(EipError::malformed(format!(
                "encapsulation length mismatch: header declares {} bytes, {} available",
                header.length, available
            )));
        }
        if header.status != 0 {
            return Err(EipError::EncapsulationStatus {
                command: header.command,
                status: header.status,
            });
        }

        Ok(Self {
            header,
            data: data[ENCAPSULATION_HEADER_SIZE..].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_codes() {
        assert_eq!(EncapsulationCommand::RegisterSession.code(), 0x0065);
        assert_eq!(EncapsulationCommand::UnregisterSession.code(), 0x0066);
        assert_eq!(EncapsulationCommand::SendRRData.code(), 0x006F);
        assert_eq!(EncapsulationCommand::SendUnitData.code(), 0x0070);
        assert_eq!(
            EncapsulationCommand::from_code(0x0070),
            Some(EncapsulationCommand::SendUnitData)
        );
        assert_eq!(EncapsulationCommand::from_code(0x0063), None);
    }

    #[test]
    fn test_register_session_bytes() {
        let packet = EncapsulationPacket::register_session(*b"_pycomm_");
        assert_eq!(
            packet.to_bytes(),
            hex::decode("650004000000000000000000\
                 5f7079636f6d6d5f\
                 00000000\
                 01000000")
            .unwrap()
        );
    }

    #[test]
    fn test_unregister_session_bytes() {
        let packet = EncapsulationPacket::unregister_session(0x11223344, [0; 8]);
        let bytes = packet.to_bytes();
        assert_eq!(bytes.len(), 24);
        assert_eq!(&bytes[0..4], &[0x66, 0x00, 0x00, 0x00]);
        assert_eq!(&bytes[4..8], &[0x44, 0x33, 0x22, 0x11]);
    }

    #[test]
    fn test_header_roundtrip() {
        let header = EncapsulationHeader::new(
            EncapsulationCommand::SendUnitData,
            42,
            0xDEADBEEF,
            [1, 2, 3, 4, 5, 6, 7, 8],
        );
        let parsed = EncapsulationHeader::from_bytes(&header.to_bytes()).unwrap();
        assert_eq!(header, parsed);
    }

    #[test]
    fn test_header_too_short() {
        assert!(matches!(
            EncapsulationHeader::from_bytes(&[0x65, 0x00]),
            Err(EipError::MalformedReply { .. })
        ));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let mut bytes = EncapsulationPacket::register_session([0; 8]).to_bytes();
        bytes.pop();
        assert!(matches!(
            EncapsulationPacket::from_bytes(&bytes),
            Err(EipError::MalformedReply { .. })
        ));
    }

    #[test]
    fn test_non_zero_status_surfaces_raw_value() {
        let mut header =
            EncapsulationHeader::new(EncapsulationCommand::SendRRData, 0, 0x10, [0; 8]);
        header.status = 0x0000_0064;
        let err = EncapsulationPacket::from_bytes(&header.to_bytes()).unwrap_err();
        match err {
            EipError::EncapsulationStatus { command, status } => {
                assert_eq!(command, 0x006F);
                assert_eq!(status, 0x64);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_new_sets_length() {
        let packet = EncapsulationPacket::new(
            EncapsulationCommand::SendRRData,
            7,
            [0; 8],
            vec![0xAA; 10],
        )
        .unwrap();
        assert_eq!(packet.header.length, 10);
        assert_eq!(packet.to_bytes().len(), 34);
    }
}
