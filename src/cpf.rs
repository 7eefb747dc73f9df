//! Common Packet Format (CPF) item lists.
//!
//! Send RR Data and Send Unit Data carry their CIP payload in a CPF
//! structure:
//!
//! | Field | Size | Description |
//! |-------|------|-------------|
//! | Interface handle | 4 | Always 0 for CIP |
//! | Timeout | 2 | Always 0 for this crate |
//! | Item count | 2 | Number of items that follow |
//! | Items | var | (type, length, data) triples |
//!
//! Unconnected messages use a Null Address item followed by an Unconnected
//! Data item. Connected messages use a Connected Address item carrying the
//! connection ID followed by a Connected Data item whose payload starts
//! with a 2-byte sequence count.

use crate::error::{EipError, Result};

/// Null Address item type.
pub const ITEM_NULL_ADDRESS: u16 = 0x0000;
/// Connected Address item type.
pub const ITEM_CONNECTED_ADDRESS: u16 = 0x00A1;
/// Connected Data item type.
pub const ITEM_CONNECTED_DATA: u16 = 0x00B1;
/// Unconnected Data item type.
pub const ITEM_UNCONNECTED_DATA: u16 = 0x00B2;

/// Size of the interface handle, timeout and item count prefix.
const CPF_PREFIX_SIZE: usize = 8;

/// A single CPF item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpfItem {
    /// Item type ID.
    pub type_id: u16,
    /// Item data.
    pub data: Vec<u8>,
}

impl CpfItem {
    /// Creates a Null Address item.
    pub fn null_address() -> Self {
        Self {
            type_id: ITEM_NULL_ADDRESS,
            data: Vec::new(),
        }
    }

    /// Creates a Connected Address item carrying a connection ID.
    pub fn connected_address(connection_id: u32) -> Self {
        Self {
            type_id: ITEM_CONNECTED_ADDRESS,
            data: connection_id.to_le_bytes().to_vec(),
        }
    }

    /// Creates an Unconnected Data item.
    pub fn unconnected_data(cip: &[u8]) -> Self {
        Self {
            type_id: ITEM_UNCONNECTED_DATA,
            data: cip.to_vec(),
        }
    }

    /// Creates a Connected Data item prefixed with the sequence count.
    pub fn connected_data(sequence: u16, cip: &[u8]) -> Self {
        let mut data = Vec::with_capacity(2 + cip.len());
        data.extend_from_slice(&sequence.to_le_bytes());
        data.extend_from_slice(cip);
        Self {
            type_id: ITEM_CONNECTED_DATA,
            data,
        }
    }
}

/// A CPF packet as carried by Send RR Data and Send Unit Data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonPacket {
    /// Interface handle (0 for CIP).
    pub interface_handle: u32,
    /// Timeout in seconds (0 = none).
    pub timeout: u16,
    /// Item list.
    pub items: Vec<CpfItem>,
}

impl CommonPacket {
    /// Builds an unconnected packet: Null Address + Unconnected Data.
    ///
    /// # Example
    ///
    /// ```
    /// use ab_eip::CommonPacket;
    ///
    /// let packet = CommonPacket::unconnected(&[0x4C, 0x00]);
    /// assert_eq!(
    ///     packet.to_bytes(),
    ///     vec![0, 0, 0, 0, 0, 0, 2, 0, 0, 0, 0, 0, 0xB2, 0, 2, 0, 0x4C, 0x00]
    /// );
    /// ```
    pub fn unconnected(cip: &[u8]) -> Self {
        Self {
            interface_handle: 0,
            timeout: 0,
            items: vec![CpfItem::null_address(), CpfItem::unconnected_data(cip)],
        }
    }

    /// Builds a connected packet: Connected Address + Connected Data.
    pub fn connected(connection_id: u32, sequence: u16, cip: &[u8]) -> Self {
        Self {
            interface_handle: 0,
            timeout: 0,
            items: vec![
                CpfItem::connected_address(connection_id),
                CpfItem::connected_data(sequence, cip),
            ],
        }
    }

    /// Serializes the packet to bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let items_len: usize = self.items.iter().map(|item| 4 + item.data.len()).sum();
        let mut bytes = Vec::with_capacity(CPF_PREFIX_SIZE + items_len);
        bytes.extend_from_slice(&self.interface_handle.to_le_bytes());
        bytes.extend_from_slice(&self.timeout.to_le_bytes());
        bytes.extend_from_slice(&(self.items.len() as u16).to_le_bytes());
        for item in &self.items {
            bytes.extend_from_slice(&item.type_id.to_le_bytes());
            bytes.extend_from_slice(&(item.data.len() as u16).to_le_bytes());
            bytes.extend_from_slice(&item.data);
        }
        bytes
    }

    /// Parses a packet from bytes.
    ///
    /// # Errors
    ///
    /// Returns `EipError::MalformedReply` if the prefix or any item is
    /// truncated.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < CPF_PREFIX_SIZE {
            return Err(EipError::malformed(format!(
                "CPF packet too short: expected at least {} bytes, got {}",
                CPF_PREFIX_SIZE,
                data.len()
            )));
        }

        let interface_handle = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
        let timeout = u16::from_le_bytes([data[4], data[5]]);
        let item_count = u16::from_le_bytes([data[6], data[7]]);

        let mut items = Vec::with_capacity(usize::from(item_count));
        let mut pos = CPF_PREFIX_SIZE;
        for index in 0..item_count {
            if pos + 4 > data.len() {
                return Err(EipError::malformed(format!(
                    "CPF item {} header truncated",
                    index
                )));
            }
            let type_id = u16::from_le_bytes([data[pos], data[pos + 1]]);
            let length = usize::from(u16::from_le_bytes([data[pos + 2], data[pos + 3]]));
            pos += 4;

            if pos + length > data.len() {
                return Err(EipError::malformed(format!(
                    "CPF item {} (type 0x{:04X}) declares {} bytes, {} available",
                    index,
                    type_id,
                    length,
                    data.len() - pos
                )));
            }
            items.push(CpfItem {
                type_id,
                data: data[pos..pos + length].to_vec(),
            });
            pos += length;
        }

        Ok(Self {
            interface_handle,
            timeout,
            items,
        })
    }

    /// Returns the first item of the given type.
    pub fn item(&self, type_id: u16) -> Option<&CpfItem> {
        self.items.iter().find(|item| item.type_id == type_id)
    }

    /// Returns the payload of the Unconnected Data item.
    ///
    /// # Errors
    ///
    /// Returns `EipError::MalformedReply` if the packet has no such item.
    pub fn unconnected_payload(&self) -> Result<&[u8]> {
        self.item(ITEM_UNCONNECTED_DATA)
            .map(|item| item.data.as_slice())
            .ok_or_else(|| EipError::malformed("no Unconnected Data item (0x00B2) in reply"))
    }

    /// Returns the connection ID, sequence count and CIP payload of a
    /// connected packet.
    ///
    /// # Errors
    ///
    /// Returns `EipError::MalformedReply` if either connected item is
    /// missing or too short.
    pub fn connected_payload(&self) -> Result<(u32, u16, &[u8])> {
        let address = self
            .item(ITEM_CONNECTED_ADDRESS)
            .ok_or_else(|| EipError::malformed("no Connected Address item (0x00A1) in reply"))?;
        if address.data.len() != 4 {
            return Err(EipError::malformed(format!(
                "Connected Address item has {} bytes, expected 4",
                address.data.len()
            )));
        }
        let connection_id = u32::from_le_bytes([
            address.data[0],
            address.data[1],
            address.data[2],
            address.data[3],
        ]);

        let data = self
            .item(ITEM_CONNECTED_DATA)
            .ok_or_else(|| EipError::malformed("no Connected Data item (0x00B1) in reply"))?;
        if data.data.len() < 2 {
            return Err(EipError::malformed(
                "Connected Data item too short for sequence count",
            ));
        }
        let sequence = u16::from_le_bytes([data.data[0], data.data[1]]);

        Ok((connection_id, sequence, &data.data[2..]))
    }
}
