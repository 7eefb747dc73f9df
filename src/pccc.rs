//! PCCC addressing, commands and replies for SLC 500 / MicroLogix.
//!
//! PCCC commands travel as the data of a CIP Execute PCCC request
//! (service 0x4B, class 0x67, instance 1):
//!
//! | Field | Size | Description |
//! |-------|------|-------------|
//! | Requestor ID length | 1 | 7 |
//! | Vendor ID | 2 | Originator vendor |
//! | Serial number | 4 | Originator serial |
//! | CMD | 1 | 0x0F |
//! | STS | 1 | 0 on requests |
//! | TNS | 2 | Transaction sequence number |
//! | FNC | 1 | 0xA2 typed read, 0xAB typed write |
//! | Parameters | var | Byte size, address fields, data |
//!
//! The reply echoes the requestor ID, then carries CMD | 0x40, STS, TNS,
//! an extended status byte when STS is 0xF0, and the data.
//!
//! # Address Fields
//!
//! File number, file type, element and sub-element are encoded in order.
//! Numeric fields below 255 take one byte; larger ones take 0xFF followed
//! by a little-endian `u16`.
//!
//! # Example
//!
//! ```
//! use ab_eip::{FileType, PcccAddress, TypedReadCommand};
//!
//! let address: PcccAddress = "N7:10".parse().unwrap();
//! assert_eq!(address.file_type, FileType::Integer);
//!
//! let cmd = TypedReadCommand::new(0x0001, &address).unwrap();
//! assert_eq!(cmd.to_bytes(), vec![0x0F, 0x00, 0x01, 0x00, 0xA2, 0x02, 0x07, 0x89, 0x0A, 0x00]);
//! ```

use std::str::FromStr;

use crate::cip::{class, service, EPath, MessageRouterRequest};
use crate::config::OriginatorIdentity;
use crate::error::{EipError, Result};
use crate::file_type::FileType;
use crate::utils::get_bit;

/// PCCC command byte for typed logical commands.
pub const CMD_TYPED: u8 = 0x0F;
/// Reply flag OR'ed into the command byte of every reply.
pub const CMD_REPLY_FLAG: u8 = 0x40;
/// Protected Typed Logical Read with three address fields.
pub const FNC_TYPED_READ: u8 = 0xA2;
/// Protected Typed Logical Write with mask.
pub const FNC_TYPED_WRITE: u8 = 0xAB;
/// STS value announcing an extended status byte.
pub const STS_EXTENDED: u8 = 0xF0;
/// Length of the requestor ID: length byte, vendor and serial.
pub const REQUESTOR_ID_LEN: u8 = 7;

/// Appends a PCCC address field, one byte below 255 and three otherwise.
pub fn encode_field(value: u16, out: &mut Vec<u8>) {
    match u8::try_from(value) {
        Ok(v) if v < 0xFF => out.push(v),
        _ => {
            out.push(0xFF);
            out.extend_from_slice(&value.to_le_bytes());
        }
    }
}

/// A file-based SLC data table address.
///
/// # Example
///
/// ```
/// use ab_eip::{FileType, PcccAddress};
///
/// let bit = PcccAddress::new(FileType::Binary, 0).with_bit(5).unwrap();
/// assert_eq!(bit.to_string(), "B3:0/5");
///
/// let parsed: PcccAddress = "N10:3".parse().unwrap();
/// assert_eq!(parsed.file_number, 10);
/// assert_eq!(parsed.element, 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PcccAddress {
    /// File type.
    pub file_type: FileType,
    /// File number.
    pub file_number: u16,
    /// Element index within the file.
    pub element: u16,
    /// Bit index within a 16-bit element, for N and B files.
    pub bit: Option<u8>,
    /// Number of consecutive elements.
    pub count: u16,
}

impl PcccAddress {
    /// Creates a whole-element address in the type's default file.
    pub fn new(file_type: FileType, element: u16) -> Self {
        Self {
            file_type,
            file_number: file_type.default_file_number(),
            element,
            bit: None,
            count: 1,
        }
    }

    /// Sets the file number.
    pub fn with_file_number(mut self, file_number: u16) -> Self {
        self.file_number = file_number;
        self
    }

    /// Addresses a single bit of the element.
    ///
    /// # Errors
    ///
    /// Returns `EipError::InvalidParameter` if `bit` is 16 or more, or
    /// `EipError::UnsupportedAddress` if the file type has no bit access.
    pub fn with_bit(mut self, bit: u8) -> Result<Self> {
        if bit >= 16 {
            return Err(EipError::invalid_parameter(
                "bit",
                format!("bit index {} must be 0-15", bit),
            ));
        }
        if !self.file_type.supports_bit_access() {
            return Err(EipError::unsupported(format!(
                "bit access is not supported for {} files",
                self.file_type
            )));
        }
        self.bit = Some(bit);
        Ok(self)
    }

    /// Sets the number of consecutive elements to read.
    ///
    /// # Errors
    ///
    /// Returns `EipError::InvalidParameter` if the count is zero or the total
    /// byte size does not fit the one-byte size field.
    pub fn with_count(mut self, count: u16) -> Result<Self> {
        self.count = count;
        self.byte_size()?;
        Ok(self)
    }

    /// Returns the number of data bytes the address covers.
    ///
    /// # Errors
    ///
    /// Returns `EipError::InvalidParameter` if `count` is zero or the total
    /// does not fit the one-byte size field.
    pub fn byte_size(&self) -> Result<u8> {
        let size = self.file_type.element_size() * usize::from(self.count);
        match u8::try_from(size) {
            Ok(size) if self.count > 0 => Ok(size),
            _ => {
                let max = 255 / self.file_type.element_size();
                Err(EipError::invalid_parameter(
                    "count",
                    format!(
                        "{} element count {} must be 1-{}",
                        self.file_type, self.count, max
                    ),
                ))
            }
        }
    }

    /// Returns the whole-element address containing this bit address.
    pub fn word_address(&self) -> Self {
        Self {
            bit: None,
            count: 1,
            ..*self
        }
    }

    fn encode_fields(&self, out: &mut Vec<u8>) {
        encode_field(self.file_number, out);
        out.push(self.file_type.code());
        encode_field(self.element, out);
        encode_field(0, out);
    }
}

impl FromStr for PcccAddress {
    type Err = EipError;

    /// Parses `N7:0`, `B3:2/5`, `F8:1` style addresses.
    fn from_str(s: &str) -> Result<Self> {
        let (file, rest) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| EipError::invalid_parameter("address", format!("missing ':' in '{}'", s)))?;
        let (file_type, file_number) = FileType::parse_file(file)?;

        let (element, bit) = match rest.split_once('/') {
            Some((element, bit)) => (element, Some(bit)),
            None => (rest, None),
        };
        let element = element.parse::<u16>().map_err(|_| {
            EipError::invalid_parameter("address", format!("invalid element in '{}'", s))
        })?;

        let address = Self::new(file_type, element).with_file_number(file_number);
        match bit {
            Some(bit) => {
                let bit = bit.parse::<u8>().map_err(|_| {
                    EipError::invalid_parameter("address", format!("invalid bit in '{}'", s))
                })?;
                address.with_bit(bit)
            }
            None => Ok(address),
        }
    }
}

impl std::fmt::Display for PcccAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}:{}", self.file_type, self.file_number, self.element)?;
        if let Some(bit) = self.bit {
            write!(f, "/{}", bit)?;
        }
        Ok(())
    }
}

/// Protected Typed Logical Read (FNC 0xA2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedReadCommand {
    tns: u16,
    address: PcccAddress,
    byte_size: u8,
}

impl TypedReadCommand {
    /// Creates a read of `address.count` elements. A bit address reads the
    /// whole word containing the bit.
    ///
    /// # Errors
    ///
    /// Returns `EipError::UnsupportedAddress` for a bit address on a file
    /// type without bit access, and `EipError::InvalidParameter` for a zero
    /// count or one whose byte size exceeds 255.
    pub fn new(tns: u16, address: &PcccAddress) -> Result<Self> {
        if address.bit.is_some() && !address.file_type.supports_bit_access() {
            return Err(EipError::unsupported(format!(
                "bit access is not supported for {} files",
                address.file_type
            )));
        }
        Ok(Self {
            tns,
            address: *address,
            byte_size: address.byte_size()?,
        })
    }

    /// Returns the transaction sequence number.
    pub fn tns(&self) -> u16 {
        self.tns
    }

    /// Serializes the PCCC command (CMD onwards).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(12);
        bytes.extend_from_slice(&[CMD_TYPED, 0x00]);
        bytes.extend_from_slice(&self.tns.to_le_bytes());
        bytes.push(FNC_TYPED_READ);
        bytes.push(self.byte_size);
        self.address.encode_fields(&mut bytes);
        bytes
    }
}

/// Protected Typed Logical Write with mask (FNC 0xAB).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedWriteCommand {
    tns: u16,
    address: PcccAddress,
    word: u16,
}

impl TypedWriteCommand {
    /// Creates a whole-word write.
    ///
    /// # Errors
    ///
    /// Returns `EipError::UnsupportedAddress` for file types other than
    /// Integer and Binary, or for a bit address (bit writes are done by
    /// read-modify-write of the whole word).
    pub fn new(tns: u16, address: &PcccAddress, word: u16) -> Result<Self> {
        if !address.file_type.supports_write() {
            return Err(EipError::unsupported(format!(
                "writing {} files is not supported",
                address.file_type
            )));
        }
        if address.bit.is_some() {
            return Err(EipError::unsupported(
                "typed write addresses whole words; use read-modify-write for bits",
            ));
        }
        Ok(Self {
            tns,
            address: *address,
            word,
        })
    }

    /// Returns the transaction sequence number.
    pub fn tns(&self) -> u16 {
        self.tns
    }

    /// Serializes the PCCC command (CMD onwards).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(16);
        bytes.extend_from_slice(&[CMD_TYPED, 0x00]);
        bytes.extend_from_slice(&self.tns.to_le_bytes());
        bytes.push(FNC_TYPED_WRITE);
        bytes.push(self.address.file_type.element_size() as u8);
        self.address.encode_fields(&mut bytes);
        bytes.extend_from_slice(&0xFFFFu16.to_le_bytes());
        bytes.extend_from_slice(&self.word.to_le_bytes());
        bytes
    }
}

/// Wraps a serialized PCCC command in an Execute PCCC request carrying the
/// requestor ID of `originator`.
pub fn execute_pccc(originator: &OriginatorIdentity, pccc: &[u8]) -> MessageRouterRequest {
    let mut data = Vec::with_capacity(usize::from(REQUESTOR_ID_LEN) + pccc.len());
    data.push(REQUESTOR_ID_LEN);
    data.extend_from_slice(&originator.vendor_id.to_le_bytes());
    data.extend_from_slice(&originator.serial_number.to_le_bytes());
    data.extend_from_slice(pccc);

    let path = EPath::new().class(class::PCCC).instance(0x01);
    MessageRouterRequest::new(service::EXECUTE_PCCC, path, data)
}

/// A parsed PCCC reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcccReply {
    /// Reply command byte.
    pub command: u8,
    /// STS byte.
    pub status: u8,
    /// EXT STS byte, present when `status` is 0xF0.
    pub extended_status: Option<u8>,
    /// Echoed transaction sequence number.
    pub tns: u16,
    /// Reply data.
    pub data: Vec<u8>,
}

impl PcccReply {
    /// Parses the data of a successful Execute PCCC CIP reply.
    ///
    /// # Errors
    ///
    /// Returns `EipError::MalformedReply` if the requestor ID or the PCCC
    /// header is truncated, or the command byte is not a reply.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let id_len = usize::from(*data.first().ok_or_else(|| {
            EipError::malformed("Execute PCCC reply is empty")
        })?);
        if id_len == 0 {
            return Err(EipError::malformed("PCCC requestor ID length is zero"));
        }
        let pccc = data.get(id_len..).ok_or_else(|| {
            EipError::malformed(format!(
                "PCCC requestor ID declares {} bytes, {} available",
                id_len,
                data.len()
            ))
        })?;
        if pccc.len() < 4 {
            return Err(EipError::malformed(format!(
                "PCCC reply header truncated: {} bytes",
                pccc.len()
            )));
        }

        let command = pccc[0];
        if command & CMD_REPLY_FLAG == 0 {
            return Err(EipError::malformed(format!(
                "PCCC command 0x{:02X} is not a reply",
                command
            )));
        }
        let status = pccc[1];
        let tns = u16::from_le_bytes([pccc[2], pccc[3]]);

        let (extended_status, data_start) = if status == STS_EXTENDED {
            let ext = *pccc
                .get(4)
                .ok_or_else(|| EipError::malformed("PCCC extended status byte missing"))?;
            (Some(ext), 5)
        } else {
            (None, 4)
        };

        Ok(Self {
            command,
            status,
            extended_status,
            tns,
            data: pccc[data_start..].to_vec(),
        })
    }

    /// Checks the TNS and status, then returns the reply data.
    ///
    /// # Errors
    ///
    /// Returns `EipError::MalformedReply` on a TNS mismatch and
    /// `EipError::PcccStatus` on a non-zero status.
    pub fn into_data(self, expected_tns: u16) -> Result<Vec<u8>> {
        if self.tns != expected_tns {
            return Err(EipError::malformed(format!(
                "PCCC TNS mismatch: expected 0x{:04X}, got 0x{:04X}",
                expected_tns, self.tns
            )));
        }
        if self.status != 0 {
            return Err(EipError::PcccStatus {
                status: self.status,
                extended: self.extended_status,
            });
        }
        Ok(self.data)
    }
}

/// A value read from an SLC data table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PcccValue {
    /// Integer file element, signed 16-bit.
    Integer(i16),
    /// Binary file element, unsigned 16-bit.
    Binary(u16),
    /// A single bit of an Integer or Binary element.
    Bit(bool),
    /// Float file element.
    Float(f32),
    /// Timer element.
    Timer {
        /// Control word (EN bit 15, TT bit 14, DN bit 13).
        control: u16,
        /// Preset.
        preset: i16,
        /// Accumulator.
        accumulator: i16,
    },
    /// Counter element.
    Counter {
        /// Control word (CU bit 15, CD bit 14, DN bit 13).
        control: u16,
        /// Preset.
        preset: i16,
        /// Accumulator.
        accumulator: i16,
    },
}

impl PcccValue {
    /// Returns the value as an integer for Integer, Binary and Bit values.
    ///
    /// # Example
    ///
    /// ```
    /// use ab_eip::PcccValue;
    ///
    /// assert_eq!(PcccValue::Integer(-50).as_i32(), Some(-50));
    /// assert_eq!(PcccValue::Binary(0xFFFF).as_i32(), Some(65535));
    /// assert_eq!(PcccValue::Bit(true).as_i32(), Some(1));
    /// assert_eq!(PcccValue::Float(1.5).as_i32(), None);
    /// ```
    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            PcccValue::Integer(v) => Some(i32::from(v)),
            PcccValue::Binary(v) => Some(i32::from(v)),
            PcccValue::Bit(b) => Some(i32::from(b)),
            _ => None,
        }
    }

    /// Returns the raw 16-bit word of an Integer or Binary value.
    pub fn as_word(&self) -> Option<u16> {
        match *self {
            PcccValue::Integer(v) => Some(v as u16),
            PcccValue::Binary(v) => Some(v),
            _ => None,
        }
    }

    /// Decodes `count` elements of `file_type` from reply data.
    ///
    /// # Errors
    ///
    /// Returns `EipError::MalformedReply` if fewer bytes than
    /// `count × element size` are present.
    pub fn decode(file_type: FileType, data: &[u8], count: u16) -> Result<Vec<Self>> {
        let size = file_type.element_size();
        let needed = size * usize::from(count);
        if data.len() < needed {
            return Err(EipError::malformed(format!(
                "{} read returned {} bytes, expected {}",
                file_type,
                data.len(),
                needed
            )));
        }

        let word = |chunk: &[u8], i: usize| u16::from_le_bytes([chunk[i], chunk[i + 1]]);
        Ok(data[..needed]
            .chunks_exact(size)
            .map(|chunk| match file_type {
                FileType::Integer => PcccValue::Integer(word(chunk, 0) as i16),
                FileType::Binary => PcccValue::Binary(word(chunk, 0)),
                FileType::Float => {
                    PcccValue::Float(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
                }
                FileType::Timer => PcccValue::Timer {
                    control: word(chunk, 0),
                    preset: word(chunk, 2) as i16,
                    accumulator: word(chunk, 4) as i16,
                },
                FileType::Counter => PcccValue::Counter {
                    control: word(chunk, 0),
                    preset: word(chunk, 2) as i16,
                    accumulator: word(chunk, 4) as i16,
                },
            })
            .collect())
    }

    /// Extracts bit `bit` of the first word in reply data.
    ///
    /// # Errors
    ///
    /// Returns `EipError::MalformedReply` if fewer than two bytes are present.
    pub fn decode_bit(data: &[u8], bit: u8) -> Result<Self> {
        match data {
            [lo, hi, ..] => Ok(PcccValue::Bit(get_bit(u16::from_le_bytes([*lo, *hi]), bit))),
            _ => Err(EipError::malformed(format!(
                "bit read returned {} bytes, expected 2",
                data.len()
            ))),
        }
    }
}

impl std::fmt::Display for PcccValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PcccValue::Integer(v) => write!(f, "{}", v),
            PcccValue::Binary(v) => write!(f, "{:016b}", v),
            PcccValue::Bit(b) => write!(f, "{}", u8::from(*b)),
            PcccValue::Float(v) => write!(f, "{}", v),
            PcccValue::Timer {
                control,
                preset,
                accumulator,
            }
            | PcccValue::Counter {
                control,
                preset,
                accumulator,
            } => write!(
                f,
                "control=0x{:04X} PRE={} ACC={}",
                control, preset, accumulator
            ),
        }
    }
}

/// Converts an integer to the word written to an Integer or Binary element.
///
/// # Errors
///
/// Returns `EipError::ValueOutOfRange` if the value does not fit the file's
/// 16-bit signed (N) or unsigned (B) range, and `EipError::UnsupportedAddress`
/// for other file types.
pub fn encode_word(file_type: FileType, value: i32) -> Result<u16> {
    match file_type {
        FileType::Integer => i16::try_from(value)
            .map(|v| v as u16)
            .map_err(|_| EipError::out_of_range(value, "INT (N file)")),
        FileType::Binary => {
            u16::try_from(value).map_err(|_| EipError::out_of_range(value, "UINT (B file)"))
        }
        other => Err(EipError::unsupported(format!(
            "writing {} files is not supported",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> OriginatorIdentity {
        OriginatorIdentity::new(0x1009, 0x12345678)
    }

    #[test]
    fn test_encode_field() {
        let mut out = Vec::new();
        encode_field(7, &mut out);
        encode_field(254, &mut out);
        encode_field(255, &mut out);
        encode_field(0x0102, &mut out);
        assert_eq!(out, vec![7, 254, 0xFF, 0xFF, 0x00, 0xFF, 0x02, 0x01]);
    }

    #[test]
    fn test_parse_addresses() {
        let n: PcccAddress = "N7:0".parse().unwrap();
        assert_eq!(n, PcccAddress::new(FileType::Integer, 0));

        let b: PcccAddress = "B3:2/15".parse().unwrap();
        assert_eq!(b.file_type, FileType::Binary);
        assert_eq!(b.element, 2);
        assert_eq!(b.bit, Some(15));

        let t: PcccAddress = "T4:1".parse().unwrap();
        assert_eq!(t.file_type, FileType::Timer);
        assert_eq!(t.to_string(), "T4:1");

        assert!("N7".parse::<PcccAddress>().is_err());
        assert!("N7:x".parse::<PcccAddress>().is_err());
        assert!(matches!(
            "B3:0/16".parse::<PcccAddress>(),
            Err(EipError::InvalidParameter { .. })
        ));
        assert!(matches!(
            "F8:0/1".parse::<PcccAddress>(),
            Err(EipError::UnsupportedAddress { .. })
        ));
    }

    #[test]
    fn test_with_count_limits() {
        let n = PcccAddress::new(FileType::Integer, 0);
        assert_eq!(n.with_count(10).unwrap().byte_size().unwrap(), 20);
        assert!(n.with_count(0).is_err());
        assert!(n.with_count(128).is_err());
        let t = PcccAddress::new(FileType::Timer, 0);
        assert_eq!(t.with_count(42).unwrap().byte_size().unwrap(), 252);
        assert!(t.with_count(43).is_err());
    }

    #[test]
    fn test_typed_read_rejects_count_set_directly() {
        let mut address: PcccAddress = "N7:0".parse().unwrap();
        address.count = 200;
        assert!(matches!(
            TypedReadCommand::new(1, &address),
            Err(EipError::InvalidParameter { .. })
        ));

        address.count = 0;
        assert!(matches!(
            TypedReadCommand::new(1, &address),
            Err(EipError::InvalidParameter { .. })
        ));

        address.count = 127;
        let cmd = TypedReadCommand::new(1, &address).unwrap();
        assert_eq!(cmd.to_bytes()[5], 254);
    }

    #[test]
    fn test_typed_read_bytes() {
        let address = PcccAddress::new(FileType::Binary, 300)
            .with_count(2)
            .unwrap();
        let cmd = TypedReadCommand::new(0xBEEF, &address).unwrap();
        assert_eq!(cmd.tns(), 0xBEEF);
        assert_eq!(
            cmd.to_bytes(),
            vec![0x0F, 0x00, 0xEF, 0xBE, 0xA2, 0x04, 0x03, 0x85, 0xFF, 0x2C, 0x01, 0x00]
        );
    }

    #[test]
    fn test_typed_write_bytes() {
        let address = PcccAddress::new(FileType::Integer, 0);
        let cmd = TypedWriteCommand::new(2, &address, (-50i16) as u16).unwrap();
        assert_eq!(
            cmd.to_bytes(),
            vec![
                0x0F, 0x00, 0x02, 0x00, 0xAB, 0x02, 0x07, 0x89, 0x00, 0x00, 0xFF, 0xFF, 0xCE,
                0xFF
            ]
        );
    }

    #[test]
    fn test_typed_write_rejects_unsupported() {
        for file_type in [FileType::Float, FileType::Timer, FileType::Counter] {
            let address = PcccAddress::new(file_type, 0);
            assert!(matches!(
                TypedWriteCommand::new(1, &address, 0),
                Err(EipError::UnsupportedAddress { .. })
            ));
        }
        let bit = PcccAddress::new(FileType::Binary, 0).with_bit(1).unwrap();
        assert!(TypedWriteCommand::new(1, &bit, 0).is_err());
    }

    #[test]
    fn test_execute_pccc_request() {
        let request = execute_pccc(&identity(), &[0x0F, 0x00]);
        assert_eq!(
            request.to_bytes().unwrap(),
            vec![
                0x4B, 0x02, 0x20, 0x67, 0x24, 0x01, // service + PCCC object
                0x07, 0x09, 0x10, 0x78, 0x56, 0x34, 0x12, // requestor ID
                0x0F, 0x00,
            ]
        );
    }

    #[test]
    fn test_reply_parse_and_check() {
        let data = [
            0x07, 0x09, 0x10, 0x78, 0x56, 0x34, 0x12, 0x4F, 0x00, 0x05, 0x00, 0xCE, 0xFF,
        ];
        let reply = PcccReply::from_bytes(&data).unwrap();
        assert_eq!(reply.tns, 5);
        assert_eq!(reply.extended_status, None);
        assert_eq!(reply.clone().into_data(5).unwrap(), vec![0xCE, 0xFF]);
        assert!(matches!(
            reply.into_data(6),
            Err(EipError::MalformedReply { .. })
        ));
    }

    #[test]
    fn test_reply_status_error() {
        let data = [0x07, 0, 0, 0, 0, 0, 0, 0x4F, 0x10, 0x01, 0x00];
        let err = PcccReply::from_bytes(&data)
            .unwrap()
            .into_data(1)
            .unwrap_err();
        assert!(matches!(
            err,
            EipError::PcccStatus {
                status: 0x10,
                extended: None
            }
        ));
    }

    #[test]
    fn test_reply_extended_status() {
        let data = [0x07, 0, 0, 0, 0, 0, 0, 0x4F, 0xF0, 0x01, 0x00, 0x0B];
        let reply = PcccReply::from_bytes(&data).unwrap();
        assert_eq!(reply.extended_status, Some(0x0B));
        assert!(matches!(
            reply.into_data(1),
            Err(EipError::PcccStatus {
                status: 0xF0,
                extended: Some(0x0B)
            })
        ));
    }

    #[test]
    fn test_reply_truncated() {
        assert!(PcccReply::from_bytes(&[]).is_err());
        assert!(PcccReply::from_bytes(&[0x07, 0, 0]).is_err());
        assert!(PcccReply::from_bytes(&[0x07, 0, 0, 0, 0, 0, 0, 0x4F, 0x00]).is_err());
        assert!(PcccReply::from_bytes(&[0x07, 0, 0, 0, 0, 0, 0, 0x0F, 0x00, 0, 0]).is_err());
    }

    #[test]
    fn test_decode_values() {
        let ints = PcccValue::decode(FileType::Integer, &[0xCE, 0xFF, 0xFF, 0x7F], 2).unwrap();
        assert_eq!(ints, vec![PcccValue::Integer(-50), PcccValue::Integer(32767)]);

        let bin = PcccValue::decode(FileType::Binary, &[0x00, 0x80], 1).unwrap();
        assert_eq!(bin, vec![PcccValue::Binary(0x8000)]);

        let float = PcccValue::decode(FileType::Float, &72.5f32.to_le_bytes(), 1).unwrap();
        assert_eq!(float, vec![PcccValue::Float(72.5)]);

        let timer =
            PcccValue::decode(FileType::Timer, &[0x00, 0xA0, 0x64, 0x00, 0x0A, 0x00], 1).unwrap();
        assert_eq!(
            timer,
            vec![PcccValue::Timer {
                control: 0xA000,
                preset: 100,
                accumulator: 10
            }]
        );

        assert!(PcccValue::decode(FileType::Integer, &[0x01], 1).is_err());
    }

    #[test]
    fn test_decode_bit_is_zero_or_one() {
        let data = 0x0020u16.to_le_bytes();
        assert_eq!(PcccValue::decode_bit(&data, 5).unwrap(), PcccValue::Bit(true));
        assert_eq!(PcccValue::decode_bit(&data, 4).unwrap(), PcccValue::Bit(false));
        assert_eq!(PcccValue::decode_bit(&data, 5).unwrap().as_i32(), Some(1));
    }

    #[test]
    fn test_encode_word_ranges() {
        assert_eq!(encode_word(FileType::Integer, -50).unwrap(), 0xFFCE);
        assert_eq!(encode_word(FileType::Integer, -32768).unwrap(), 0x8000);
        assert!(matches!(
            encode_word(FileType::Integer, 32768),
            Err(EipError::ValueOutOfRange { .. })
        ));
        assert_eq!(encode_word(FileType::Binary, 65535).unwrap(), 0xFFFF);
        assert!(encode_word(FileType::Binary, -1).is_err());
        assert!(matches!(
            encode_word(FileType::Float, 1),
            Err(EipError::UnsupportedAddress { .. })
        ));
    }
}
