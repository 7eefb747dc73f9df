//! CIP elementary types and Logix tag read/write encoding.
//!
//! # Elementary Types
//!
//! | Type | Code | Bytes | Rust value |
//! |------|------|:-----:|------------|
//! | BOOL | 0xC1 | 1 | `bool` |
//! | SINT | 0xC2 | 1 | `i8` |
//! | INT | 0xC3 | 2 | `i16` |
//! | DINT | 0xC4 | 4 | `i32` |
//! | LINT | 0xC5 | 8 | `i64` |
//! | USINT | 0xC6 | 1 | `u8` |
//! | UINT | 0xC7 | 2 | `u16` |
//! | UDINT | 0xC8 | 4 | `u32` |
//! | ULINT | 0xC9 | 8 | `u64` |
//! | REAL | 0xCA | 4 | `f32` |
//! | LREAL | 0xCB | 8 | `f64` |
//!
//! All values are little-endian; REAL and LREAL use the IEEE-754 layout.
//!
//! # Read Tag (0x4C)
//!
//! Request data is the element count (`u16`). Reply data is the type code
//! (`u16`) followed by the elements, contiguous and unpadded.
//!
//! # Write Tag (0x4D)
//!
//! Request data is the type code (`u16`), the element count (`u16`) and the
//! encoded elements. The reply carries no data.
//!
//! # Example
//!
//! ```
//! use ab_eip::{CipType, CipValue, NativeValue};
//!
//! let value = CipValue::from_native(NativeValue::from(-5), CipType::Int).unwrap();
//! assert_eq!(value, CipValue::Int(-5));
//! assert_eq!(value.to_bytes(), vec![0xFB, 0xFF]);
//!
//! // 300 does not fit a SINT
//! assert!(CipValue::from_native(NativeValue::from(300), CipType::Sint).is_err());
//! ```

use std::str::FromStr;

use crate::cip::{service, EPath, MessageRouterRequest};
use crate::error::{EipError, Result};

/// Type code announcing a structure in a Read Tag reply.
pub const STRUCTURE_TYPE_CODE: u16 = 0x02A0;

/// CIP elementary data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CipType {
    /// Boolean, one byte.
    Bool,
    /// Signed 8-bit integer.
    Sint,
    /// Signed 16-bit integer.
    Int,
    /// Signed 32-bit integer.
    Dint,
    /// Signed 64-bit integer.
    Lint,
    /// Unsigned 8-bit integer.
    Usint,
    /// Unsigned 16-bit integer.
    Uint,
    /// Unsigned 32-bit integer.
    Udint,
    /// Unsigned 64-bit integer.
    Ulint,
    /// IEEE-754 binary32.
    Real,
    /// IEEE-754 binary64.
    Lreal,
}

impl CipType {
    /// All elementary types, in code order.
    pub const ALL: [CipType; 11] = [
        CipType::Bool,
        CipType::Sint,
        CipType::Int,
        CipType::Dint,
        CipType::Lint,
        CipType::Usint,
        CipType::Uint,
        CipType::Udint,
        CipType::Ulint,
        CipType::Real,
        CipType::Lreal,
    ];

    /// Returns the CIP type code.
    pub fn code(self) -> u16 {
        match self {
            CipType::Bool => 0xC1,
            CipType::Sint => 0xC2,
            CipType::Int => 0xC3,
            CipType::Dint => 0xC4,
            CipType::Lint => 0xC5,
            CipType::Usint => 0xC6,
            CipType::Uint => 0xC7,
            CipType::Udint => 0xC8,
            CipType::Ulint => 0xC9,
            CipType::Real => 0xCA,
            CipType::Lreal => 0xCB,
        }
    }

    /// Returns the encoded width in bytes.
    pub fn size(self) -> usize {
        match self {
            CipType::Bool | CipType::Sint | CipType::Usint => 1,
            CipType::Int | CipType::Uint => 2,
            CipType::Dint | CipType::Udint | CipType::Real => 4,
            CipType::Lint | CipType::Ulint | CipType::Lreal => 8,
        }
    }

    /// Returns the type name as used in Logix.
    pub fn name(self) -> &'static str {
        match self {
            CipType::Bool => "BOOL",
            CipType::Sint => "SINT",
            CipType::Int => "INT",
            CipType::Dint => "DINT",
            CipType::Lint => "LINT",
            CipType::Usint => "USINT",
            CipType::Uint => "UINT",
            CipType::Udint => "UDINT",
            CipType::Ulint => "ULINT",
            CipType::Real => "REAL",
            CipType::Lreal => "LREAL",
        }
    }

    /// Returns whether the type is a signed integer.
    pub fn is_signed(self) -> bool {
        matches!(
            self,
            CipType::Sint | CipType::Int | CipType::Dint | CipType::Lint
        )
    }

    /// Returns whether the type is a floating point type.
    pub fn is_float(self) -> bool {
        matches!(self, CipType::Real | CipType::Lreal)
    }
}

impl TryFrom<u16> for CipType {
    type Error = EipError;

    fn try_from(code: u16) -> Result<Self> {
        if code == STRUCTURE_TYPE_CODE {
            return Err(EipError::unsupported(
                "structure tags are not supported, read an elementary member instead",
            ));
        }
        CipType::ALL
            .into_iter()
            .find(|t| t.code() == code)
            .ok_or_else(|| EipError::unsupported(format!("CIP data type 0x{:04X}", code)))
    }
}

impl FromStr for CipType {
    type Err = EipError;

    /// Parses a type name such as `"DINT"` or `"real"`.
    fn from_str(s: &str) -> Result<Self> {
        CipType::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| EipError::unsupported(format!("unknown CIP type name '{}'", s)))
    }
}

impl std::fmt::Display for CipType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A value supplied by the caller, before a CIP type is chosen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NativeValue {
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Integer(i64),
    /// Unsigned integer above the signed range, or given as unsigned.
    Unsigned(u64),
    /// Floating point.
    Float(f64),
}

impl NativeValue {
    /// Returns the type used when no type is requested and auto-detection is
    /// off: BOOL for booleans, DINT for integers, REAL for floats.
    pub fn default_type(&self) -> CipType {
        match self {
            NativeValue::Bool(_) => CipType::Bool,
            NativeValue::Integer(_) | NativeValue::Unsigned(_) => CipType::Dint,
            NativeValue::Float(_) => CipType::Real,
        }
    }

    /// Returns the value as an integer if it is integral.
    fn as_integer(&self) -> Option<i128> {
        match *self {
            NativeValue::Bool(b) => Some(i128::from(b)),
            NativeValue::Integer(v) => Some(i128::from(v)),
            NativeValue::Unsigned(v) => Some(i128::from(v)),
            NativeValue::Float(f) => {
                if f.is_finite() && f.fract() == 0.0 && f.abs() < 1.0e38 {
                    Some(f as i128)
                } else {
                    None
                }
            }
        }
    }

    fn as_f64(&self) -> f64 {
        match *self {
            NativeValue::Bool(b) => f64::from(u8::from(b)),
            NativeValue::Integer(v) => v as f64,
            NativeValue::Unsigned(v) => v as f64,
            NativeValue::Float(f) => f,
        }
    }
}

impl std::fmt::Display for NativeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NativeValue::Bool(b) => write!(f, "{}", b),
            NativeValue::Integer(v) => write!(f, "{}", v),
            NativeValue::Unsigned(v) => write!(f, "{}", v),
            NativeValue::Float(v) => write!(f, "{}", v),
        }
    }
}

impl From<bool> for NativeValue {
    fn from(value: bool) -> Self {
        NativeValue::Bool(value)
    }
}

macro_rules! native_from {
    ($variant:ident, $target:ty, $($source:ty),+) => {
        $(
            impl From<$source> for NativeValue {
                fn from(value: $source) -> Self {
                    NativeValue::$variant(<$target>::from(value))
                }
            }
        )+
    };
}

native_from!(Integer, i64, i8, i16, i32, i64);
native_from!(Unsigned, u64, u8, u16, u32, u64);
native_from!(Float, f64, f32, f64);

/// How the CIP type of a write is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeRequest {
    /// Use this type; no read is issued.
    Explicit(CipType),
    /// Read the tag once and use the type code of the reply.
    #[default]
    AutoDetect,
    /// Use [`NativeValue::default_type`] without reading.
    DefaultForKind,
}

/// A typed CIP value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CipValue {
    /// BOOL.
    Bool(bool),
    /// SINT.
    Sint(i8),
    /// INT.
    Int(i16),
    /// DINT.
    Dint(i32),
    /// LINT.
    Lint(i64),
    /// USINT.
    Usint(u8),
    /// UINT.
    Uint(u16),
    /// UDINT.
    Udint(u32),
    /// ULINT.
    Ulint(u64),
    /// REAL.
    Real(f32),
    /// LREAL.
    Lreal(f64),
}

impl CipValue {
    /// Returns the CIP type of this value.
    pub fn data_type(&self) -> CipType {
        match self {
            CipValue::Bool(_) => CipType::Bool,
            CipValue::Sint(_) => CipType::Sint,
            CipValue::Int(_) => CipType::Int,
            CipValue::Dint(_) => CipType::Dint,
            CipValue::Lint(_) => CipType::Lint,
            CipValue::Usint(_) => CipType::Usint,
            CipValue::Uint(_) => CipType::Uint,
            CipValue::Udint(_) => CipType::Udint,
            CipValue::Ulint(_) => CipType::Ulint,
            CipValue::Real(_) => CipType::Real,
            CipValue::Lreal(_) => CipType::Lreal,
        }
    }

    /// Converts a native value to `data_type`.
    ///
    /// Integer types accept booleans, integers and integral floats within
    /// range. BOOL accepts only 0 and 1. Float types accept any value.
    ///
    /// # Errors
    ///
    /// Returns `EipError::ValueOutOfRange` if the value cannot be represented
    /// exactly by the target integer type.
    pub fn from_native(value: NativeValue, data_type: CipType) -> Result<Self> {
        let out_of_range = || EipError::out_of_range(value, data_type);
        let integer = || value.as_integer().ok_or_else(&out_of_range);

        Ok(match data_type {
            CipType::Real => {
                let v = value.as_f64();
                if v.is_finite() && v.abs() > f64::from(f32::MAX) {
                    return Err(out_of_range());
                }
                CipValue::Real(v as f32)
            }
            CipType::Lreal => CipValue::Lreal(value.as_f64()),
            CipType::Bool => match integer()? {
                0 => CipValue::Bool(false),
                1 => CipValue::Bool(true),
                _ => return Err(out_of_range()),
            },
            CipType::Sint => CipValue::Sint(i8::try_from(integer()?).map_err(|_| out_of_range())?),
            CipType::Int => CipValue::Int(i16::try_from(integer()?).map_err(|_| out_of_range())?),
            CipType::Dint => CipValue::Dint(i32::try_from(integer()?).map_err(|_| out_of_range())?),
            CipType::Lint => CipValue::Lint(i64::try_from(integer()?).map_err(|_| out_of_range())?),
            CipType::Usint => {
                CipValue::Usint(u8::try_from(integer()?).map_err(|_| out_of_range())?)
            }
            CipType::Uint => CipValue::Uint(u16::try_from(integer()?).map_err(|_| out_of_range())?),
            CipType::Udint => {
                CipValue::Udint(u32::try_from(integer()?).map_err(|_| out_of_range())?)
            }
            CipType::Ulint => {
                CipValue::Ulint(u64::try_from(integer()?).map_err(|_| out_of_range())?)
            }
        })
    }

    /// Appends the little-endian encoding of the value.
    pub fn encode(&self, out: &mut Vec<u8>) {
        match *self {
            CipValue::Bool(b) => out.push(u8::from(b)),
            CipValue::Sint(v) => out.extend_from_slice(&v.to_le_bytes()),
            CipValue::Int(v) => out.extend_from_slice(&v.to_le_bytes()),
            CipValue::Dint(v) => out.extend_from_slice(&v.to_le_bytes()),
            CipValue::Lint(v) => out.extend_from_slice(&v.to_le_bytes()),
            CipValue::Usint(v) => out.push(v),
            CipValue::Uint(v) => out.extend_from_slice(&v.to_le_bytes()),
            CipValue::Udint(v) => out.extend_from_slice(&v.to_le_bytes()),
            CipValue::Ulint(v) => out.extend_from_slice(&v.to_le_bytes()),
            CipValue::Real(v) => out.extend_from_slice(&v.to_le_bytes()),
            CipValue::Lreal(v) => out.extend_from_slice(&v.to_le_bytes()),
        }
    }

    /// Returns the little-endian encoding of the value.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data_type().size());
        self.encode(&mut out);
        out
    }

    /// Decodes one element of `data_type` from exactly `bytes`.
    ///
    /// # Errors
    ///
    /// Returns `EipError::MalformedReply` if `bytes` does not match the
    /// type's width.
    pub fn decode(data_type: CipType, bytes: &[u8]) -> Result<Self> {
        if bytes.len() != data_type.size() {
            return Err(EipError::malformed(format!(
                "{} element needs {} bytes, got {}",
                data_type,
                data_type.size(),
                bytes.len()
            )));
        }

        let b2 = || [bytes[0], bytes[1]];
        let b4 = || [bytes[0], bytes[1], bytes[2], bytes[3]];
        let b8 = || {
            [
                bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
            ]
        };

        Ok(match data_type {
            CipType::Bool => CipValue::Bool(bytes[0] != 0),
            CipType::Sint => CipValue::Sint(bytes[0] as i8),
            CipType::Int => CipValue::Int(i16::from_le_bytes(b2())),
            CipType::Dint => CipValue::Dint(i32::from_le_bytes(b4())),
            CipType::Lint => CipValue::Lint(i64::from_le_bytes(b8())),
            CipType::Usint => CipValue::Usint(bytes[0]),
            CipType::Uint => CipValue::Uint(u16::from_le_bytes(b2())),
            CipType::Udint => CipValue::Udint(u32::from_le_bytes(b4())),
            CipType::Ulint => CipValue::Ulint(u64::from_le_bytes(b8())),
            CipType::Real => CipValue::Real(f32::from_le_bytes(b4())),
            CipType::Lreal => CipValue::Lreal(f64::from_le_bytes(b8())),
        })
    }

    /// Returns the value as a native value.
    pub fn to_native(&self) -> NativeValue {
        match *self {
            CipValue::Bool(b) => NativeValue::Bool(b),
            CipValue::Sint(v) => NativeValue::from(v),
            CipValue::Int(v) => NativeValue::from(v),
            CipValue::Dint(v) => NativeValue::from(v),
            CipValue::Lint(v) => NativeValue::from(v),
            CipValue::Usint(v) => NativeValue::from(v),
            CipValue::Uint(v) => NativeValue::from(v),
            CipValue::Udint(v) => NativeValue::from(v),
            CipValue::Ulint(v) => NativeValue::from(v),
            CipValue::Real(v) => NativeValue::from(v),
            CipValue::Lreal(v) => NativeValue::from(v),
        }
    }

    /// Returns the value as an `f64`.
    ///
    /// # Example
    ///
    /// ```
    /// use ab_eip::CipValue;
    ///
    /// assert_eq!(CipValue::Real(72.5).as_f64(), 72.5);
    /// assert_eq!(CipValue::Bool(true).as_f64(), 1.0);
    /// ```
    pub fn as_f64(&self) -> f64 {
        self.to_native().as_f64()
    }

    /// Returns the value as an `i64` if it is an integer or BOOL that fits.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            CipValue::Real(_) | CipValue::Lreal(_) => None,
            CipValue::Ulint(v) => i64::try_from(v).ok(),
            other => other.to_native().as_integer().and_then(|v| i64::try_from(v).ok()),
        }
    }
}

impl std::fmt::Display for CipValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_native())
    }
}

/// Read Tag request for `count` elements starting at `path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadTagCommand {
    path: EPath,
    count: u16,
}

impl ReadTagCommand {
    /// Creates a new Read Tag command for a tag name.
    ///
    /// # Errors
    ///
    /// Returns `EipError::InvalidParameter` if the tag name is invalid or the
    /// count is zero.
    pub fn new(tag_name: &str, count: u16) -> Result<Self> {
        if count == 0 {
            return Err(EipError::invalid_parameter("count", "must be at least 1"));
        }
        Ok(Self {
            path: EPath::tag(tag_name)?,
            count,
        })
    }

    /// Returns the number of elements requested.
    pub fn count(&self) -> u16 {
        self.count
    }

    /// Builds the Message Router request.
    pub fn to_request(&self) -> MessageRouterRequest {
        MessageRouterRequest::new(
            service::READ_TAG,
            self.path.clone(),
            self.count.to_le_bytes().to_vec(),
        )
    }
}

/// Write Tag request for one or more elements of a single type.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteTagCommand {
    path: EPath,
    data_type: CipType,
    values: Vec<CipValue>,
}

impl WriteTagCommand {
    /// Creates a new Write Tag command.
    ///
    /// # Errors
    ///
    /// Returns `EipError::InvalidParameter` if the tag name is invalid, no
    /// values are given, or the values do not all share one type.
    pub fn new(tag_name: &str, values: Vec<CipValue>) -> Result<Self> {
        let data_type = values
            .first()
            .map(CipValue::data_type)
            .ok_or_else(|| EipError::invalid_parameter("values", "at least one value required"))?;
        if values.iter().any(|v| v.data_type() != data_type) {
            return Err(EipError::invalid_parameter(
                "values",
                "all elements must share one CIP type",
            ));
        }
        if values.len() > usize::from(u16::MAX) {
            return Err(EipError::invalid_parameter("values", "too many elements"));
        }
        Ok(Self {
            path: EPath::tag(tag_name)?,
            data_type,
            values,
        })
    }

    /// Returns the CIP type being written.
    pub fn data_type(&self) -> CipType {
        self.data_type
    }

    /// Builds the Message Router request.
    pub fn to_request(&self) -> MessageRouterRequest {
        let mut data = Vec::with_capacity(4 + self.values.len() * self.data_type.size());
        data.extend_from_slice(&self.data_type.code().to_le_bytes());
        data.extend_from_slice(&(self.values.len() as u16).to_le_bytes());
        for value in &self.values {
            value.encode(&mut data);
        }
        MessageRouterRequest::new(service::WRITE_TAG, self.path.clone(), data)
    }
}

/// Decoded data of a successful Read Tag reply.
#[derive(Debug, Clone, PartialEq)]
pub struct TagReadReply {
    /// Type reported by the controller.
    pub data_type: CipType,
    /// Elements, in order.
    pub values: Vec<CipValue>,
}

impl TagReadReply {
    /// Parses Read Tag reply data holding `count` elements.
    ///
    /// # Errors
    ///
    /// Returns `EipError::UnsupportedAddress` for structures and unknown type
    /// codes, and `EipError::MalformedReply` if fewer than `count` elements
    /// are present.
    pub fn from_bytes(data: &[u8], count: u16) -> Result<Self> {
        if data.len() < 2 {
            return Err(EipError::malformed(format!(
                "Read Tag reply too short: {} bytes",
                data.len()
            )));
        }
        let data_type = CipType::try_from(u16::from_le_bytes([data[0], data[1]]))?;

        let body = &data[2..];
        let needed = data_type.size() * usize::from(count);
        if body.len() < needed {
            return Err(EipError::malformed(format!(
                "Read Tag reply holds {} bytes, {} x {} needs {}",
                body.len(),
                count,
                data_type,
                needed
            )));
        }

        let values = body[..needed]
            .chunks_exact(data_type.size())
            .map(|chunk| CipValue::decode(data_type, chunk))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { data_type, values })
    }
}
