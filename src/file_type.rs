//! SLC/MicroLogix data file types.
//!
//! This module defines the [`FileType`] enum, the closed set of data table
//! file types this crate can address over PCCC. Each type carries its PCCC
//! type code, its default file number and its element width.
//!
//! # File Types Overview
//!
//! | Type | Letter | Default file | Code | Element bytes | Read | Write | Bit access |
//! |------|:------:|:------------:|:----:|:-------------:|:----:|:-----:|:----------:|
//! | Integer | N | 7 | 0x89 | 2 | ✓ | ✓ | ✓ |
//! | Binary | B | 3 | 0x85 | 2 | ✓ | ✓ | ✓ |
//! | Float | F | 8 | 0x8A | 4 | ✓ | ✗ | ✗ |
//! | Timer | T | 4 | 0x86 | 6 | ✓ | ✗ | ✗ |
//! | Counter | C | 5 | 0x87 | 6 | ✓ | ✗ | ✗ |
//!
//! # Example
//!
//! ```
//! use ab_eip::FileType;
//!
//! let file: FileType = "N7".parse().unwrap();
//! assert_eq!(file, FileType::Integer);
//! assert!(file.supports_write());
//! assert!(!FileType::Float.supports_bit_access());
//! assert_eq!(FileType::Binary.to_string(), "B");
//! ```

use std::str::FromStr;

use crate::error::{EipError, Result};

/// Data table file types addressable over PCCC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    /// Integer file (N), signed 16-bit words.
    Integer,
    /// Binary file (B), unsigned 16-bit words.
    Binary,
    /// Floating point file (F), IEEE-754 single precision.
    Float,
    /// Timer file (T), three words per element.
    Timer,
    /// Counter file (C), three words per element.
    Counter,
}

impl FileType {
    /// Returns the PCCC file type code.
    pub fn code(self) -> u8 {
        match self {
            FileType::Integer => 0x89,
            FileType::Binary => 0x85,
            FileType::Float => 0x8A,
            FileType::Timer => 0x86,
            FileType::Counter => 0x87,
        }
    }

    /// Returns the file number used when an address names only the letter.
    pub fn default_file_number(self) -> u16 {
        match self {
            FileType::Integer => 7,
            FileType::Binary => 3,
            FileType::Float => 8,
            FileType::Timer => 4,
            FileType::Counter => 5,
        }
    }

    /// Returns the size of one element in bytes.
    pub fn element_size(self) -> usize {
        match self {
            FileType::Integer | FileType::Binary => 2,
            FileType::Float => 4,
            FileType::Timer | FileType::Counter => 6,
        }
    }

    /// Returns the file letter used in textual addresses.
    pub fn letter(self) -> char {
        match self {
            FileType::Integer => 'N',
            FileType::Binary => 'B',
            FileType::Float => 'F',
            FileType::Timer => 'T',
            FileType::Counter => 'C',
        }
    }

    /// Returns whether typed writes are implemented for this file type.
    pub fn supports_write(self) -> bool {
        matches!(self, FileType::Integer | FileType::Binary)
    }

    /// Returns whether bit-level access is implemented for this file type.
    pub fn supports_bit_access(self) -> bool {
        matches!(self, FileType::Integer | FileType::Binary)
    }

    /// Looks up a file type by its letter (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `EipError::UnsupportedAddress` for any other letter.
    pub fn from_letter(letter: char) -> Result<Self> {
        match letter.to_ascii_uppercase() {
            'N' => Ok(FileType::Integer),
            'B' => Ok(FileType::Binary),
            'F' => Ok(FileType::Float),
            'T' => Ok(FileType::Timer),
            'C' => Ok(FileType::Counter),
            other => Err(EipError::unsupported(format!(
                "file type '{}' is not supported",
                other
            ))),
        }
    }

    /// Splits a file designator such as `"N7"` or `"B10"` into its type and
    /// file number. A bare letter uses the default file number.
    ///
    /// # Example
    ///
    /// ```
    /// use ab_eip::FileType;
    ///
    /// assert_eq!(FileType::parse_file("B10").unwrap(), (FileType::Binary, 10));
    /// assert_eq!(FileType::parse_file("t").unwrap(), (FileType::Timer, 4));
    /// ```
    pub fn parse_file(s: &str) -> Result<(Self, u16)> {
        let s = s.trim();
        let mut chars = s.chars();
        let letter = chars
            .next()
            .ok_or_else(|| EipError::invalid_parameter("file", "file designator is empty"))?;
        let file_type = Self::from_letter(letter)?;

        let digits = chars.as_str();
        if digits.is_empty() {
            return Ok((file_type, file_type.default_file_number()));
        }
        let file_number = digits.parse::<u16>().map_err(|_| {
            EipError::invalid_parameter("file", format!("invalid file number in '{}'", s))
        })?;
        Ok((file_type, file_number))
    }
}

impl FromStr for FileType {
    type Err = EipError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_file(s).map(|(file_type, _)| file_type)
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.letter())
    }
}
