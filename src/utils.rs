//! Bit manipulation and formatting helpers.
//!
//! PCCC has no single-bit write primitive for N and B files, so bit access is
//! done on whole 16-bit words with these helpers.
//!
//! # Example
//!
//! ```
//! use ab_eip::utils::{get_bit, set_bit};
//!
//! let word: u16 = 0b0000_0000_0010_0001;
//! assert!(get_bit(word, 5));
//! assert!(!get_bit(word, 4));
//!
//! assert_eq!(set_bit(word, 5, false), 0b0000_0000_0000_0001);
//! assert_eq!(set_bit(word, 15, true), 0b1000_0000_0010_0001);
//! ```

/// Gets a single bit from a 16-bit word (bit 0 is the LSB).
#[inline]
pub fn get_bit(value: u16, bit: u8) -> bool {
    (value >> bit) & 1 == 1
}

/// Merges one bit into a data-table word, leaving the other fifteen as read.
#[inline]
pub fn set_bit(word: u16, bit: u8, state: bool) -> u16 {
    let mask = 1u16 << bit;
    (word & !mask) | (u16::from(state) << bit)
}

/// Formats a word as binary in nibble groups, most significant bit first.
///
/// # Example
///
/// ```
/// use ab_eip::utils::format_binary;
///
/// assert_eq!(format_binary(0x0021), "0000_0000_0010_0001");
/// ```
pub fn format_binary(value: u16) -> String {
    let bits = format!("{:016b}", value);
    bits.as_bytes()
        .chunks(4)
        .map(|nibble| String::from_utf8_lossy(nibble).into_owned())
        .collect::<Vec<_>>()
        .join("_")
}
