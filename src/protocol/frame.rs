//! # Frame Bit Buffer
//!
//! A 64-bit frame stored most-significant bit first, in the order bits arrive
//! on the wire. Bit 0 is the first bit received; byte 0 is the sync byte.

use std::fmt;
use std::str::FromStr;

use crate::error::{CodecError, Result};

/// Number of bits in a frame
pub const FRAME_BITS: usize = 64;

/// Number of bytes in a frame
pub const FRAME_BYTES: usize = 8;

/// 64-bit frame buffer indexed in wire order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Frame(u64);

impl Frame {
    /// An all-zero frame
    pub const EMPTY: Frame = Frame(0);

    /// Wrap a raw 64-bit value (first wire bit in the MSB)
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw 64-bit value
    #[must_use]
    pub const fn raw(&self) -> u64 {
        self.0
    }

    /// Read bit `index` (0 = first on the wire = most significant)
    ///
    /// # Panics
    ///
    /// Panics if `index` is 64 or more.
    #[inline]
    #[must_use]
    pub fn bit(&self, index: usize) -> bool {
        assert!(index < FRAME_BITS, "bit index {} out of range", index);
        (self.0 >> (FRAME_BITS - 1 - index)) & 0x1 == 1
    }

    /// Read byte `index` (0 = sync byte, 7 = checksum byte)
    ///
    /// # Panics
    ///
    /// Panics if `index` is 8 or more.
    #[inline]
    #[must_use]
    pub fn byte(&self, index: usize) -> u8 {
        assert!(index < FRAME_BYTES, "byte index {} out of range", index);
        (self.0 >> (8 * (FRAME_BYTES - 1 - index))) as u8
    }

    /// Bytes in wire order
    #[must_use]
    pub fn to_bytes(&self) -> [u8; FRAME_BYTES] {
        self.0.to_be_bytes()
    }

    /// Shift the buffer left and insert `bit` as the newest (least significant) bit
    #[inline]
    pub fn push(&mut self, bit: bool) {
        self.0 = (self.0 << 1) | u64::from(bit);
    }

    /// Set or clear bit `index` in place
    ///
    /// # Panics
    ///
    /// Panics if `index` is 64 or more.
    pub fn set(&mut self, index: usize, bit: bool) {
        assert!(index < FRAME_BITS, "bit index {} out of range", index);
        let mask = 1u64 << (FRAME_BITS - 1 - index);
        if bit {
            self.0 |= mask;
        } else {
            self.0 &= !mask;
        }
    }

    /// Extract `width` bits starting at wire offset `offset`
    #[inline]
    pub(crate) fn field(&self, offset: u32, width: u32) -> u64 {
        debug_assert!(width > 0 && offset + width <= FRAME_BITS as u32);
        let shift = FRAME_BITS as u32 - offset - width;
        (self.0 >> shift) & (u64::MAX >> (64 - width))
    }
}

impl From<u64> for Frame {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<Frame> for u64 {
    fn from(frame: Frame) -> Self {
        frame.0
    }
}

impl FromStr for Frame {
    type Err = CodecError;

    /// Parse up to 64 '0'/'1' characters, pushed first-to-last.
    ///
    /// Shorter strings end up right-aligned, exactly as if those bits had
    /// been received one after another.
    fn from_str(s: &str) -> Result<Self> {
        if s.len() > FRAME_BITS {
            return Err(CodecError::InvalidBitString(format!(
                "{} bits exceeds frame size {}",
                s.len(),
                FRAME_BITS
            )));
        }

        let mut frame = Frame::EMPTY;
        for (pos, c) in s.chars().enumerate() {
            match c {
                '0' => frame.push(false),
                '1' => frame.push(true),
                other => {
                    return Err(CodecError::InvalidBitString(format!(
                        "unexpected character {:?} at position {}",
                        other, pos
                    )))
                }
            }
        }

        Ok(frame)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:064b}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const S0: &str = "0000010100110100001100100110000001101010100011100000001011000101";

    #[test]
    fn test_parse_and_display() {
        let frame: Frame = S0.parse().unwrap();
        assert_eq!(frame.to_string(), S0);
    }

    #[test]
    fn test_bit_zero_is_msb() {
        let frame = Frame::from_raw(1u64 << 63);
        assert!(frame.bit(0));
        assert!(!frame.bit(63));

        let frame = Frame::from_raw(1);
        assert!(frame.bit(63));
        assert!(!frame.bit(0));
    }

    #[test]
    fn test_bytes_in_wire_order() {
        let frame: Frame = S0.parse().unwrap();
        assert_eq!(frame.byte(0), 0x05); // sync
        assert_eq!(frame.byte(1), 0x34);
        assert_eq!(frame.byte(2), 0x32);
        assert_eq!(frame.byte(7), 0xC5); // checksum
        assert_eq!(
            frame.to_bytes(),
            [0x05, 0x34, 0x32, 0x60, 0x6A, 0x8E, 0x02, 0xC5]
        );
    }

    #[test]
    fn test_push_shifts_in_lsb() {
        let mut frame = Frame::EMPTY;
        frame.push(true);
        frame.push(false);
        frame.push(true);
        assert_eq!(frame.raw(), 0b101);
    }

    #[test]
    fn test_push_drops_oldest_bit_after_64() {
        let mut frame = Frame::from_raw(u64::MAX);
        frame.push(false);
        assert_eq!(frame.raw(), u64::MAX - 1);
        assert!(frame.bit(0));
        assert!(!frame.bit(63));
    }

    #[test]
    fn test_set_and_clear() {
        let mut frame = Frame::EMPTY;
        frame.set(0, true);
        frame.set(10, true);
        assert!(frame.bit(0));
        assert!(frame.bit(10));

        frame.set(0, false);
        assert!(!frame.bit(0));
        assert!(frame.bit(10));
    }

    #[test]
    fn test_field_extraction() {
        let frame: Frame = S0.parse().unwrap();
        assert_eq!(frame.field(0, 8), 0x05);
        assert_eq!(frame.field(8, 16), 0x3432);
        assert_eq!(frame.field(56, 8), 0xC5);
        assert_eq!(frame.field(0, 64), frame.raw());
    }

    #[test]
    fn test_short_string_is_right_aligned() {
        let frame: Frame = "101".parse().unwrap();
        assert_eq!(frame.raw(), 0b101);
    }

    #[test]
    fn test_invalid_character_rejected() {
        let result = "0102".parse::<Frame>();
        assert!(matches!(result, Err(CodecError::InvalidBitString(_))));
    }

    #[test]
    fn test_too_long_rejected() {
        let long = "0".repeat(65);
        assert!(long.parse::<Frame>().is_err());
    }

    #[test]
    fn test_u64_conversions() {
        let frame = Frame::from(0xDEAD_BEEF_u64);
        assert_eq!(u64::from(frame), 0xDEAD_BEEF);
    }

    #[test]
    fn test_last_valid_indices() {
        let mut frame = Frame::EMPTY;
        frame.set(FRAME_BITS - 1, true);
        assert!(frame.bit(FRAME_BITS - 1));
        assert_eq!(frame.byte(FRAME_BYTES - 1), 0x01);
    }

    #[test]
    #[should_panic(expected = "bit index 64 out of range")]
    fn test_bit_index_out_of_range_panics() {
        let _ = Frame::from_raw(u64::MAX).bit(FRAME_BITS);
    }

    #[test]
    #[should_panic(expected = "byte index 8 out of range")]
    fn test_byte_index_out_of_range_panics() {
        let _ = Frame::from_raw(u64::MAX).byte(FRAME_BYTES);
    }

    #[test]
    #[should_panic(expected = "bit index 64 out of range")]
    fn test_set_index_out_of_range_panics() {
        let mut frame = Frame::EMPTY;
        frame.set(FRAME_BITS, true);
    }
}
