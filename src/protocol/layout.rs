//! # Frame Layout
//!
//! Field layout of a completed frame, in wire order:
//!
//! ```text
//! bit  0        8                24 25 27 28   32               48       56       64
//!      | sync(8) |     ID(16)     |P |IV |B |unus|  current_raw(16) | exp(8) | csum(8)|
//! ```
//!
//! - `P`: pairing flag (1 = pairing)
//! - `IV`: transmit interval code (`00` = 6s, `11` = 12s, `10` = 18s)
//! - `B`: battery flag (1 = ok)
//!
//! The checksum is the sum of the first seven bytes, modulo 256. Current in
//! milliamps is `current_raw * 1000 / 2^(15 - exponent)`.

use super::frame::Frame;
use crate::error::{CodecError, Result};

/// Sync byte sent by known transmitters
pub const SYNC_PATTERN: u8 = 0x05;

/// Default mains reference voltage for power calculation
pub const DEFAULT_REFERENCE_VOLTAGE: u32 = 240;

/// Largest exponent the current formula accepts
pub const MAX_EXPONENT: u8 = 15;

// Field positions as (offset, width) in wire bits
const SYNC: (u32, u32) = (0, 8);
const ID: (u32, u32) = (8, 16);
const PAIRING: (u32, u32) = (24, 1);
const INTERVAL: (u32, u32) = (25, 2);
const BATTERY: (u32, u32) = (27, 1);
const UNUSED: (u32, u32) = (28, 4);
const CURRENT: (u32, u32) = (32, 16);
const EXPONENT: (u32, u32) = (48, 8);
const CHECKSUM: (u32, u32) = (56, 8);

/// Decoded sensor record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRecord {
    /// Sync byte
    pub sync: u8,

    /// Transmitter ID
    pub id: u16,

    /// Transmitter is in pairing mode
    pub pairing: bool,

    /// Raw 2-bit transmit interval code
    pub interval_code: u8,

    /// Battery is ok (false = low)
    pub battery_ok: bool,

    /// Unused low nibble of the flags byte
    pub unused: u8,

    /// Raw current magnitude
    pub current_raw: u16,

    /// Current scale exponent
    pub exponent: u8,

    /// Checksum byte as stored in the frame
    pub checksum: u8,
}

impl FrameRecord {
    /// Decode all fields of a frame. Never fails; validity is reported separately.
    #[must_use]
    pub fn decode(frame: Frame) -> Self {
        let get = |(offset, width): (u32, u32)| frame.field(offset, width);

        Self {
            sync: get(SYNC) as u8,
            id: get(ID) as u16,
            pairing: get(PAIRING) == 1,
            interval_code: get(INTERVAL) as u8,
            battery_ok: get(BATTERY) == 1,
            unused: get(UNUSED) as u8,
            current_raw: get(CURRENT) as u16,
            exponent: get(EXPONENT) as u8,
            checksum: get(CHECKSUM) as u8,
        }
    }

    /// Pack the record back into a frame, using the stored checksum as-is
    #[must_use]
    pub fn encode(&self) -> Frame {
        let put = |(offset, width): (u32, u32), value: u64| {
            let mask = u64::MAX >> (64 - width);
            (value & mask) << (64 - offset - width)
        };

        let raw = put(SYNC, u64::from(self.sync))
            | put(ID, u64::from(self.id))
            | put(PAIRING, u64::from(self.pairing))
            | put(INTERVAL, u64::from(self.interval_code))
            | put(BATTERY, u64::from(self.battery_ok))
            | put(UNUSED, u64::from(self.unused))
            | put(CURRENT, u64::from(self.current_raw))
            | put(EXPONENT, u64::from(self.exponent))
            | put(CHECKSUM, u64::from(self.checksum));

        Frame::from_raw(raw)
    }

    /// Return a copy whose checksum matches its payload
    #[must_use]
    pub fn sealed(mut self) -> Self {
        self.checksum = payload_checksum(&self.encode());
        self
    }

    /// Transmit interval in seconds, if the code is a known one
    #[must_use]
    pub fn interval_seconds(&self) -> Option<u32> {
        match self.interval_code & 0b11 {
            0b00 => Some(6),
            0b11 => Some(12),
            0b10 => Some(18),
            _ => None,
        }
    }

    /// Current in milliamps
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::ExponentOutOfRange`] if the exponent exceeds 15.
    pub fn current_milliamps(&self) -> Result<u32> {
        if self.exponent > MAX_EXPONENT {
            return Err(CodecError::ExponentOutOfRange(self.exponent));
        }

        let divisor = 1u32 << (MAX_EXPONENT - self.exponent);
        Ok(u32::from(self.current_raw) * 1000 / divisor)
    }

    /// Power in watts at the given reference voltage
    ///
    /// Computed from the truncated milliamp value, in 64 bits.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::ExponentOutOfRange`] if the exponent exceeds 15.
    pub fn power_watts(&self, reference_voltage: u32) -> Result<u64> {
        let current_ma = self.current_milliamps()?;
        Ok(u64::from(current_ma) * u64::from(reference_voltage) / 1000)
    }
}

/// Sum of the seven payload bytes modulo 256
#[must_use]
pub fn payload_checksum(frame: &Frame) -> u8 {
    frame.to_bytes()[..7]
        .iter()
        .fold(0u8, |sum, &byte| sum.wrapping_add(byte))
}

/// Whether the stored checksum byte matches the payload
#[must_use]
pub fn checksum_is_good(frame: &Frame) -> bool {
    payload_checksum(frame) == frame.byte(7)
}

/// Current in milliamps of a completed frame
///
/// # Errors
///
/// Returns [`CodecError::ExponentOutOfRange`] if the exponent exceeds 15.
pub fn current_milliamps(frame: &Frame) -> Result<u32> {
    FrameRecord::decode(*frame).current_milliamps()
}

/// Power in watts of a completed frame
///
/// # Errors
///
/// Returns [`CodecError::ExponentOutOfRange`] if the exponent exceeds 15.
pub fn power_watts(frame: &Frame, reference_voltage: u32) -> Result<u64> {
    FrameRecord::decode(*frame).power_watts(reference_voltage)
}
