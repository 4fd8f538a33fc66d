//! # Pulse Classifier
//!
//! Maps a measured high time to its meaning, given how many data bits the
//! receiver already holds.
//!
//! Rules, in priority order:
//! 1. longer than 400us: marker
//! 2. shorter than 40us once more than 63 bits are held: tail
//! 3. anything else: a data bit, 1 if longer than 100us
//!
//! A short pulse that arrives before 64 bits are held is deliberately *not*
//! treated as noise. It fails rule 2 and becomes a logical 0 under rule 3.

use crate::protocol::wire::{DATA_BITS, MARKER_MIN_US, ONE_MIN_US, TAIL_MAX_US};

/// Meaning of a single received pulse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseClass {
    /// Start of frame
    Marker,
    /// End of frame after a full set of data bits
    Tail,
    /// One data bit
    Data(bool),
}

/// Classify a pulse of `width_us` arriving with `bit_index` bits already held
#[inline]
#[must_use]
pub fn classify(width_us: u32, bit_index: i8) -> PulseClass {
    if width_us > MARKER_MIN_US {
        PulseClass::Marker
    } else if width_us < TAIL_MAX_US && bit_index > DATA_BITS - 1 {
        PulseClass::Tail
    } else {
        PulseClass::Data(width_us > ONE_MIN_US)
    }
}
