//! # Waveform Timing
//!
//! Timer register values for each pulse type, derived once from the timer
//! clock and the reference frequencies in [`super::wire`].
//!
//! Marker periods are driven non-inverted (high until the compare point).
//! Data and tail periods are inverted (low until the compare point, high for
//! the rest of the period), so the high time the receiver measures is
//! `period - compare`.

use tracing::debug;

use super::wire::*;
use crate::error::{CodecError, Result};

/// Lowest timer clock that still resolves the tail pulse
pub const MIN_TIMER_CLOCK_HZ: u32 = 100_000;

/// Timer register values in clock ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveformTiming {
    /// Timer clock frequency
    pub clock_hz: u32,

    /// Marker period (TOP)
    pub marker_period: u32,

    /// Marker compare value
    pub marker_compare: u32,

    /// Data bit period (TOP)
    pub data_period: u32,

    /// Data compare values, indexed by bit value
    pub data_compare: [u32; 2],

    /// Tail period (TOP)
    pub tail_period: u32,

    /// Tail compare value
    pub tail_compare: u32,
}

/// Timer ticks in one period of `freq_hz`
fn period_ticks(clock_hz: u32, freq_hz: u32) -> u32 {
    clock_hz / freq_hz
}

/// Scale a period by a duty fraction, in 64 bits so large clocks cannot overflow
fn duty_point(period: u32, (num, den): (u32, u32)) -> u32 {
    (u64::from(period) * u64::from(num) / u64::from(den)) as u32
}

impl WaveformTiming {
    /// Derive register values for a timer running at `clock_hz`
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Timing`] if the clock is too slow or the derived
    /// pulses would not classify correctly at the receiver.
    pub fn from_clock(clock_hz: u32) -> Result<Self> {
        if clock_hz < MIN_TIMER_CLOCK_HZ {
            return Err(CodecError::Timing(format!(
                "timer clock {}Hz below minimum {}Hz",
                clock_hz, MIN_TIMER_CLOCK_HZ
            )));
        }

        let marker_period = period_ticks(clock_hz, MARKER_FREQ_HZ);
        let data_period = period_ticks(clock_hz, DATA_FREQ_HZ);
        let tail_period = period_ticks(clock_hz, TAIL_FREQ_HZ);

        let timing = Self {
            clock_hz,
            marker_period,
            marker_compare: duty_point(marker_period, MARKER_DUTY),
            data_period,
            data_compare: [
                duty_point(data_period, DATA_ZERO_DUTY),
                duty_point(data_period, DATA_ONE_DUTY),
            ],
            tail_period,
            tail_compare: duty_point(tail_period, TAIL_DUTY),
        };

        timing.verify()?;

        debug!(
            "Marker: period {} ticks, compare {} ({}us high)",
            timing.marker_period,
            timing.marker_compare,
            timing.marker_high_us()
        );
        debug!(
            "Data: period {} ticks, compare {:?} ({}us / {}us high)",
            timing.data_period,
            timing.data_compare,
            timing.data_high_us(false),
            timing.data_high_us(true)
        );
        debug!(
            "Tail: period {} ticks, compare {} ({}us high)",
            timing.tail_period,
            timing.tail_compare,
            timing.tail_high_us()
        );

        Ok(timing)
    }

    /// Convert clock ticks to microseconds
    #[must_use]
    pub fn ticks_to_us(&self, ticks: u64) -> u64 {
        ticks * 1_000_000 / u64::from(self.clock_hz)
    }

    /// High time of the marker pulse
    #[must_use]
    pub fn marker_high_us(&self) -> u32 {
        self.ticks_to_us(u64::from(self.marker_compare)) as u32
    }

    /// High time of a data pulse carrying `bit`
    #[must_use]
    pub fn data_high_us(&self, bit: bool) -> u32 {
        let compare = self.data_compare[usize::from(bit)];
        self.ticks_to_us(u64::from(self.data_period - compare)) as u32
    }

    /// High time of the tail pulse
    #[must_use]
    pub fn tail_high_us(&self) -> u32 {
        self.ticks_to_us(u64::from(self.tail_period - self.tail_compare)) as u32
    }

    /// Check that every derived pulse lands in its receiver class
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Timing`] naming the first pulse out of tolerance.
    pub fn verify(&self) -> Result<()> {
        let marker = self.marker_high_us();
        if marker <= MARKER_MIN_US {
            return Err(CodecError::Timing(format!(
                "marker high time {}us must exceed {}us",
                marker, MARKER_MIN_US
            )));
        }

        let zero = self.data_high_us(false);
        if !(TAIL_MAX_US..=ONE_MIN_US).contains(&zero) {
            return Err(CodecError::Timing(format!(
                "logical 0 high time {}us must be within {}..={}us",
                zero, TAIL_MAX_US, ONE_MIN_US
            )));
        }

        let one = self.data_high_us(true);
        if one <= ONE_MIN_US || one > MARKER_MIN_US {
            return Err(CodecError::Timing(format!(
                "logical 1 high time {}us must be within {}..={}us",
                one,
                ONE_MIN_US + 1,
                MARKER_MIN_US
            )));
        }

        let tail = self.tail_high_us();
        if tail == 0 || tail >= TAIL_MAX_US {
            return Err(CodecError::Timing(format!(
                "tail high time {}us must be within 1..{}us",
                tail, TAIL_MAX_US
            )));
        }

        Ok(())
    }
}
