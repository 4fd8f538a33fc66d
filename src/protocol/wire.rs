//! # Wire Constants and Link State
//!
//! Timing thresholds and waveform reference values shared by the receive and
//! transmit paths.
//!
//! ```text
//!            _________________________
//! [ MARKER :/          512us          \ 20us ]  period = 532us | 1879Hz
//!                                 _________
//! [ LOW    :\____125-145us_______/ 65-72us \ ]  period = 198us | 5050Hz
//!                          ________________
//! [ HIGH   :\___52-58us___/    138-144us   \ ]  period = 198us | 5050Hz
//!                                    ______
//! [ TAIL   :\__________89us_________/ 20us \ ]  period = 109us | 9174Hz
//! ```
//!
//! The receiver only measures the high time of each pulse.

/// High time above which a pulse is a frame marker (µs)
pub const MARKER_MIN_US: u32 = 400;

/// High time below which a pulse may close a frame (µs)
pub const TAIL_MAX_US: u32 = 40;

/// High time above which a data pulse is a logical 1 (µs)
pub const ONE_MIN_US: u32 = 100;

/// Number of data bits in a frame
pub const DATA_BITS: i8 = 64;

/// Number of tail pulses after the data bits
pub const TAIL_BITS: i8 = 1;

/// Marker reference frequency (532us period)
pub const MARKER_FREQ_HZ: u32 = 1879;

/// Marker duty point as a fraction of its period
pub const MARKER_DUTY: (u32, u32) = (512, 532);

/// Data bit reference frequency (198us period)
pub const DATA_FREQ_HZ: u32 = 5050;

/// Logical 0 duty point (130 = midpoint of 125-135us low time)
pub const DATA_ZERO_DUTY: (u32, u32) = (130, 198);

/// Logical 1 duty point (55 = midpoint of 52-58us low time)
pub const DATA_ONE_DUTY: (u32, u32) = (55, 198);

/// Tail reference frequency (109us period)
pub const TAIL_FREQ_HZ: u32 = 9174;

/// Tail duty point as a fraction of its period
pub const TAIL_DUTY: (u32, u32) = (89, 109);

/// State of a receive or transmit state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    /// Waiting for a marker (RX) or a send request (TX)
    #[default]
    Idle,
    /// Accumulating (RX) or driving (TX) a frame
    Run,
    /// Transmission finished and the timer is halted
    Stop,
}
