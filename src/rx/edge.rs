//! # Edge Timer
//!
//! Turns rising/falling transition timestamps into high-pulse widths.

/// Direction of a transition on the input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Low to high
    Rising,
    /// High to low
    Falling,
}

/// Tracks the last rising edge and measures the high time up to the next falling edge
///
/// Timestamps are free-running microsecond counters and may wrap.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeTimer {
    rising_us: Option<u32>,
    falling_us: Option<u32>,
}

impl EdgeTimer {
    /// Create a timer with no recorded edges
    #[must_use]
    pub const fn new() -> Self {
        Self {
            rising_us: None,
            falling_us: None,
        }
    }

    /// Record a transition and return the completed pulse width, if any
    ///
    /// A falling edge yields a width only when a rising edge is pending and the
    /// falling timestamp is after it. Anything else is a stale or bounced edge
    /// and is dropped.
    #[inline]
    pub fn signal(&mut self, edge: Edge, timestamp_us: u32) -> Option<u32> {
        match edge {
            Edge::Rising => {
                self.rising_us = Some(timestamp_us);
                None
            }
            Edge::Falling => {
                self.falling_us = Some(timestamp_us);
                let rising = self.rising_us.take()?;
                let width = timestamp_us.wrapping_sub(rising);

                // Wrapped differences above half range mean the falling edge is older
                if width == 0 || width > u32::MAX / 2 {
                    return None;
                }

                Some(width)
            }
        }
    }

    /// Timestamp of the most recent rising edge still awaiting its falling edge
    #[must_use]
    pub fn pending_rise(&self) -> Option<u32> {
        self.rising_us
    }

    /// Timestamp of the most recent falling edge
    #[must_use]
    pub fn last_fall(&self) -> Option<u32> {
        self.falling_us
    }
}
