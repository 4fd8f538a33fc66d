//! # Frame Transmitter
//!
//! Transmit-side state machine. The waveform is produced entirely by a PWM
//! timer; the two timer events only reload registers for the *next* period.
//!
//! A transmission spans 67 timer periods:
//!
//! ```text
//! bit_index  -2        -1        0 .. 63        64
//!          [marker] [short]   [data bits]    [tail]  → stop at 65
//! ```
//!
//! The setup period only exists to let the first register loads propagate
//! and emits the marker. Polarity is inverted from the marker period on, so
//! that period is a short high pulse after the marker. The receiver shifts it
//! in as a 0 and it falls out of the 64-bit buffer before the tail.

use tracing::info;

use super::channel::PwmChannel;
use crate::protocol::wire::{DATA_BITS, TAIL_BITS};
use crate::protocol::{Frame, LinkState, WaveformTiming};

/// Bit index loaded by `send`: one setup period, one marker period
pub const SEND_START_INDEX: i8 = -2;

/// TX context driving one PWM channel
#[derive(Debug)]
pub struct Transmitter<C: PwmChannel> {
    channel: C,
    timing: WaveformTiming,
    state: LinkState,
    bit_index: i8,
    frame: Frame,
}

impl<C: PwmChannel> Transmitter<C> {
    /// Initialise the transmitter with precomputed register values
    ///
    /// The channel is stopped and the transmitter left idle.
    pub fn new(mut channel: C, timing: WaveformTiming) -> Self {
        channel.stop();

        info!(
            "Transmitter ready: marker {}/{}, data {:?}/{}, tail {}/{} ticks at {}Hz",
            timing.marker_compare,
            timing.marker_period,
            timing.data_compare,
            timing.data_period,
            timing.tail_compare,
            timing.tail_period,
            timing.clock_hz
        );

        Self {
            channel,
            timing,
            state: LinkState::Idle,
            bit_index: 0,
            frame: Frame::EMPTY,
        }
    }

    /// Start transmitting `frame`
    ///
    /// Any transmission in progress is aborted first; nothing is queued.
    pub fn send(&mut self, frame: Frame) {
        self.halt();

        self.frame = frame;
        self.channel.set_inverted(false);
        self.bit_index = SEND_START_INDEX;

        self.channel.reset_counter();
        self.channel.set_compare(self.timing.marker_compare);
        self.channel.set_period(self.timing.marker_period);

        self.channel.enable_compare_event();
        self.state = LinkState::Run;
        self.channel.start();
    }

    /// Abort any transmission and halt the timer
    pub fn stop(&mut self) {
        self.halt();
        if self.state == LinkState::Run {
            self.state = LinkState::Stop;
        }
    }

    /// Overflow (end of period) event: advance to the next pulse
    #[inline]
    pub fn on_overflow(&mut self) {
        if self.state != LinkState::Run {
            return;
        }

        self.bit_index = self.bit_index.saturating_add(1);
        match self.bit_index {
            0 => {
                // Data and tail pulses are measured on the high phase after compare
                self.channel.set_inverted(true);
                self.channel.set_period(self.timing.data_period);
            }
            -1 => {
                // Invert one period early; the marker period then ends in a
                // short high that the receiver shifts in and drops
                self.channel.set_inverted(true);
            }
            i if i == DATA_BITS + TAIL_BITS => {
                self.state = LinkState::Stop;
                self.halt();
            }
            i if i == DATA_BITS => {
                self.channel.set_period(self.timing.tail_period);
            }
            _ => {}
        }
    }

    /// Compare-match event: load the duty point for the next pulse
    #[inline]
    pub fn on_compare(&mut self) {
        if self.state != LinkState::Run {
            return;
        }

        let next = self.bit_index.saturating_add(1);
        if next == DATA_BITS {
            self.channel.set_compare(self.timing.tail_compare);
        } else if (0..DATA_BITS).contains(&next) {
            let bit = self.frame.bit(next as usize);
            self.channel.set_compare(self.timing.data_compare[usize::from(bit)]);
        }
    }

    /// Current state
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Whether a frame is being transmitted
    pub fn is_busy(&self) -> bool {
        self.state == LinkState::Run
    }

    /// Position within the current transmission
    pub fn bit_index(&self) -> i8 {
        self.bit_index
    }

    /// Frame most recently passed to `send`
    pub fn frame(&self) -> Frame {
        self.frame
    }

    /// Register values in use
    pub fn timing(&self) -> &WaveformTiming {
        &self.timing
    }

    /// Underlying channel
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Underlying channel, mutably
    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    fn halt(&mut self) {
        self.channel.disable_compare_event();
        self.channel.stop();
    }
}
