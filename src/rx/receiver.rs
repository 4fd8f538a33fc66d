//! # Frame Receiver
//!
//! Receive-side state machine. One `Receiver` is the whole RX context: it
//! owns the edge timer, the working shift buffer, the bit index and the
//! state. Platform glue registers [`Receiver::on_edge`] as the pin-change
//! handler; the consumer only ever touches the shared [`FrameMailbox`].
//!
//! ```text
//!            marker             64 data bits         tail
//!   IDLE ──────────────▶ RUN ─────────────────▶ RUN ──────▶ IDLE (publish)
//!    ▲                    │ ▲                    │
//!    │                    │ └──── marker ────────┘  (restart, no error)
//!    └── other pulses dropped while IDLE
//! ```

use std::sync::Arc;

use tracing::info;

use super::classifier::{classify, PulseClass};
use super::edge::{Edge, EdgeTimer};
use super::mailbox::FrameMailbox;
use crate::protocol::{Frame, LinkState};

/// RX context for one input line
#[derive(Debug)]
pub struct Receiver {
    input_pin: u8,
    edges: EdgeTimer,
    state: LinkState,
    bit_index: i8,
    shift: Frame,
    mailbox: Arc<FrameMailbox>,
}

impl Receiver {
    /// Create an idle receiver for `input_pin` publishing into `mailbox`
    pub fn new(input_pin: u8, mailbox: Arc<FrameMailbox>) -> Self {
        info!("Receiver listening on input pin {}", input_pin);

        Self {
            input_pin,
            edges: EdgeTimer::new(),
            state: LinkState::Idle,
            bit_index: 0,
            shift: Frame::EMPTY,
            mailbox,
        }
    }

    /// Pin-change handler: feed one transition
    ///
    /// Bounded time, no allocation, no logging.
    #[inline]
    pub fn on_edge(&mut self, edge: Edge, timestamp_us: u32) {
        if let Some(width) = self.edges.signal(edge, timestamp_us) {
            self.on_pulse(width);
        }
    }

    /// Apply one measured high time to the state machine
    pub fn on_pulse(&mut self, width_us: u32) {
        match classify(width_us, self.bit_index) {
            PulseClass::Marker => {
                // A marker always restarts capture, discarding any partial frame
                self.bit_index = 0;
                self.shift = Frame::EMPTY;
                self.state = LinkState::Run;
            }
            _ if self.state != LinkState::Run => {}
            PulseClass::Tail => {
                self.mailbox.publish(self.shift);
                self.state = LinkState::Idle;
            }
            PulseClass::Data(bit) => {
                self.shift.push(bit);
                self.bit_index = self.bit_index.saturating_add(1);
            }
        }
    }

    /// Current state
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Bits received since the last marker (meaningful while running)
    pub fn bit_index(&self) -> i8 {
        self.bit_index
    }

    /// Input pin this receiver was created for
    pub fn input_pin(&self) -> u8 {
        self.input_pin
    }

    /// Working shift buffer (the frame being assembled)
    pub fn working_frame(&self) -> Frame {
        self.shift
    }

    /// Shared completion mailbox
    pub fn mailbox(&self) -> &Arc<FrameMailbox> {
        &self.mailbox
    }
}
