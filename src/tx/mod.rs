//! # Transmit Path
//!
//! Re-encodes frames into the marker/data/tail waveform using a PWM timer.
//!
//! This module handles:
//! - The PWM channel abstraction the transmitter drives
//! - The overflow/compare event state machine
//! - A simulated timer for loopback operation and tests

pub mod channel;
pub mod transmitter;
pub mod sim;

pub use channel::PwmChannel;
pub use sim::SimulatedTimer;
pub use transmitter::Transmitter;
