//! # Efergy E2 Protocol Module
//!
//! Definitions shared by the receive and transmit paths.
//!
//! This module handles:
//! - Pulse classification thresholds and waveform reference timings
//! - The 64-bit frame buffer in wire order
//! - Field layout, checksum validation and current/power conversion
//! - Timer register derivation for the transmitter

pub mod wire;
pub mod frame;
pub mod layout;
pub mod timing;

pub use frame::Frame;
pub use layout::FrameRecord;
pub use timing::WaveformTiming;
pub use wire::LinkState;
