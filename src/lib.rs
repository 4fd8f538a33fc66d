//! # Efergy Codec Library
//!
//! Receive and re-transmit Efergy E2 current sensor frames.
//!
//! This library provides the pulse-timing codec for the sensor's 433 MHz
//! on/off-keyed link: measuring pulse widths from edge timestamps,
//! assembling 64-bit frames, decoding current and power, and driving a PWM
//! timer to transmit frames in the same waveform.

pub mod config;
pub mod error;
pub mod protocol;
pub mod rx;
pub mod tx;
pub mod telemetry;
