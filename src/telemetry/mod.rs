//! # Telemetry Module
//!
//! Consumer-side view of a received frame.
//!
//! This module handles:
//! - Turning a completed frame into a [`Reading`] with derived current/power
//! - Formatting readings as JSON Lines or a human-readable report

pub mod reading;

pub use reading::Reading;
