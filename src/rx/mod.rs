//! # Receive Path
//!
//! Reconstructs frames from edge timestamps on the input line.
//!
//! This module handles:
//! - Measuring high-pulse widths from rising/falling timestamps
//! - Classifying pulses as marker, data bit or tail
//! - Assembling 64 data bits between a marker and a tail
//! - Handing completed frames to the polling consumer

pub mod edge;
pub mod classifier;
pub mod mailbox;
pub mod receiver;

pub use edge::{Edge, EdgeTimer};
pub use mailbox::FrameMailbox;
pub use receiver::Receiver;
