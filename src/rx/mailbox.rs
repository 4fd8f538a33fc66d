//! # Frame Mailbox
//!
//! Single-slot handoff of completed frames from interrupt context to the
//! polling consumer.
//!
//! # Memory Ordering
//!
//! - Producer stores the frame, bumps the counter, then sets `ready` with `Release`
//! - Consumer clears `ready` with `AcqRel` and loads the frame with `Acquire`
//!
//! The frame travels as one `AtomicU64`, so the consumer can never observe a
//! half-written buffer. If two frames complete between polls, the newer one
//! replaces the older.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use crate::protocol::Frame;

/// Latest-wins slot for completed frames
#[derive(Debug, Default)]
pub struct FrameMailbox {
    frame: AtomicU64,
    ready: AtomicBool,
    completed: AtomicU32,
}

impl FrameMailbox {
    /// Create an empty mailbox
    #[must_use]
    pub const fn new() -> Self {
        Self {
            frame: AtomicU64::new(0),
            ready: AtomicBool::new(false),
            completed: AtomicU32::new(0),
        }
    }

    /// Publish a completed frame. Never blocks, never allocates.
    #[inline]
    pub fn publish(&self, frame: Frame) {
        self.frame.store(frame.raw(), Ordering::Release);
        self.completed.fetch_add(1, Ordering::AcqRel);
        self.ready.store(true, Ordering::Release);
    }

    /// Completion flag: a frame has been published and not yet taken
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Take the pending frame, clearing the completion flag
    pub fn take(&self) -> Option<Frame> {
        if self.ready.swap(false, Ordering::AcqRel) {
            Some(Frame::from_raw(self.frame.load(Ordering::Acquire)))
        } else {
            None
        }
    }

    /// Last completed frame, whether or not it has been taken
    pub fn latest(&self) -> Option<Frame> {
        if self.completed() == 0 {
            return None;
        }
        Some(Frame::from_raw(self.frame.load(Ordering::Acquire)))
    }

    /// Number of frames published since creation (wrapping)
    pub fn completed(&self) -> u32 {
        self.completed.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_empty_mailbox() {
        let mailbox = FrameMailbox::new();
        assert!(!mailbox.is_ready());
        assert_eq!(mailbox.take(), None);
        assert_eq!(mailbox.latest(), None);
        assert_eq!(mailbox.completed(), 0);
    }

    #[test]
    fn test_publish_then_take() {
        let mailbox = FrameMailbox::new();
        mailbox.publish(Frame::from_raw(0xABCD));

        assert!(mailbox.is_ready());
        assert_eq!(mailbox.take(), Some(Frame::from_raw(0xABCD)));
        assert!(!mailbox.is_ready());
        assert_eq!(mailbox.take(), None);
    }

    #[test]
    fn test_latest_survives_take() {
        let mailbox = FrameMailbox::new();
        mailbox.publish(Frame::from_raw(7));
        mailbox.take();
        assert_eq!(mailbox.latest(), Some(Frame::from_raw(7)));
    }

    #[test]
    fn test_newer_frame_replaces_unread_one() {
        let mailbox = FrameMailbox::new();
        mailbox.publish(Frame::from_raw(1));
        mailbox.publish(Frame::from_raw(2));

        assert_eq!(mailbox.completed(), 2);
        assert_eq!(mailbox.take(), Some(Frame::from_raw(2)));
        assert_eq!(mailbox.take(), None);
    }

    #[test]
    fn test_cross_thread_handoff_is_never_torn() {
        let mailbox = Arc::new(FrameMailbox::new());
        let producer = {
            let mailbox = Arc::clone(&mailbox);
            std::thread::spawn(move || {
                for i in 0..10_000u64 {
                    // Both halves carry the same value so a torn read is detectable
                    mailbox.publish(Frame::from_raw((i << 32) | i));
                }
            })
        };

        let mut seen = 0;
        while !producer.is_finished() || mailbox.is_ready() {
            if let Some(frame) = mailbox.take() {
                let raw = frame.raw();
                assert_eq!(raw >> 32, raw & 0xFFFF_FFFF);
                seen += 1;
            }
        }
        producer.join().unwrap();

        assert!(seen >= 1);
        assert_eq!(mailbox.completed(), 10_000);
    }
}
