//! # Simulated PWM Timer
//!
//! A software fast-PWM timer that records the output line as edge
//! timestamps, so the transmitter can drive a receiver without hardware.
//!
//! Each period runs from zero to TOP. Period, compare and polarity are
//! latched at the start of every period. The output starts high
//! (non-inverted) or low (inverted), toggles at the compare point, and the
//! compare and overflow events fire in that order.

use super::channel::PwmChannel;
use super::transmitter::Transmitter;
use crate::rx::Edge;

/// Upper bound on periods per transmission (a frame needs 67)
pub const MAX_PERIODS: usize = 128;

/// Registers latched for the period being generated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivePeriod {
    /// Period length in ticks
    pub period: u32,
    /// Compare point in ticks
    pub compare: u32,
    /// Output polarity
    pub inverted: bool,
}

/// Software PWM channel recording its output as `(edge, timestamp_us)` pairs
#[derive(Debug, Clone)]
pub struct SimulatedTimer {
    clock_hz: u32,
    period: u32,
    compare: u32,
    inverted: bool,
    compare_event: bool,
    running: bool,
    level: bool,
    now_ticks: u64,
    rise_latency_us: u32,
    fall_latency_us: u32,
    edges: Vec<(Edge, u32)>,
}

impl SimulatedTimer {
    /// Create a stopped timer clocked at `clock_hz`, output low
    #[must_use]
    pub fn new(clock_hz: u32) -> Self {
        Self {
            clock_hz,
            period: 0,
            compare: 0,
            inverted: false,
            compare_event: false,
            running: false,
            level: false,
            now_ticks: 0,
            rise_latency_us: 0,
            fall_latency_us: 0,
            edges: Vec::new(),
        }
    }

    /// Delay recorded rising/falling timestamps, as interrupt latency would
    #[must_use]
    pub fn with_latency(mut self, rise_latency_us: u32, fall_latency_us: u32) -> Self {
        self.rise_latency_us = rise_latency_us;
        self.fall_latency_us = fall_latency_us;
        self
    }

    /// Whether the timer is counting
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Current output level
    pub fn level(&self) -> bool {
        self.level
    }

    /// Simulated time in microseconds, wrapping like a hardware `micros()` counter
    pub fn now_us(&self) -> u32 {
        let micros = u128::from(self.now_ticks) * 1_000_000 / u128::from(self.clock_hz);
        micros as u32
    }

    /// Edges recorded so far
    pub fn edges(&self) -> &[(Edge, u32)] {
        &self.edges
    }

    /// Take all recorded edges
    pub fn drain_edges(&mut self) -> Vec<(Edge, u32)> {
        std::mem::take(&mut self.edges)
    }

    /// Move simulated time forward without touching the output
    pub fn idle(&mut self, ticks: u64) {
        self.advance(ticks);
    }

    fn advance(&mut self, ticks: u64) {
        self.now_ticks = self.now_ticks.wrapping_add(ticks);
    }

    fn drive(&mut self, level: bool) {
        if level == self.level {
            return;
        }
        self.level = level;

        let (edge, latency) = if level {
            (Edge::Rising, self.rise_latency_us)
        } else {
            (Edge::Falling, self.fall_latency_us)
        };
        self.edges.push((edge, self.now_us().wrapping_add(latency)));
    }

    fn begin_period(&mut self) -> Option<ActivePeriod> {
        if !self.running {
            return None;
        }

        let active = ActivePeriod {
            period: self.period,
            compare: self.compare.min(self.period),
            inverted: self.inverted,
        };
        self.drive(!active.inverted);
        Some(active)
    }
}

impl PwmChannel for SimulatedTimer {
    fn set_period(&mut self, ticks: u32) {
        self.period = ticks;
    }

    fn set_compare(&mut self, ticks: u32) {
        self.compare = ticks;
    }

    fn set_inverted(&mut self, inverted: bool) {
        self.inverted = inverted;
    }

    fn reset_counter(&mut self) {
        // Every simulated period already starts from zero
    }

    fn enable_compare_event(&mut self) {
        self.compare_event = true;
    }

    fn disable_compare_event(&mut self) {
        self.compare_event = false;
    }

    fn start(&mut self) {
        self.running = true;
    }

    fn stop(&mut self) {
        self.running = false;
        self.drive(false);
    }
}

/// Generate one timer period, firing the transmitter's events
///
/// Returns `false` if the timer is not running.
pub fn step_period(tx: &mut Transmitter<SimulatedTimer>) -> bool {
    let Some(active) = tx.channel_mut().begin_period() else {
        return false;
    };

    let timer = tx.channel_mut();
    timer.advance(u64::from(active.compare));
    timer.drive(active.inverted);
    if timer.compare_event {
        tx.on_compare();
    }

    tx.channel_mut().advance(u64::from(active.period - active.compare));
    tx.on_overflow();
    true
}

/// Run the timer until the transmission stops
///
/// Returns the number of periods generated.
pub fn run_transmission(tx: &mut Transmitter<SimulatedTimer>) -> usize {
    let mut periods = 0;
    while periods < MAX_PERIODS && step_period(tx) {
        periods += 1;
    }
    periods
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::wire::DATA_BITS;
    use crate::protocol::{Frame, FrameRecord, LinkState, WaveformTiming};
    use crate::rx::{FrameMailbox, Receiver};
    use std::sync::Arc;

    const CLOCK_HZ: u32 = 2_000_000;
    const S0: &str = "0000010100110100001100100110000001101010100011100000001011000101";
    const S1: &str = "0000010100110100001100100110000001000001001010010000010000111001";

    fn transmitter(timer: SimulatedTimer) -> Transmitter<SimulatedTimer> {
        Transmitter::new(timer, WaveformTiming::from_clock(CLOCK_HZ).unwrap())
    }

    fn receiver() -> Receiver {
        Receiver::new(5, Arc::new(FrameMailbox::new()))
    }

    fn feed(rx: &mut Receiver, edges: Vec<(Edge, u32)>) {
        for (edge, timestamp) in edges {
            rx.on_edge(edge, timestamp);
        }
    }

    fn high_times(edges: &[(Edge, u32)]) -> Vec<u32> {
        edges
            .chunks(2)
            .map(|pair| {
                assert_eq!(pair[0].0, Edge::Rising);
                assert_eq!(pair[1].0, Edge::Falling);
                pair[1].1 - pair[0].1
            })
            .collect()
    }

    #[test]
    fn test_transmission_length() {
        let mut tx = transmitter(SimulatedTimer::new(CLOCK_HZ));
        tx.send(S0.parse().unwrap());

        assert_eq!(run_transmission(&mut tx), 67);
        assert_eq!(tx.state(), LinkState::Stop);
        assert!(!tx.channel().is_running());
        assert!(!tx.channel().level());
    }

    #[test]
    fn test_waveform_shape() {
        let frame: Frame = S0.parse().unwrap();
        let mut tx = transmitter(SimulatedTimer::new(CLOCK_HZ));
        tx.send(frame);
        run_transmission(&mut tx);

        let highs = high_times(tx.channel().edges());
        // Marker, short high closing the inverted marker period, 64 data bits, tail
        assert_eq!(highs.len(), 67);
        assert_eq!(&highs[..2], &[512, 20]);
        for (i, &high) in highs[2..66].iter().enumerate() {
            let expected = if frame.bit(i) { 143 } else { 68 };
            assert_eq!(high, expected, "bit {}", i);
        }
        assert_eq!(highs[66], 20);
    }

    #[test]
    fn test_round_trip_through_receiver() {
        for bits in [S0, S1] {
            let frame: Frame = bits.parse().unwrap();
            let mut tx = transmitter(SimulatedTimer::new(CLOCK_HZ));
            let mut rx = receiver();

            tx.send(frame);
            run_transmission(&mut tx);
            feed(&mut rx, tx.channel_mut().drain_edges());

            assert_eq!(rx.mailbox().take(), Some(frame));
            assert_eq!(rx.state(), LinkState::Idle);
        }
    }

    #[test]
    fn test_short_pulse_after_marker_is_shifted_out() {
        let frame = Frame::from_raw(u64::MAX);
        let mut tx = transmitter(SimulatedTimer::new(CLOCK_HZ));
        let mut rx = receiver();

        tx.send(frame);
        run_transmission(&mut tx);
        let edges = tx.channel_mut().drain_edges();
        assert_eq!(&high_times(&edges)[..3], &[512, 20, 143]);

        feed(&mut rx, edges);
        // Marker, then 65 data pulses before the tail
        assert_eq!(rx.bit_index(), DATA_BITS + 1);
        assert_eq!(rx.mailbox().take(), Some(frame));
    }

    #[test]
    fn test_round_trip_arbitrary_patterns() {
        let record = FrameRecord::decode(S1.parse().unwrap());
        let patterns = [
            Frame::EMPTY,
            Frame::from_raw(u64::MAX),
            Frame::from_raw(0xAAAA_AAAA_AAAA_AAAA),
            Frame::from_raw(0x0123_4567_89AB_CDEF),
            FrameRecord { current_raw: 0xFFFF, exponent: 15, ..record }.sealed().encode(),
        ];

        let mut tx = transmitter(SimulatedTimer::new(CLOCK_HZ));
        let mut rx = receiver();
        for frame in patterns {
            tx.send(frame);
            run_transmission(&mut tx);
            tx.channel_mut().idle(2_000);
            feed(&mut rx, tx.channel_mut().drain_edges());

            assert_eq!(rx.mailbox().take(), Some(frame), "pattern {:016X}", frame.raw());
        }
    }

    #[test]
    fn test_round_trip_with_interrupt_latency() {
        let frame: Frame = S1.parse().unwrap();
        for (rise, fall) in [(15, 0), (0, 15), (10, 5)] {
            let mut tx = transmitter(SimulatedTimer::new(CLOCK_HZ).with_latency(rise, fall));
            let mut rx = receiver();

            tx.send(frame);
            run_transmission(&mut tx);
            feed(&mut rx, tx.channel_mut().drain_edges());

            assert_eq!(rx.mailbox().take(), Some(frame), "latency {}/{}", rise, fall);
        }
    }

    #[test]
    fn test_clock_survives_long_idle() {
        let mut timer = SimulatedTimer::new(80_000_000);
        timer.idle(u64::MAX / 1_000_000 + 1);
        assert_eq!(timer.now_us(), ((u64::MAX / 1_000_000 + 1) / 80) as u32);

        timer.idle(u64::MAX);
        let _ = timer.now_us();
    }

    #[test]
    fn test_round_trip_across_microsecond_wrap() {
        let frame: Frame = S1.parse().unwrap();
        let mut tx = transmitter(SimulatedTimer::new(CLOCK_HZ));
        let mut rx = receiver();

        // Start 10 ms before the 32-bit microsecond counter wraps
        tx.channel_mut().idle((u64::from(u32::MAX) - 10_000) * 2);
        tx.send(frame);
        run_transmission(&mut tx);
        assert!(tx.channel().now_us() < 10_000);

        feed(&mut rx, tx.channel_mut().drain_edges());
        assert_eq!(rx.mailbox().take(), Some(frame));
    }

    #[test]
    fn test_second_send_aborts_first() {
        let first: Frame = S0.parse().unwrap();
        let second: Frame = S1.parse().unwrap();
        let mut tx = transmitter(SimulatedTimer::new(CLOCK_HZ));
        let mut rx = receiver();

        tx.send(first);
        for _ in 0..10 {
            step_period(&mut tx);
        }
        tx.send(second);
        run_transmission(&mut tx);
        feed(&mut rx, tx.channel_mut().drain_edges());

        assert_eq!(rx.mailbox().completed(), 1);
        assert_eq!(rx.mailbox().take(), Some(second));
    }

    #[test]
    fn test_back_to_back_sends_only_second_transmitted() {
        let first: Frame = S0.parse().unwrap();
        let second: Frame = S1.parse().unwrap();
        let mut tx = transmitter(SimulatedTimer::new(CLOCK_HZ));
        let mut rx = receiver();

        tx.send(first);
        tx.send(second);
        assert_eq!(run_transmission(&mut tx), 67);
        feed(&mut rx, tx.channel_mut().drain_edges());

        assert_eq!(rx.mailbox().completed(), 1);
        assert_eq!(rx.mailbox().take(), Some(second));
    }

    #[test]
    fn test_stop_mid_frame_releases_line() {
        let mut tx = transmitter(SimulatedTimer::new(CLOCK_HZ));
        let mut rx = receiver();

        tx.send(S0.parse().unwrap());
        for _ in 0..20 {
            step_period(&mut tx);
        }
        tx.stop();

        assert!(!step_period(&mut tx));
        assert!(!tx.channel().level());
        feed(&mut rx, tx.channel_mut().drain_edges());
        assert!(!rx.mailbox().is_ready());
        assert_eq!(rx.state(), LinkState::Run);
    }

    #[test]
    fn test_idle_timer_produces_no_edges() {
        let mut tx = transmitter(SimulatedTimer::new(CLOCK_HZ));
        assert!(!step_period(&mut tx));
        assert_eq!(run_transmission(&mut tx), 0);
        assert!(tx.channel().edges().is_empty());
    }
}
