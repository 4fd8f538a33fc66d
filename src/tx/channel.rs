//! Trait abstraction for the PWM timer channel driving the output pin

/// Timer/PWM output channel operations used by the transmitter
///
/// Register values are in timer clock ticks. Period and compare writes take
/// effect from the next period, like double-buffered hardware registers.
#[cfg_attr(test, mockall::automock)]
pub trait PwmChannel: Send {
    /// Set the period (TOP) in ticks
    fn set_period(&mut self, ticks: u32);

    /// Set the compare (duty point) in ticks
    fn set_compare(&mut self, ticks: u32);

    /// Select output polarity: `false` is high until compare, `true` is low until compare
    fn set_inverted(&mut self, inverted: bool);

    /// Reset the timer counter to zero
    fn reset_counter(&mut self);

    /// Enable the compare-match event
    fn enable_compare_event(&mut self);

    /// Disable the compare-match event
    fn disable_compare_event(&mut self);

    /// Start counting and driving the output
    fn start(&mut self);

    /// Stop counting and release the output low
    fn stop(&mut self);
}
