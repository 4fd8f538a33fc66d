//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{CodecError, Result};
use crate::protocol::layout::MAX_EXPONENT;
use crate::protocol::wire::TAIL_MAX_US;
use crate::protocol::WaveformTiming;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub receiver: ReceiverConfig,
    #[serde(default)]
    pub transmitter: TransmitterConfig,
    #[serde(default)]
    pub sensor: SensorConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Receive path configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ReceiverConfig {
    #[serde(default = "default_input_pin")]
    pub input_pin: u8,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

/// Transmit path configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TransmitterConfig {
    #[serde(default = "default_output_channel")]
    pub output_channel: u8,

    #[serde(default = "default_timer_clock_hz")]
    pub timer_clock_hz: u32,
}

/// Sensor the loopback transmitter impersonates
#[derive(Debug, Deserialize, Clone)]
pub struct SensorConfig {
    #[serde(default = "default_sensor_id")]
    pub id: u16,

    #[serde(default = "default_current_raw")]
    pub current_raw: u16,

    #[serde(default = "default_exponent")]
    pub exponent: u8,

    #[serde(default = "default_interval_code")]
    pub interval_code: u8,

    #[serde(default = "default_battery_ok")]
    pub battery_ok: bool,

    #[serde(default)]
    pub pairing: bool,

    #[serde(default = "default_reference_voltage")]
    pub reference_voltage: u32,

    #[serde(default = "default_transmit_interval_ms")]
    pub transmit_interval_ms: u64,
}

/// Simulated line characteristics
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SimulationConfig {
    #[serde(default)]
    pub rise_latency_us: u32,

    #[serde(default)]
    pub fall_latency_us: u32,
}

/// Reading output configuration
#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_output_format")]
    pub format: String,
}

// Default value functions
fn default_input_pin() -> u8 { 5 }
fn default_poll_interval_ms() -> u64 { 50 }

fn default_output_channel() -> u8 { 1 }
fn default_timer_clock_hz() -> u32 { 2_000_000 }

fn default_sensor_id() -> u16 { 0x3432 }
fn default_current_raw() -> u16 { 0x4129 }
fn default_exponent() -> u8 { 4 }
fn default_interval_code() -> u8 { 0b11 }
fn default_battery_ok() -> bool { true }
fn default_reference_voltage() -> u32 { 240 }
fn default_transmit_interval_ms() -> u64 { 6000 }

fn default_output_format() -> String { "jsonl".to_string() }

/// Largest simulated latency that keeps the tail pulse under its threshold
const MAX_LATENCY_US: u32 = TAIL_MAX_US / 2 - 5;

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            input_pin: default_input_pin(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for TransmitterConfig {
    fn default() -> Self {
        Self {
            output_channel: default_output_channel(),
            timer_clock_hz: default_timer_clock_hz(),
        }
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            id: default_sensor_id(),
            current_raw: default_current_raw(),
            exponent: default_exponent(),
            interval_code: default_interval_code(),
            battery_ok: default_battery_ok(),
            pairing: false,
            reference_voltage: default_reference_voltage(),
            transmit_interval_ms: default_transmit_interval_ms(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_output_format(),
        }
    }
}

fn invalid(message: impl std::fmt::Display) -> CodecError {
    CodecError::Config(toml::de::Error::custom(message))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use efergy_codec::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.receiver.poll_interval_ms == 0 || self.receiver.poll_interval_ms > 10000 {
            return Err(invalid("poll_interval_ms must be between 1 and 10000"));
        }

        if !(1_000_000..=80_000_000).contains(&self.transmitter.timer_clock_hz) {
            return Err(invalid("timer_clock_hz must be between 1000000 and 80000000"));
        }

        // Derived pulses must still classify correctly at the receiver
        WaveformTiming::from_clock(self.transmitter.timer_clock_hz)
            .map_err(|e| invalid(format!("timer_clock_hz: {}", e)))?;

        if self.sensor.exponent > MAX_EXPONENT {
            return Err(invalid(format!("exponent must be between 0 and {}", MAX_EXPONENT)));
        }

        if self.sensor.interval_code > 0b11 {
            return Err(invalid("interval_code must be between 0 and 3"));
        }

        if self.sensor.reference_voltage == 0 || self.sensor.reference_voltage > 1000 {
            return Err(invalid("reference_voltage must be between 1 and 1000"));
        }

        if self.sensor.transmit_interval_ms == 0 || self.sensor.transmit_interval_ms > 600_000 {
            return Err(invalid("transmit_interval_ms must be between 1 and 600000"));
        }

        for (name, value) in [
            ("rise_latency_us", self.simulation.rise_latency_us),
            ("fall_latency_us", self.simulation.fall_latency_us),
        ] {
            if value > MAX_LATENCY_US {
                return Err(invalid(format!(
                    "{} must be between 0 and {}",
                    name, MAX_LATENCY_US
                )));
            }
        }

        if self.output.format != "jsonl" && self.output.format != "text" {
            return Err(invalid("output format must be 'jsonl' or 'text'"));
        }

        Ok(())
    }
}
