//! Decoded sensor reading as handed to the consumer

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::protocol::layout::checksum_is_good;
use crate::protocol::{Frame, FrameRecord};

/// One received frame with its derived quantities
///
/// `current_ma` and `power_w` are `None` when the exponent is out of range.
/// A failed checksum does not hide any field; it is reported in `checksum_ok`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    /// Time the consumer picked the frame up
    pub timestamp: DateTime<Utc>,

    /// Frame bits in wire order
    pub frame: String,

    /// Sync byte as received
    pub sync: u8,

    /// Transmitter ID
    pub sensor_id: u16,

    /// Current in milliamps
    pub current_ma: Option<u32>,

    /// Power in watts at `reference_voltage`
    pub power_w: Option<u64>,

    /// Voltage used for the power figure
    pub reference_voltage: u32,

    /// Current scale exponent
    pub exponent: u8,

    /// Checksum byte as received
    pub checksum: u8,

    /// Stored checksum matches the payload
    pub checksum_ok: bool,

    /// Battery flag
    pub battery_ok: bool,

    /// Pairing flag
    pub pairing: bool,

    /// Transmit interval, when the code is known
    pub interval_s: Option<u32>,
}

impl Reading {
    /// Decode `frame` into a reading
    pub fn from_frame(frame: Frame, reference_voltage: u32, timestamp: DateTime<Utc>) -> Self {
        let record = FrameRecord::decode(frame);

        Self {
            timestamp,
            frame: frame.to_string(),
            sync: record.sync,
            sensor_id: record.id,
            current_ma: record.current_milliamps().ok(),
            power_w: record.power_watts(reference_voltage).ok(),
            reference_voltage,
            exponent: record.exponent,
            checksum: record.checksum,
            checksum_ok: checksum_is_good(&frame),
            battery_ok: record.battery_ok,
            pairing: record.pairing,
            interval_s: record.interval_seconds(),
        }
    }

    /// Serialize as a single JSON line (no trailing newline)
    pub fn to_json_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let or_dash = |value: Option<String>| value.unwrap_or_else(|| "-".to_string());

        writeln!(f, "frame       : [{}]", self.frame)?;
        writeln!(f, "sync        : {}", self.sync)?;
        writeln!(f, "ID          : {}", self.sensor_id)?;
        writeln!(f, "interval(s) : {}", or_dash(self.interval_s.map(|s| s.to_string())))?;
        writeln!(f, "battery     : {}", if self.battery_ok { "ok" } else { "low" })?;
        writeln!(f, "pairing     : {}", if self.pairing { "yes" } else { "no" })?;
        writeln!(f, "current(mA) : {}", or_dash(self.current_ma.map(|c| c.to_string())))?;
        writeln!(f, "power   (W) : {}", or_dash(self.power_w.map(|p| p.to_string())))?;
        writeln!(f, "exponent    : {}", self.exponent)?;
        write!(
            f,
            "checksum    : {} ({})",
            self.checksum,
            if self.checksum_ok { "pass" } else { "fail" }
        )
    }
}
