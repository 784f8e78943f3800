//! Synthetic moisture readings.

use chrono::NaiveDateTime;
use loam_proto::{ClientMessage, Measurement};

use crate::{
    auth::format_timestamp,
    status::{MoistureStatus, Thresholds},
};

/// One classified reading, before it is put on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reading {
    /// Moisture level in percent
    pub level: u8,
    /// Band the level falls into
    pub status: MoistureStatus,
}

impl Reading {
    /// Classify `level` against `thresholds`.
    ///
    /// Levels above 100 are clamped.
    #[must_use]
    pub fn new(level: u8, thresholds: &Thresholds) -> Self {
        let level = level.min(100);
        Self { level, status: thresholds.classify(level) }
    }

    /// Build the `measurement` message for this reading.
    #[must_use]
    pub fn to_message(&self, device_id: &str, now: NaiveDateTime) -> ClientMessage {
        ClientMessage::Measurement(Measurement {
            device_id: device_id.to_string(),
            moisture_level: self.level,
            timestamp: format_timestamp(now),
        })
    }
}
