//! Moisture status bands.
//!
//! The server configures three ordered upper bounds. A reading falls into
//! the first band whose bound it does not exceed:
//!
//! ```text
//!   level <= red     → DRY
//!   level <= yellow  → LOW
//!   level <= green   → GOOD
//!   otherwise        → WET
//! ```
//!
//! Bounds are expected to satisfy `red <= yellow <= green` but this is not
//! enforced. Misordered bounds are classified by the same left-to-right
//! rule.

use std::fmt;

use loam_proto::ThresholdUpdate;

/// Classification of one moisture reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoistureStatus {
    /// At or below the red bound
    Dry,
    /// Above red, at or below yellow
    Low,
    /// Above yellow, at or below green
    Good,
    /// Above green
    Wet,
}

impl MoistureStatus {
    /// Display label including the band colour.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Dry => "DRY (RED)",
            Self::Low => "LOW (YELLOW)",
            Self::Good => "GOOD (GREEN)",
            Self::Wet => "WET (BLUE)",
        }
    }
}

impl fmt::Display for MoistureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Server-configured band boundaries. All zero until configured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Thresholds {
    /// Upper bound of DRY
    pub red: i64,
    /// Upper bound of LOW
    pub yellow: i64,
    /// Upper bound of GOOD
    pub green: i64,
}

impl Thresholds {
    /// Create a threshold table.
    #[must_use]
    pub const fn new(red: i64, yellow: i64, green: i64) -> Self {
        Self { red, yellow, green }
    }

    /// Override only the fields present in `update`.
    pub fn apply(&mut self, update: &ThresholdUpdate) {
        if let Some(red) = update.red {
            self.red = red;
        }
        if let Some(yellow) = update.yellow {
            self.yellow = yellow;
        }
        if let Some(green) = update.green {
            self.green = green;
        }
    }

    /// Classify a reading against this table.
    #[must_use]
    pub fn classify(&self, level: u8) -> MoistureStatus {
        classify(level, self)
    }
}

/// Absent fields become 0.
impl From<&ThresholdUpdate> for Thresholds {
    fn from(update: &ThresholdUpdate) -> Self {
        Self {
            red: update.red.unwrap_or(0),
            yellow: update.yellow.unwrap_or(0),
            green: update.green.unwrap_or(0),
        }
    }
}

/// Classify `level` against `thresholds`. Equality belongs to the lower band.
#[must_use]
pub fn classify(level: u8, thresholds: &Thresholds) -> MoistureStatus {
    let level = i64::from(level);

    if level <= thresholds.red {
        MoistureStatus::Dry
    } else if level <= thresholds.yellow {
        MoistureStatus::Low
    } else if level <= thresholds.green {
        MoistureStatus::Good
    } else {
        MoistureStatus::Wet
    }
}
