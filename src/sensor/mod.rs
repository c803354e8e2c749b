//! Sensor data pipeline: framing, parsing and alert evaluation.
//!
//! This module turns the raw text coming off the UART into sensor state
//! and an edge-triggered event log.
//!
//! ## Submodules
//!
//! - [`framer`]: Splits an arbitrarily chunked byte stream into trimmed lines
//! - [`parser`]: Recognises the `GAS=`, CSV and JSON line encodings
//! - [`alert`]: Threshold comparison and transition detection ([`AlertEvaluator`])
//! - [`monitor`]: Sensor states plus the capped event log ([`Monitor`])
//!
//! ## Data Flow
//!
//! ```text
//! bytes from device
//!        │
//!        ▼
//! LineFramer::push_bytes()
//!        │
//!        ▼
//! parse_line() ──▶ Unparseable (logged, dropped)
//!        │
//!        ▼
//! Monitor::apply(readings, threshold)
//!        │
//!        ├──▶ SensorState (refreshed every line)
//!        │
//!        └──▶ Event (only on Safe <-> Alerting transitions)
//! ```

pub mod alert;
pub mod framer;
pub mod monitor;
pub mod parser;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use alert::{AlertEvaluator, Event, EventKind, SensorState, SensorStatus};
pub use framer::LineFramer;
pub use monitor::{Monitor, MAX_EVENTS};
pub use parser::{parse_line, ParsedLine, Readings};

/// Identifies one of the three gas sensors on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SensorId {
    Sensor1,
    Sensor2,
    Sensor3,
}

impl SensorId {
    /// All sensors in display and evaluation order.
    pub const ALL: [SensorId; 3] = [SensorId::Sensor1, SensorId::Sensor2, SensorId::Sensor3];

    /// Position of this sensor in [`SensorId::ALL`].
    pub fn index(self) -> usize {
        match self {
            SensorId::Sensor1 => 0,
            SensorId::Sensor2 => 1,
            SensorId::Sensor3 => 2,
        }
    }

    /// Returns the display label for this sensor.
    pub fn label(&self) -> &'static str {
        match self {
            SensorId::Sensor1 => "Sensor 1",
            SensorId::Sensor2 => "Sensor 2",
            SensorId::Sensor3 => "Sensor 3",
        }
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Gas concentration in parts per million, rounded to a whole unit.
pub type Reading = i64;

/// Alert threshold in ppm shared by all sensors.
///
/// Always within `0..=2000`; every constructor clamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub struct Threshold(u16);

impl Threshold {
    pub const MIN: i64 = 0;
    pub const MAX: i64 = 2000;
    pub const DEFAULT: Threshold = Threshold(300);

    /// Quick presets offered by the settings overlay.
    pub const PRESETS: [Threshold; 4] =
        [Threshold(200), Threshold(300), Threshold(500), Threshold(1000)];

    /// Create a threshold, clamping the value into `0..=2000`.
    pub fn new(ppm: i64) -> Self {
        Threshold(ppm.clamp(Self::MIN, Self::MAX) as u16)
    }

    /// The threshold in ppm.
    pub fn ppm(self) -> i64 {
        i64::from(self.0)
    }

    /// Shift the threshold by `delta` ppm, saturating at the bounds.
    pub fn adjusted(self, delta: i64) -> Self {
        Self::new(self.ppm().saturating_add(delta))
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<i64> for Threshold {
    fn from(ppm: i64) -> Self {
        Self::new(ppm)
    }
}

impl From<Threshold> for i64 {
    fn from(threshold: Threshold) -> Self {
        threshold.ppm()
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ppm", self.0)
    }
}
