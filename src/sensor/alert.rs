//! Threshold evaluation and edge-triggered alert events.

use chrono::{DateTime, Local};
use serde::Serialize;

use super::{Reading, SensorId, Threshold};

/// Display format for event timestamps.
const TIMESTAMP_FORMAT: &str = "%H:%M:%S";

/// Alert status of a single sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SensorStatus {
    #[default]
    Safe,
    Alerting,
}

impl SensorStatus {
    /// Status for a reading against a threshold. Equal to the threshold is safe.
    pub fn for_reading(reading: Reading, threshold: Threshold) -> Self {
        if reading > threshold.ppm() {
            SensorStatus::Alerting
        } else {
            SensorStatus::Safe
        }
    }

    /// Returns the badge text for this status.
    pub fn label(&self) -> &'static str {
        match self {
            SensorStatus::Safe => "Safe",
            SensorStatus::Alerting => "Gas Detected",
        }
    }
}

/// Current state of one sensor.
///
/// Only built through [`SensorState::evaluate`], which keeps
/// `is_alerting` and `status` consistent with the reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SensorState {
    pub reading: Reading,
    pub status: SensorStatus,
    pub is_alerting: bool,
}

impl SensorState {
    pub fn evaluate(reading: Reading, threshold: Threshold) -> Self {
        let status = SensorStatus::for_reading(reading, threshold);
        Self {
            reading,
            status,
            is_alerting: status == SensorStatus::Alerting,
        }
    }
}

/// Kind of logged event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventKind {
    /// A sensor crossed above the threshold.
    Alert,
    /// A sensor dropped back to or below the threshold.
    Normal,
}

/// A status transition, recorded once and never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub id: u64,
    pub message: String,
    pub timestamp: String,
    pub kind: EventKind,
}

/// Result of evaluating one line of readings.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// New state for each sensor, in [`SensorId::ALL`] order.
    pub states: [SensorState; 3],
    /// Transition events in sensor order.
    pub events: Vec<Event>,
}

/// Detects status transitions across successive readings.
///
/// Holds the last known status of every sensor and the event id counter.
/// One evaluator must live for the whole process; recreating it forgets
/// the previous statuses and fires duplicate events.
#[derive(Debug, Clone)]
pub struct AlertEvaluator {
    previous: [SensorStatus; 3],
    next_id: u64,
}

impl Default for AlertEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertEvaluator {
    /// Create an evaluator with every sensor previously safe.
    pub fn new() -> Self {
        Self::with_previous([SensorStatus::Safe; 3])
    }

    /// Create an evaluator with injected previous statuses.
    pub fn with_previous(previous: [SensorStatus; 3]) -> Self {
        Self {
            previous,
            next_id: 1,
        }
    }

    /// Last recorded status of a sensor.
    pub fn previous(&self, id: SensorId) -> SensorStatus {
        self.previous[id.index()]
    }

    /// Evaluate readings stamped with the current local time.
    pub fn evaluate(&mut self, readings: [Reading; 3], threshold: Threshold) -> Evaluation {
        self.evaluate_at(readings, threshold, Local::now())
    }

    /// Evaluate readings against the threshold at a given time.
    pub fn evaluate_at(
        &mut self,
        readings: [Reading; 3],
        threshold: Threshold,
        now: DateTime<Local>,
    ) -> Evaluation {
        let timestamp = now.format(TIMESTAMP_FORMAT).to_string();
        let mut events = Vec::new();

        let states = SensorId::ALL.map(|id| {
            let state = SensorState::evaluate(readings[id.index()], threshold);
            let previous = &mut self.previous[id.index()];

            if *previous != state.status {
                let (message, kind) = match state.status {
                    SensorStatus::Alerting => (
                        format!("{} detected gas at {} ppm", id, state.reading),
                        EventKind::Alert,
                    ),
                    SensorStatus::Safe => (
                        format!("{} returned to safe level ({} ppm)", id, state.reading),
                        EventKind::Normal,
                    ),
                };
                events.push(Event {
                    id: self.next_id,
                    message,
                    timestamp: timestamp.clone(),
                    kind,
                });
                self.next_id += 1;
                *previous = state.status;
            }

            state
        });

        Evaluation { states, events }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strictly_greater_than_alerts() {
        let t = Threshold::new(300);
        assert_eq!(SensorStatus::for_reading(300, t), SensorStatus::Safe);
        assert_eq!(SensorStatus::for_reading(301, t), SensorStatus::Alerting);
        assert_eq!(SensorStatus::for_reading(-1, Threshold::new(0)), SensorStatus::Safe);
    }

    #[test]
    fn test_alerting_flag_matches_status() {
        for threshold in [0, 1, 299, 300, 2000] {
            for reading in [-10, 0, 1, 300, 301, 2001] {
                let t = Threshold::new(threshold);
                let state = SensorState::evaluate(reading, t);
                assert_eq!(state.is_alerting, reading > t.ppm());
                assert_eq!(state.is_alerting, state.status == SensorStatus::Alerting);
            }
        }
    }

    #[test]
    fn test_transition_into_alerting_emits_event() {
        let mut evaluator = AlertEvaluator::new();
        let eval = evaluator.evaluate([450, 0, 0], Threshold::new(300));

        assert_eq!(eval.events.len(), 1);
        assert_eq!(eval.events[0].message, "Sensor 1 detected gas at 450 ppm");
        assert_eq!(eval.events[0].kind, EventKind::Alert);
        assert_eq!(evaluator.previous(SensorId::Sensor1), SensorStatus::Alerting);
    }

    #[test]
    fn test_repeated_status_emits_nothing_but_refreshes_state() {
        let mut evaluator = AlertEvaluator::new();
        let t = Threshold::new(300);
        evaluator.evaluate([450, 0, 0], t);

        let eval = evaluator.evaluate([500, 0, 0], t);
        assert!(eval.events.is_empty());
        assert_eq!(eval.states[0].reading, 500);
        assert!(eval.states[0].is_alerting);
    }

    #[test]
    fn test_return_to_safe_message() {
        let mut evaluator =
            AlertEvaluator::with_previous([SensorStatus::Safe, SensorStatus::Alerting, SensorStatus::Safe]);
        let eval = evaluator.evaluate([0, 120, 0], Threshold::new(300));

        assert_eq!(eval.events.len(), 1);
        assert_eq!(eval.events[0].message, "Sensor 2 returned to safe level (120 ppm)");
        assert_eq!(eval.events[0].kind, EventKind::Normal);
    }

    #[test]
    fn test_events_in_sensor_order_with_increasing_ids() {
        let mut evaluator = AlertEvaluator::new();
        let eval = evaluator.evaluate([400, 0, 500], Threshold::new(300));

        let messages: Vec<&str> = eval.events.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec!["Sensor 1 detected gas at 400 ppm", "Sensor 3 detected gas at 500 ppm"]
        );
        assert!(eval.events[0].id < eval.events[1].id);
    }

    #[test]
    fn test_timestamp_is_wall_clock_time() {
        use chrono::TimeZone;

        let now = Local.with_ymd_and_hms(2024, 3, 1, 14, 5, 9).unwrap();
        let mut evaluator = AlertEvaluator::new();
        let eval = evaluator.evaluate_at([301, 0, 0], Threshold::new(300), now);
        assert_eq!(eval.events[0].timestamp, "14:05:09");
    }
}
