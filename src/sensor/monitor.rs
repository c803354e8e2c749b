//! Sensor states and the capped event log.

use std::collections::VecDeque;

use chrono::{DateTime, Local};

use super::alert::{AlertEvaluator, Event, SensorState};
use super::{Readings, SensorId, Threshold};

/// Maximum number of events kept in the log.
pub const MAX_EVENTS: usize = 50;

/// Everything the dashboard renders about the sensors.
///
/// Each [`Monitor::apply`] call is one atomic update: all three sensors
/// are evaluated and any resulting events are logged before it returns.
#[derive(Debug, Clone, Default)]
pub struct Monitor {
    sensors: [SensorState; 3],
    events: VecDeque<Event>,
    evaluator: AlertEvaluator,
    lines_applied: u64,
}

impl Monitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a monitor around an existing evaluator.
    pub fn with_evaluator(evaluator: AlertEvaluator) -> Self {
        Self {
            evaluator,
            ..Self::default()
        }
    }

    /// Apply one line of readings, returning the number of new events.
    pub fn apply(&mut self, readings: &Readings, threshold: Threshold) -> usize {
        self.apply_at(readings, threshold, Local::now())
    }

    /// Apply one line of readings with an explicit timestamp.
    pub fn apply_at(
        &mut self,
        readings: &Readings,
        threshold: Threshold,
        now: DateTime<Local>,
    ) -> usize {
        let evaluation = self.evaluator.evaluate_at(readings.rounded(), threshold, now);
        self.sensors = evaluation.states;
        self.lines_applied += 1;

        let added = evaluation.events.len();
        // Prepend as a block so the pass keeps sensor order at the front
        for event in evaluation.events.into_iter().rev() {
            self.events.push_front(event);
        }
        self.events.truncate(MAX_EVENTS);
        added
    }

    /// Re-evaluate the displayed sensors against a new threshold.
    ///
    /// Statuses follow the threshold immediately; transition events wait
    /// for the next reading.
    pub fn rethreshold(&mut self, threshold: Threshold) {
        for state in &mut self.sensors {
            *state = SensorState::evaluate(state.reading, threshold);
        }
    }

    /// Zero the displayed readings after a reconnect.
    ///
    /// The event log and the evaluator's previous statuses are kept.
    pub fn reset_readings(&mut self, threshold: Threshold) {
        self.sensors = [SensorState::evaluate(0, threshold); 3];
    }

    /// Current state of one sensor.
    pub fn sensor(&self, id: SensorId) -> &SensorState {
        &self.sensors[id.index()]
    }

    /// All sensor states in [`SensorId::ALL`] order.
    pub fn sensors(&self) -> &[SensorState; 3] {
        &self.sensors
    }

    /// Logged events, newest first.
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Number of sensors currently above the threshold.
    pub fn alerting_count(&self) -> usize {
        self.sensors.iter().filter(|s| s.is_alerting).count()
    }

    /// Number of lines applied since startup.
    pub fn lines_applied(&self) -> u64 {
        self.lines_applied
    }
}
