//! Line parsing for the three supported telemetry encodings.
//!
//! Firmware variants emit one of:
//!
//! - `GAS=123.4`: a single reading for sensor 1
//! - `10, 20, 30`: comma-separated readings for sensors 1-3
//! - `{"sensor1":5,"sensor2":6,"sensor3":7}`: a JSON object
//!
//! Rules are tried in that order and the first match wins. A line that
//! opens with `{` is never claimed by the comma rule, since every JSON
//! object with more than one field contains a comma.

use serde::Deserialize;
use serde_json::Value;

use super::{Reading, SensorId};

/// Raw (unrounded) readings for the three sensors.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Readings(pub [f64; 3]);

impl Readings {
    pub fn new(sensor1: f64, sensor2: f64, sensor3: f64) -> Self {
        Self([sensor1, sensor2, sensor3])
    }

    /// Raw value for one sensor.
    pub fn get(&self, id: SensorId) -> f64 {
        self.0[id.index()]
    }

    /// Readings rounded to whole ppm, in [`SensorId::ALL`] order.
    ///
    /// Halves round toward positive infinity, so `-2.5` becomes `-2`.
    pub fn rounded(&self) -> [Reading; 3] {
        self.0.map(round_half_up)
    }
}

fn round_half_up(value: f64) -> Reading {
    let floor = value.floor();
    if value - floor >= 0.5 {
        (floor as Reading).saturating_add(1)
    } else {
        floor as Reading
    }
}

/// Outcome of parsing one line.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    /// `GAS=` token; only sensor 1 is populated.
    SingleValue(Readings),
    /// Comma-separated values.
    CsvTriple(Readings),
    /// JSON object with `sensor1`..`sensor3` fields.
    JsonTriple(Readings),
    /// No rule matched, or the JSON was malformed.
    Unparseable,
}

impl ParsedLine {
    /// The readings, if the line was recognised.
    pub fn readings(&self) -> Option<Readings> {
        match self {
            ParsedLine::SingleValue(r) | ParsedLine::CsvTriple(r) | ParsedLine::JsonTriple(r) => {
                Some(*r)
            }
            ParsedLine::Unparseable => None,
        }
    }

    /// Short name of the encoding, used in logs.
    pub fn format_name(&self) -> &'static str {
        match self {
            ParsedLine::SingleValue(_) => "single",
            ParsedLine::CsvTriple(_) => "csv",
            ParsedLine::JsonTriple(_) => "json",
            ParsedLine::Unparseable => "unparseable",
        }
    }
}

/// A parse rule: returns `None` when it does not apply to the line.
type Rule = fn(&str) -> Option<ParsedLine>;

/// Rules in priority order.
const RULES: [Rule; 3] = [parse_gas_token, parse_csv, parse_json];

/// Parse a trimmed line into readings.
pub fn parse_line(line: &str) -> ParsedLine {
    RULES
        .iter()
        .find_map(|rule| rule(line))
        .unwrap_or(ParsedLine::Unparseable)
}

/// `GAS=` followed by `\d+\.?\d*`.
fn parse_gas_token(line: &str) -> Option<ParsedLine> {
    // Every occurrence is tried, matching an unanchored regex search
    line.match_indices("GAS=").find_map(|(start, token)| {
        let literal = numeric_prefix(&line[start + token.len()..])?;
        let value = literal.parse::<f64>().ok()?;
        Some(ParsedLine::SingleValue(Readings::new(value, 0.0, 0.0)))
    })
}

/// Longest prefix of the form `\d+\.?\d*`.
fn numeric_prefix(s: &str) -> Option<&str> {
    let int_len = s.bytes().take_while(u8::is_ascii_digit).count();
    if int_len == 0 {
        return None;
    }

    let rest = &s[int_len..];
    let Some(fraction) = rest.strip_prefix('.') else {
        return Some(&s[..int_len]);
    };
    let frac_len = fraction.bytes().take_while(u8::is_ascii_digit).count();
    Some(&s[..int_len + 1 + frac_len])
}

/// Longest leading float literal: optional sign, digits with an optional
/// fraction, then an optional exponent. Trailing text such as a unit is
/// ignored.
fn float_prefix(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    let digits_from = |start: usize| {
        bytes[start..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_len = digits_from(end);
    end += int_len;

    let mut frac_len = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_len = digits_from(end + 1);
        if int_len > 0 || frac_len > 0 {
            end += 1 + frac_len;
        }
    }
    if int_len == 0 && frac_len == 0 {
        return None;
    }

    // The exponent only counts when digits follow it
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_len = digits_from(exp);
        if exp_len > 0 {
            end = exp + exp_len;
        }
    }
    Some(&s[..end])
}

/// Value of one CSV segment; anything without a finite leading number is zero.
fn csv_value(segment: &str) -> f64 {
    float_prefix(segment.trim())
        .and_then(|literal| literal.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

fn parse_csv(line: &str) -> Option<ParsedLine> {
    if !line.contains(',') || line.starts_with('{') {
        return None;
    }

    let mut values = [0.0; 3];
    for (slot, segment) in values.iter_mut().zip(line.split(',')) {
        *slot = csv_value(segment);
    }
    Some(ParsedLine::CsvTriple(Readings(values)))
}

/// JSON payload; fields that are absent or not numbers read as zero.
#[derive(Debug, Deserialize)]
struct JsonReadings {
    #[serde(default)]
    sensor1: Value,
    #[serde(default)]
    sensor2: Value,
    #[serde(default)]
    sensor3: Value,
}

fn parse_json(line: &str) -> Option<ParsedLine> {
    if !line.starts_with('{') {
        return None;
    }

    let parsed = match serde_json::from_str::<JsonReadings>(line) {
        Ok(json) => ParsedLine::JsonTriple(Readings::new(
            json_number(&json.sensor1),
            json_number(&json.sensor2),
            json_number(&json.sensor3),
        )),
        Err(_) => ParsedLine::Unparseable,
    };
    Some(parsed)
}

fn json_number(value: &Value) -> f64 {
    value.as_f64().unwrap_or(0.0)
}
