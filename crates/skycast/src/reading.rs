//! Sensor readings and the capped rolling history.

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default retention: 7 days at 6 readings per hour.
pub const DEFAULT_RETENTION: usize = 7 * 24 * 6;

/// One timestamped sensor sample with derived calendar fields.
///
/// Field names match the columns of the history file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    #[serde(with = "timestamp_format")]
    pub time: NaiveDateTime,
    /// Temperature in °C.
    pub temp: f64,
    /// Relative humidity in %.
    pub humidity: f64,
    /// Pressure in hPa.
    pub pressure: f64,
    pub hour: u32,
    pub day_of_year: u32,
    pub month: u32,
    pub latitude: f64,
    pub longitude: f64,
}

impl Reading {
    /// Build a reading, deriving hour, day-of-year and month from `time`.
    pub fn new(
        time: NaiveDateTime,
        temp: f64,
        humidity: f64,
        pressure: f64,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            time,
            temp,
            humidity,
            pressure,
            hour: time.hour(),
            day_of_year: time.ordinal(),
            month: time.month(),
            latitude,
            longitude,
        }
    }
}

/// Ordered, capped buffer of readings. Oldest entries are evicted first.
#[derive(Debug, Clone)]
pub struct History {
    readings: VecDeque<Reading>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            readings: VecDeque::with_capacity(capacity.min(DEFAULT_RETENTION)),
            capacity,
        }
    }

    /// Build from existing readings, keeping only the most recent `capacity`.
    pub fn from_readings(readings: impl IntoIterator<Item = Reading>, capacity: usize) -> Self {
        let mut history = Self::new(capacity);
        for reading in readings {
            history.push(reading);
        }
        history
    }

    /// Append a reading and evict from the front while over capacity.
    pub fn push(&mut self, reading: Reading) {
        self.readings.push_back(reading);
        while self.readings.len() > self.capacity {
            self.readings.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Readings oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Reading> {
        self.readings.iter()
    }

    pub fn latest(&self) -> Option<&Reading> {
        self.readings.back()
    }

    pub fn into_vec(self) -> Vec<Reading> {
        self.readings.into()
    }
}

/// `YYYY-MM-DD HH:MM:SS.ffffff` on write; also accepts a `T` separator and a
/// missing fractional part on read.
pub(crate) mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const WRITE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
    const READ_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

    pub fn parse(value: &str) -> Option<NaiveDateTime> {
        let value = value.trim();
        READ_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
    }

    pub fn serialize<S: Serializer>(time: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(WRITE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", raw)))
    }
}
