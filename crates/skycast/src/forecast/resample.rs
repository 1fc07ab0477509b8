//! Bucketing irregular readings onto a fixed time grid.

use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::reading::{timestamp_format, Reading};

/// One point on the resampled or projected grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    #[serde(serialize_with = "timestamp_format::serialize")]
    pub time: NaiveDateTime,
    pub temp: f64,
    pub humidity: f64,
    pub pressure: f64,
}

/// Readings averaged per bucket, empty buckets dropped.
#[derive(Debug, Clone)]
pub struct ResampledSeries {
    interval: Duration,
    points: Vec<SeriesPoint>,
}

impl ResampledSeries {
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&SeriesPoint> {
        self.points.last()
    }

    pub fn temperatures(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.temp).collect()
    }

    pub fn humidities(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.humidity).collect()
    }

    pub fn pressures(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.pressure).collect()
    }
}

#[derive(Default, Clone, Copy)]
struct Mean {
    sum: f64,
    count: u32,
}

impl Mean {
    fn add(&mut self, value: f64) {
        if value.is_finite() {
            self.sum += value;
            self.count += 1;
        }
    }

    fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

#[derive(Default)]
struct Bucket {
    temp: Mean,
    humidity: Mean,
    pressure: Mean,
}

/// Average `readings` into `interval_minutes`-wide buckets.
///
/// Buckets are aligned to multiples of the interval from midnight of the
/// earliest reading's day and stamped with their left edge. A bucket with no
/// finite value for any channel is dropped rather than filled.
pub fn resample<'a>(
    readings: impl IntoIterator<Item = &'a Reading>,
    interval_minutes: u32,
) -> ResampledSeries {
    let interval = Duration::minutes(i64::from(interval_minutes.max(1)));
    let width = interval.num_seconds();

    let readings: Vec<&Reading> = readings.into_iter().collect();
    let Some(earliest) = readings.iter().map(|r| r.time).min() else {
        return ResampledSeries {
            interval,
            points: Vec::new(),
        };
    };
    let origin = earliest.date().and_time(NaiveTime::MIN);

    let mut buckets: BTreeMap<i64, Bucket> = BTreeMap::new();
    for reading in readings {
        let index = (reading.time - origin).num_seconds().div_euclid(width);
        let bucket = buckets.entry(index).or_default();
        bucket.temp.add(reading.temp);
        bucket.humidity.add(reading.humidity);
        bucket.pressure.add(reading.pressure);
    }

    let points = buckets
        .into_iter()
        .filter_map(|(index, bucket)| {
            Some(SeriesPoint {
                time: origin + Duration::seconds(index * width),
                temp: bucket.temp.value()?,
                humidity: bucket.humidity.value()?,
                pressure: bucket.pressure.value()?,
            })
        })
        .collect();

    ResampledSeries { interval, points }
}
