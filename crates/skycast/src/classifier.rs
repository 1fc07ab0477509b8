//! Rule-based weather condition classifier.
//!
//! Two ladders are evaluated on every snapshot: a pressure-trend ladder on the
//! ~1 hour pressure delta, and a condition ladder over pressure, humidity and
//! that same delta. Condition rules overlap, so they live in an ordered table
//! and the first matching rule wins.

use serde::Serialize;
use std::fmt;

/// Qualitative weather condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Condition {
    Thunderstorm,
    Rain,
    Cloudy,
    Sunny,
    #[serde(rename = "PARTLY CLOUDY")]
    PartlyCloudy,
}

impl Condition {
    pub fn label(&self) -> &'static str {
        match self {
            Condition::Thunderstorm => "THUNDERSTORM",
            Condition::Rain => "RAIN",
            Condition::Cloudy => "CLOUDY",
            Condition::Sunny => "SUNNY",
            Condition::PartlyCloudy => "PARTLY CLOUDY",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Condition::Thunderstorm => "⛈️",
            Condition::Rain => "🌧️",
            Condition::Cloudy => "☁️",
            Condition::Sunny => "☀️",
            Condition::PartlyCloudy => "🌤️",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Pressure rate-of-change label over the look-back window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PressureTrend {
    #[serde(rename = "Rapidly Falling")]
    RapidlyFalling,
    #[serde(rename = "Falling")]
    Falling,
    #[serde(rename = "Stable")]
    Stable,
    #[serde(rename = "Rising")]
    Rising,
    #[serde(rename = "Rapidly Rising")]
    RapidlyRising,
}

impl PressureTrend {
    /// Label a pressure delta (hPa over ~1 hour). Comparisons are strict.
    pub fn from_change(pressure_change: f64) -> Self {
        if pressure_change < -3.0 {
            PressureTrend::RapidlyFalling
        } else if pressure_change < -1.0 {
            PressureTrend::Falling
        } else if pressure_change > 3.0 {
            PressureTrend::RapidlyRising
        } else if pressure_change > 1.0 {
            PressureTrend::Rising
        } else {
            PressureTrend::Stable
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PressureTrend::RapidlyFalling => "Rapidly Falling",
            PressureTrend::Falling => "Falling",
            PressureTrend::Stable => "Stable",
            PressureTrend::Rising => "Rising",
            PressureTrend::RapidlyRising => "Rapidly Rising",
        }
    }
}

impl fmt::Display for PressureTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Result of classifying one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConditionAssessment {
    pub condition: Condition,
    /// Heuristic percentage, not a probability.
    pub confidence: u8,
    pub pressure_trend: PressureTrend,
}

/// Inputs the condition rules look at.
#[derive(Debug, Clone, Copy)]
struct Snapshot {
    humidity: f64,
    pressure: f64,
    pressure_change: f64,
}

struct Rule {
    matches: fn(&Snapshot) -> bool,
    condition: Condition,
    confidence: u8,
}

/// Evaluated top to bottom; ranges overlap, so order is priority.
const RULES: &[Rule] = &[
    Rule {
        matches: |s| s.pressure < 1000.0 && s.humidity > 80.0 && s.pressure_change < -2.0,
        condition: Condition::Thunderstorm,
        confidence: 85,
    },
    Rule {
        matches: |s| s.pressure < 1005.0 && s.humidity > 70.0 && s.pressure_change < -1.0,
        condition: Condition::Rain,
        confidence: 75,
    },
    Rule {
        matches: |s| s.pressure < 1010.0 && s.humidity > 65.0,
        condition: Condition::Cloudy,
        confidence: 70,
    },
    Rule {
        matches: |s| s.pressure > 1020.0 && s.humidity < 60.0 && s.pressure_change > 0.0,
        condition: Condition::Sunny,
        confidence: 80,
    },
    Rule {
        matches: |s| s.pressure > 1015.0 && s.humidity < 70.0,
        condition: Condition::PartlyCloudy,
        confidence: 65,
    },
];

const FALLBACK: (Condition, u8) = (Condition::Cloudy, 50);

/// Classify a sensor snapshot.
///
/// `temperature` is part of the snapshot but no current rule depends on it.
pub fn classify(
    _temperature: f64,
    humidity: f64,
    pressure: f64,
    pressure_change: f64,
) -> ConditionAssessment {
    let snapshot = Snapshot {
        humidity,
        pressure,
        pressure_change,
    };

    let (condition, confidence) = RULES
        .iter()
        .find(|rule| (rule.matches)(&snapshot))
        .map(|rule| (rule.condition, rule.confidence))
        .unwrap_or(FALLBACK);

    ConditionAssessment {
        condition,
        confidence,
        pressure_trend: PressureTrend::from_change(pressure_change),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trend_ladder_ranges() {
        assert_eq!(PressureTrend::from_change(-5.0), PressureTrend::RapidlyFalling);
        assert_eq!(PressureTrend::from_change(-2.0), PressureTrend::Falling);
        assert_eq!(PressureTrend::from_change(0.0), PressureTrend::Stable);
        assert_eq!(PressureTrend::from_change(2.0), PressureTrend::Rising);
        assert_eq!(PressureTrend::from_change(5.0), PressureTrend::RapidlyRising);
    }

    #[test]
    fn test_trend_boundaries_go_to_less_extreme_label() {
        assert_eq!(PressureTrend::from_change(-3.0), PressureTrend::Falling);
        assert_eq!(PressureTrend::from_change(-1.0), PressureTrend::Stable);
        assert_eq!(PressureTrend::from_change(1.0), PressureTrend::Stable);
        assert_eq!(PressureTrend::from_change(3.0), PressureTrend::Rising);
    }

    #[test]
    fn test_trend_ladder_is_monotonic() {
        // Sweep the real line; labels must only ever move "up" the ladder.
        let rank = |t: PressureTrend| match t {
            PressureTrend::RapidlyFalling => 0,
            PressureTrend::Falling => 1,
            PressureTrend::Stable => 2,
            PressureTrend::Rising => 3,
            PressureTrend::RapidlyRising => 4,
        };
        let mut last = 0;
        let mut seen = std::collections::HashSet::new();
        for i in -100..=100 {
            let change = i as f64 * 0.1;
            let r = rank(PressureTrend::from_change(change));
            assert!(r >= last, "ladder went backwards at {}", change);
            last = r;
            seen.insert(r);
        }
        assert_eq!(seen.len(), 5);
    }

    #[test]
    fn test_thunderstorm_wins_over_rain() {
        let a = classify(20.0, 85.0, 999.0, -4.0);
        assert_eq!(a.condition, Condition::Thunderstorm);
        assert_eq!(a.confidence, 85);
        assert_eq!(a.pressure_trend, PressureTrend::RapidlyFalling);
    }

    #[test]
    fn test_rain() {
        let a = classify(15.0, 75.0, 1003.0, -1.5);
        assert_eq!(a.condition, Condition::Rain);
        assert_eq!(a.confidence, 75);
    }

    #[test]
    fn test_cloudy_low_pressure() {
        let a = classify(15.0, 70.0, 1008.0, 0.0);
        assert_eq!(a.condition, Condition::Cloudy);
        assert_eq!(a.confidence, 70);
    }

    #[test]
    fn test_sunny_needs_rising_pressure() {
        let sunny = classify(25.0, 50.0, 1022.0, 0.5);
        assert_eq!(sunny.condition, Condition::Sunny);
        assert_eq!(sunny.confidence, 80);

        // Flat pressure falls through to the partly cloudy rule.
        let flat = classify(25.0, 50.0, 1022.0, 0.0);
        assert_eq!(flat.condition, Condition::PartlyCloudy);
        assert_eq!(flat.confidence, 65);
    }

    #[test]
    fn test_fallback_cloudy() {
        let a = classify(10.0, 90.0, 1012.0, 0.0);
        assert_eq!(a.condition, Condition::Cloudy);
        assert_eq!(a.confidence, 50);
    }

    #[test]
    fn test_boundary_pressure_falls_through() {
        // pressure == 1000 is not < 1000, so the rain rule applies instead
        let a = classify(18.0, 85.0, 1000.0, -4.0);
        assert_eq!(a.condition, Condition::Rain);

        // pressure == 1020 is not > 1020, so sunny is skipped
        let b = classify(18.0, 50.0, 1020.0, 1.0);
        assert_eq!(b.condition, Condition::PartlyCloudy);
    }

    #[test]
    fn test_condition_serializes_as_label() {
        let a = classify(25.0, 50.0, 1022.0, 2.0);
        let json = serde_json::to_value(a).unwrap();
        assert_eq!(json["condition"], "SUNNY");
        assert_eq!(json["pressure_trend"], "Rising");
        assert_eq!(json["confidence"], 80);
    }
}
