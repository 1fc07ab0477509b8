//! Human-readable and machine-readable forecast output.

use std::fmt::Write as _;
use std::str::FromStr;

use crate::config::Config;
use crate::forecast::Forecast;

const RULE_WIDTH: usize = 70;

/// Output format for one-shot commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "yaml" => Ok(OutputFormat::Yaml),
            other => Err(format!(
                "unknown format '{}', expected table, json or yaml",
                other
            )),
        }
    }
}

/// Render `forecast` in the requested format.
pub fn render(forecast: &Forecast, format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Table => render_table(forecast),
        OutputFormat::Json => serde_json::to_string_pretty(forecast)?,
        OutputFormat::Yaml => serde_yaml::to_string(forecast)?,
    })
}

/// "10 minutes", or seconds when the interval is not whole minutes.
pub fn describe_interval(interval: std::time::Duration) -> String {
    let secs = interval.as_secs();
    match secs {
        60 => "1 minute".to_string(),
        s if s >= 60 && s % 60 == 0 => format!("{} minutes", s / 60),
        1 => "1 second".to_string(),
        s if s > 0 => format!("{} seconds", s),
        _ => format!("{} ms", interval.as_millis()),
    }
}

/// Startup banner for the run loop.
pub fn banner(config: &Config) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = String::new();
    let _ = writeln!(out, "🌡️  SKYCAST WEATHER PREDICTOR");
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(
        out,
        "📍 Location: {}°N, {}°E",
        config.latitude, config.longitude
    );
    let _ = writeln!(out, "📡 Sensor: {}", config.endpoint_url);
    let _ = writeln!(
        out,
        "⚡ Fetch interval: {}",
        describe_interval(config.fetch_interval())
    );
    let _ = writeln!(out, "⚡ Press CTRL+C to stop");
    let _ = write!(out, "{}", rule);
    out
}

/// The console forecast report.
pub fn render_table(forecast: &Forecast) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let current = &forecast.current;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "📊 Analyzed {} readings ({} regular intervals)",
        forecast.raw_readings, forecast.resampled_points
    );
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "🌤️  WEATHER FORECAST");
    let _ = writeln!(out, "{}", rule);

    let _ = writeln!(out, "\n📍 CURRENT CONDITIONS:");
    let _ = writeln!(
        out,
        "   Condition: {} {}",
        current.assessment.condition.icon(),
        current.assessment.condition
    );
    let _ = writeln!(out, "   Temperature: {:.1}°C", current.point.temp);
    let _ = writeln!(out, "   Humidity: {:.1}%", current.point.humidity);
    let _ = writeln!(
        out,
        "   Pressure: {:.1} hPa ({})",
        current.point.pressure, current.assessment.pressure_trend
    );
    let _ = writeln!(out, "   Confidence: {}%", current.assessment.confidence);

    let _ = writeln!(out, "\n📅 NEXT {} HOURS:", forecast.horizon_hours);
    if forecast.outlook.is_empty() {
        let _ = writeln!(out, "   (no projected points)");
    }
    for entry in &forecast.outlook {
        let _ = writeln!(
            out,
            "\n   +{}h: {} {} ({}%)",
            entry.offset_hours,
            entry.assessment.condition.icon(),
            entry.assessment.condition,
            entry.assessment.confidence
        );
        let _ = writeln!(
            out,
            "      Temp: {:.1}°C | Humidity: {:.1}% | Pressure: {:.1} hPa",
            entry.point.temp, entry.point.humidity, entry.point.pressure
        );
    }

    let _ = write!(out, "\n{}", rule);
    out
}
