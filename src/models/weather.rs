//! Wind observation model and display methods

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo;

/// Wind conditions at the release point, as reported by a weather provider
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WindObservation {
    /// Wind speed in mph, never negative
    pub speed_mph: f64,
    /// Direction the wind blows FROM in degrees, [0, 360), 0 = north
    pub direction_degrees: f64,
    /// Temperature in Fahrenheit
    pub temperature_f: f64,
    /// Relative humidity percentage, [0, 100]
    pub humidity_percent: f64,
    /// When the observation was taken
    pub observed_at: DateTime<Utc>,
}

impl WindObservation {
    pub const FALLBACK_SPEED_MPH: f64 = 12.0;
    pub const FALLBACK_DIRECTION_DEGREES: f64 = 225.0;
    pub const FALLBACK_TEMPERATURE_F: f64 = 72.0;
    pub const FALLBACK_HUMIDITY_PERCENT: f64 = 45.0;

    /// Create an observation, normalizing values into their valid ranges
    #[must_use]
    pub fn new(
        speed_mph: f64,
        direction_degrees: f64,
        temperature_f: f64,
        humidity_percent: f64,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            speed_mph: speed_mph.max(0.0),
            direction_degrees: geo::normalize_direction(direction_degrees),
            temperature_f,
            humidity_percent: humidity_percent.clamp(0.0, 100.0),
            observed_at,
        }
    }

    /// Fixed observation used when no weather provider answers
    #[must_use]
    pub fn fallback() -> Self {
        Self::new(
            Self::FALLBACK_SPEED_MPH,
            Self::FALLBACK_DIRECTION_DEGREES,
            Self::FALLBACK_TEMPERATURE_F,
            Self::FALLBACK_HUMIDITY_PERCENT,
            Utc::now(),
        )
    }

    /// Convert wind direction from degrees to cardinal direction
    #[must_use]
    pub fn direction_to_cardinal(degrees: f64) -> &'static str {
        const POINTS: [&str; 16] = [
            "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW",
            "NW", "NNW",
        ];
        let sector = (geo::normalize_direction(degrees) / 22.5).round() as usize % POINTS.len();
        POINTS[sector]
    }

    /// Cardinal direction the wind blows from
    #[must_use]
    pub fn cardinal(&self) -> &'static str {
        Self::direction_to_cardinal(self.direction_degrees)
    }

    /// Format wind information
    #[must_use]
    pub fn format_wind(&self) -> String {
        format!("{:.1} mph from {}", self.speed_mph, self.cardinal())
    }
}
