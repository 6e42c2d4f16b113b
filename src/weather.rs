//! Weather providers
//!
//! Wind conditions come from an Open-Meteo compatible API. Callers go through
//! [`fetch_wind`], which retries and substitutes a fixed default observation
//! when the provider stays unavailable.

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use reqwest::Client;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::config::WeatherConfig;
use crate::http;
use crate::models::{GeoPoint, Sourced, WindObservation};
use crate::retry::RetryPolicy;
use crate::{PlumeError, Result};

/// Source of current wind conditions
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current_wind(&self, point: GeoPoint) -> Result<WindObservation>;
}

/// Fetch wind at `point`, falling back to [`WindObservation::fallback`]
/// once retries are exhausted.
#[instrument(skip_all, fields(point = %point.format_coordinates()))]
pub async fn fetch_wind(
    provider: &dyn WeatherProvider,
    point: GeoPoint,
    policy: &RetryPolicy,
) -> Sourced<WindObservation> {
    match policy
        .run("weather fetch", || provider.current_wind(point))
        .await
    {
        Ok(wind) => Sourced::live(wind),
        Err(e) => {
            warn!("Weather unavailable, using default observation: {}", e);
            Sourced::fallback(WindObservation::fallback())
        }
    }
}

/// Weather provider backed by the Open-Meteo forecast API
pub struct OpenMeteoWeatherProvider {
    client: Client,
    base_url: String,
}

impl OpenMeteoWeatherProvider {
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        Ok(Self {
            client: http::build_client(config.timeout())?,
            base_url: config.base_url.clone(),
        })
    }

    fn current_url(&self, point: GeoPoint) -> String {
        format!(
            "{}?latitude={}&longitude={}&current=temperature_2m,relative_humidity_2m,wind_speed_10m,wind_direction_10m&wind_speed_unit=mph&temperature_unit=fahrenheit",
            http::join_url(&self.base_url, "forecast"),
            point.latitude,
            point.longitude
        )
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoWeatherProvider {
    async fn current_wind(&self, point: GeoPoint) -> Result<WindObservation> {
        let url = self.current_url(point);
        debug!("Open-Meteo request URL: {}", url);
        let start_time = Instant::now();

        let response = self.client.get(&url).send().await?;
        let response = http::check_status(response, "weather API").await?;
        let forecast: openmeteo::ForecastResponse = response
            .json()
            .await
            .map_err(|e| PlumeError::malformed(format!("Invalid Open-Meteo response: {e}")))?;

        let wind = forecast.into_observation()?;
        info!(
            "Retrieved current wind {} in {:.3}s",
            wind.format_wind(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(wind)
    }
}

/// Open-Meteo API response structures
mod openmeteo {
    use super::{NaiveDateTime, PlumeError, Result, Utc, WindObservation};
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct ForecastResponse {
        pub current: Option<CurrentData>,
    }

    #[derive(Debug, Deserialize)]
    pub struct CurrentData {
        pub time: Option<String>,
        #[serde(rename = "temperature_2m")]
        pub temperature: f64,
        #[serde(rename = "relative_humidity_2m")]
        pub humidity: f64,
        #[serde(rename = "wind_speed_10m")]
        pub wind_speed: f64,
        #[serde(rename = "wind_direction_10m")]
        pub wind_direction: f64,
    }

    impl ForecastResponse {
        pub fn into_observation(self) -> Result<WindObservation> {
            let current = self
                .current
                .ok_or_else(|| PlumeError::malformed("No current weather in Open-Meteo response"))?;

            let observed_at = current
                .time
                .as_deref()
                .and_then(|t| NaiveDateTime::parse_from_str(t, "%Y-%m-%dT%H:%M").ok())
                .map_or_else(Utc::now, |dt| dt.and_utc());

            Ok(WindObservation::new(
                current.wind_speed,
                current.wind_direction,
                current.temperature,
                current.humidity,
                observed_at,
            ))
        }
    }
}
