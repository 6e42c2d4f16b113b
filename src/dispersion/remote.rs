//! HTTP client for the server-side dispersion model

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use std::time::Instant;
use tracing::{debug, info, instrument};

use super::PlumeModel;
use super::geojson::{DispersionFeature, DispersionRequest};
use crate::config::RemoteConfig;
use crate::http;
use crate::models::{
    Chemical, DispersionPolygon, GeoPoint, PredictionProperties, PredictionResult,
    WindObservation,
};
use crate::{PlumeError, Result};

/// Remote model reached at `POST {base}/dispersion`.
///
/// A single call per [`predict`](PlumeModel::predict); retries are the
/// orchestrator's job.
pub struct RemotePlumeModel {
    client: Client,
    url: String,
}

impl RemotePlumeModel {
    pub fn new(base_url: &str, config: &RemoteConfig) -> Result<Self> {
        Ok(Self {
            client: http::build_client(config.timeout())?,
            url: http::join_url(base_url, "dispersion"),
        })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl PlumeModel for RemotePlumeModel {
    #[instrument(skip_all, fields(chemical = chemical.id, url = %self.url))]
    async fn predict(
        &self,
        center: GeoPoint,
        chemical: &Chemical,
        wind: &WindObservation,
    ) -> Result<PredictionResult> {
        let request = DispersionRequest {
            latitude: center.latitude,
            longitude: center.longitude,
            chemical_id: chemical.id,
        };
        debug!("Requesting remote dispersion: {:?}", request);
        let start_time = Instant::now();

        let response = self.client.post(&self.url).json(&request).send().await?;
        let response = http::check_status(response, &self.url).await?;
        let feature: DispersionFeature = response
            .json()
            .await
            .map_err(|e| PlumeError::malformed(format!("Invalid dispersion response: {e}")))?;

        let result = feature_to_prediction(feature, center, chemical, wind)?;
        info!(
            "Remote dispersion returned {} points in {:.3}s",
            result.polygon.len(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(result)
    }
}

/// Normalize a remote GeoJSON feature into a prediction.
///
/// The ring is swapped from `[lng, lat]` and closed if needed. Chemical
/// metadata in the response wins over the requested chemical.
pub fn feature_to_prediction(
    feature: DispersionFeature,
    center: GeoPoint,
    requested: &Chemical,
    wind: &WindObservation,
) -> Result<PredictionResult> {
    let ring = feature
        .exterior_ring()
        .ok_or_else(|| PlumeError::malformed("Response is not a GeoJSON polygon feature"))?;
    let polygon = DispersionPolygon::from_lng_lat_ring(ring)?;

    let chemical = feature
        .properties
        .chemical
        .unwrap_or_else(|| requested.descriptor());

    Ok(PredictionResult {
        center,
        polygon,
        properties: PredictionProperties {
            hazard_class: chemical.hazard_class(),
            wind_speed_mph: wind.speed_mph,
            wind_direction_degrees: wind.direction_degrees,
            generated_at: Utc::now(),
            source_chemical: Some(chemical),
        },
    })
}
