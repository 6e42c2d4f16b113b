//! Wire format of the remote dispersion model
//!
//! Requests carry the release point and chemical id; responses are a GeoJSON
//! `Feature` whose polygon ring is in `[lng, lat]` order.

use serde::{Deserialize, Serialize};

use crate::models::{ChemicalDescriptor, PredictionResult};

/// Body of `POST /dispersion`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DispersionRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub chemical_id: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispersionFeature {
    #[serde(rename = "type")]
    pub kind: String,
    pub geometry: PolygonGeometry,
    #[serde(default)]
    pub properties: FeatureProperties,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolygonGeometry {
    #[serde(rename = "type")]
    pub kind: String,
    /// Rings in `[lng, lat]` order; the first is the exterior
    pub coordinates: Vec<Vec<[f64; 2]>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chemical: Option<ChemicalDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_speed_mph: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind_direction_degrees: Option<f64>,
}

impl DispersionFeature {
    /// Exterior ring, if the geometry is a polygon with at least one ring
    #[must_use]
    pub fn exterior_ring(&self) -> Option<&[[f64; 2]]> {
        if self.kind != "Feature" || self.geometry.kind != "Polygon" {
            return None;
        }
        self.geometry.coordinates.first().map(Vec::as_slice)
    }
}

impl From<&PredictionResult> for DispersionFeature {
    fn from(result: &PredictionResult) -> Self {
        Self {
            kind: "Feature".to_string(),
            geometry: PolygonGeometry {
                kind: "Polygon".to_string(),
                coordinates: vec![result.polygon.to_lng_lat_ring()],
            },
            properties: FeatureProperties {
                chemical: result.properties.source_chemical.clone(),
                wind_speed_mph: Some(result.properties.wind_speed_mph),
                wind_direction_degrees: Some(result.properties.wind_direction_degrees),
            },
        }
    }
}
