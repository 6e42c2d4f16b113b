//! Dispersion polygons, prediction results and source tagging

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ChemicalDescriptor, GeoPoint, HazardClass, WindObservation};
use crate::PlumeError;

/// Closed ring of points approximating a dispersion footprint.
///
/// The first point is repeated as the last and the ring holds at least four
/// points. Winding order is whatever the producer generated; simplicity
/// (no self-intersection) is not checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<GeoPoint>", into = "Vec<GeoPoint>")]
pub struct DispersionPolygon {
    points: Vec<GeoPoint>,
}

impl DispersionPolygon {
    pub const MIN_POINTS: usize = 4;

    /// Wrap a ring that is already closed
    pub fn from_closed_ring(points: Vec<GeoPoint>) -> crate::Result<Self> {
        if points.len() < Self::MIN_POINTS {
            return Err(PlumeError::malformed(format!(
                "Polygon needs at least {} points, got {}",
                Self::MIN_POINTS,
                points.len()
            )));
        }
        if points.first() != points.last() {
            return Err(PlumeError::malformed("Polygon ring is not closed"));
        }
        Ok(Self { points })
    }

    /// Build a ring from GeoJSON `[lng, lat]` pairs, closing it if needed.
    ///
    /// Rejects rings with fewer than three distinct vertices.
    pub fn from_lng_lat_ring(ring: &[[f64; 2]]) -> crate::Result<Self> {
        let mut points: Vec<GeoPoint> = ring
            .iter()
            .map(|&[lng, lat]| GeoPoint::new(lat, lng))
            .collect();

        if let Some(pos) = points
            .iter()
            .position(|p| !p.latitude.is_finite() || !p.longitude.is_finite())
        {
            return Err(PlumeError::malformed(format!(
                "Polygon vertex {pos} is not a finite coordinate"
            )));
        }

        if points.len() > 1 && points.first() == points.last() {
            points.pop();
        }

        let mut distinct: Vec<GeoPoint> = Vec::with_capacity(points.len());
        for point in &points {
            if !distinct.contains(point) {
                distinct.push(*point);
            }
        }
        if distinct.len() < 3 {
            return Err(PlumeError::malformed(format!(
                "Polygon needs at least 3 distinct vertices, got {}",
                distinct.len()
            )));
        }

        let first = points[0];
        points.push(first);
        Ok(Self { points })
    }

    /// Ring produced by a generator that guarantees closure and length
    pub(crate) fn from_generated(points: Vec<GeoPoint>) -> Self {
        debug_assert!(points.len() >= Self::MIN_POINTS);
        debug_assert_eq!(points.first(), points.last());
        Self { points }
    }

    #[must_use]
    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.points.first() == self.points.last()
    }

    /// Furthest great-circle distance from `center` to any vertex, in km
    #[must_use]
    pub fn max_extent_km(&self, center: &GeoPoint) -> f64 {
        self.points
            .iter()
            .map(|p| center.distance_km(p))
            .fold(0.0, f64::max)
    }

    /// Exterior ring in GeoJSON `[lng, lat]` order
    #[must_use]
    pub fn to_lng_lat_ring(&self) -> Vec<[f64; 2]> {
        self.points
            .iter()
            .map(|p| [p.longitude, p.latitude])
            .collect()
    }
}

impl TryFrom<Vec<GeoPoint>> for DispersionPolygon {
    type Error = PlumeError;

    fn try_from(points: Vec<GeoPoint>) -> Result<Self, Self::Error> {
        Self::from_closed_ring(points)
    }
}

impl From<DispersionPolygon> for Vec<GeoPoint> {
    fn from(polygon: DispersionPolygon) -> Self {
        polygon.points
    }
}

/// Metadata shown next to a rendered plume
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionProperties {
    pub hazard_class: HazardClass,
    pub wind_speed_mph: f64,
    pub wind_direction_degrees: f64,
    pub generated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_chemical: Option<ChemicalDescriptor>,
}

/// One dispersion prediction, immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub center: GeoPoint,
    pub polygon: DispersionPolygon,
    pub properties: PredictionProperties,
}

impl PredictionResult {
    /// Attach the chemical the prediction was made for
    #[must_use]
    pub fn with_chemical(mut self, chemical: ChemicalDescriptor) -> Self {
        self.properties.source_chemical = Some(chemical);
        self
    }

    /// Short line for a tooltip or legend
    #[must_use]
    pub fn summary(&self) -> String {
        let subject = match &self.properties.source_chemical {
            Some(chemical) => format!("{} ({})", chemical.name, self.properties.hazard_class),
            None => format!("Unspecified {} release", self.properties.hazard_class),
        };
        format!(
            "{subject}: wind {:.1} mph from {}, footprint up to {:.2} km",
            self.properties.wind_speed_mph,
            WindObservation::direction_to_cardinal(self.properties.wind_direction_degrees),
            self.polygon.max_extent_km(&self.center)
        )
    }
}

/// Where a piece of data came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Answered by the live collaborator
    Live,
    /// Substituted default or locally computed value
    Fallback,
}

/// A value tagged with its source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sourced<T> {
    pub source: DataSource,
    pub data: T,
}

impl<T> Sourced<T> {
    #[must_use]
    pub fn live(data: T) -> Self {
        Self {
            source: DataSource::Live,
            data,
        }
    }

    #[must_use]
    pub fn fallback(data: T) -> Self {
        Self {
            source: DataSource::Fallback,
            data,
        }
    }

    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.source == DataSource::Fallback
    }

    #[must_use]
    pub fn as_ref(&self) -> Sourced<&T> {
        Sourced {
            source: self.source,
            data: &self.data,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sourced<U> {
        Sourced {
            source: self.source,
            data: f(self.data),
        }
    }
}

impl<T> Sourced<Option<T>> {
    /// Keep the tag on a value that may be absent
    pub fn transpose(self) -> Option<Sourced<T>> {
        let source = self.source;
        self.data.map(|data| Sourced { source, data })
    }
}
