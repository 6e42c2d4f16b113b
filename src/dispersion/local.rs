//! Local plume estimator
//!
//! Approximates a dispersion footprint as a wind-aligned ellipse around the
//! release point. Not physically calibrated: the axis scale is an empirical
//! constant in degrees of latitude. Pure apart from reading the clock for
//! `generated_at`, so it is safe to call from any task or thread.

use chrono::{DateTime, Utc};
use std::f64::consts::TAU;
use tracing::debug;

use crate::geo;
use crate::models::{
    DispersionPolygon, GeoPoint, HazardClass, PredictionProperties, PredictionResult,
    WindObservation,
};

/// Degrees of latitude of major axis per mph of wind
pub const MAJOR_AXIS_DEG_PER_MPH: f64 = 0.0005;
/// Minor axis as a fraction of the unscaled major axis
pub const MINOR_AXIS_RATIO: f64 = 0.5;
/// Perimeter samples before the closing point
pub const PERIMETER_SAMPLES: usize = 24;

/// Ellipse axes in degrees of latitude
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlumeAxes {
    pub major_deg: f64,
    pub minor_deg: f64,
}

impl PlumeAxes {
    /// Axes for a wind speed and hazard class.
    ///
    /// The minor axis derives from the unscaled major axis, so a gas plume
    /// is longer but not wider.
    #[must_use]
    pub fn for_wind(speed_mph: f64, hazard_class: HazardClass) -> Self {
        let base_major = speed_mph * MAJOR_AXIS_DEG_PER_MPH;
        Self {
            major_deg: base_major * hazard_class.major_axis_multiplier(),
            minor_deg: base_major * MINOR_AXIS_RATIO,
        }
    }
}

/// Client-side ellipse generator used when the remote model is unavailable
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalPlumeEstimator;

impl LocalPlumeEstimator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Estimate the footprint of a release at `center`.
    ///
    /// `center` must be a valid point; it is not checked. Near the poles the
    /// longitude correction divides by ~0 and the ring degenerates.
    #[must_use]
    pub fn estimate(
        &self,
        center: GeoPoint,
        wind: &WindObservation,
        hazard_class: HazardClass,
    ) -> PredictionResult {
        self.estimate_at(center, wind, hazard_class, Utc::now())
    }

    /// Same as [`estimate`](Self::estimate) with a caller-supplied timestamp
    #[must_use]
    pub fn estimate_at(
        &self,
        center: GeoPoint,
        wind: &WindObservation,
        hazard_class: HazardClass,
        generated_at: DateTime<Utc>,
    ) -> PredictionResult {
        let heading_rad = geo::meteorological_to_heading_rad(wind.direction_degrees);
        let axes = PlumeAxes::for_wind(wind.speed_mph, hazard_class);

        let polygon = DispersionPolygon::from_generated(ellipse_ring(center, axes, heading_rad));

        debug!(
            "Local plume at {} ({hazard_class}): major {:.5}°, minor {:.5}°, heading {:.3} rad",
            center.format_coordinates(),
            axes.major_deg,
            axes.minor_deg,
            heading_rad
        );

        PredictionResult {
            center,
            polygon,
            properties: PredictionProperties {
                hazard_class,
                wind_speed_mph: wind.speed_mph,
                wind_direction_degrees: wind.direction_degrees,
                generated_at,
                source_chemical: None,
            },
        }
    }
}

fn ellipse_ring(center: GeoPoint, axes: PlumeAxes, heading_rad: f64) -> Vec<GeoPoint> {
    let mut ring = Vec::with_capacity(PERIMETER_SAMPLES + 1);

    for i in 0..PERIMETER_SAMPLES {
        let theta = (i as f64 / PERIMETER_SAMPLES as f64) * TAU;
        let x = axes.major_deg * theta.cos();
        let y = axes.minor_deg * theta.sin();
        let (rotated_x, rotated_y) = geo::rotate(x, y, heading_rad);

        let lat_offset = rotated_y;
        let lng_offset = geo::longitude_offset(rotated_x, center.latitude);
        ring.push(GeoPoint::new(
            center.latitude + lat_offset,
            center.longitude + lng_offset,
        ));
    }

    ring.push(ring[0]);
    ring
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const EPS: f64 = 1e-9;

    fn wind(speed_mph: f64, direction_degrees: f64) -> WindObservation {
        WindObservation::new(speed_mph, direction_degrees, 70.0, 50.0, Utc::now())
    }

    fn major_extent(result: &PredictionResult) -> f64 {
        // Sample 0 lies on the major axis; measure it in degrees of latitude
        let first = result.polygon.points()[0];
        let d_lat = first.latitude - result.center.latitude;
        let d_east = (first.longitude - result.center.longitude)
            * result.center.latitude.to_radians().cos();
        d_lat.hypot(d_east)
    }

    #[rstest]
    #[case(HazardClass::Gas)]
    #[case(HazardClass::Liquid)]
    #[case(HazardClass::Other)]
    fn test_ring_is_closed_with_25_points(#[case] class: HazardClass) {
        let estimator = LocalPlumeEstimator::new();
        let result = estimator.estimate(GeoPoint::new(51.5, -0.12), &wind(15.0, 300.0), class);
        let points = result.polygon.points();
        assert_eq!(points.len(), 25);
        assert_eq!(points[0], points[24]);
    }

    #[test]
    fn test_example_scenario() {
        let estimator = LocalPlumeEstimator::new();
        let center = GeoPoint::new(40.0, -90.0);
        let result = estimator.estimate(center, &wind(20.0, 180.0), HazardClass::Gas);

        let axes = PlumeAxes::for_wind(20.0, HazardClass::Gas);
        assert!((axes.major_deg - 0.02).abs() < EPS);
        assert!((axes.minor_deg - 0.005).abs() < EPS);

        let first = result.polygon.points()[0];
        assert!((first.latitude - 40.02).abs() < EPS);
        assert!((first.longitude - -90.0).abs() < EPS);
    }

    #[test]
    fn test_gas_major_axis_is_double() {
        let estimator = LocalPlumeEstimator::new();
        let center = GeoPoint::new(35.0, 139.7);
        let w = wind(18.0, 45.0);

        let gas = major_extent(&estimator.estimate(center, &w, HazardClass::Gas));
        let liquid = major_extent(&estimator.estimate(center, &w, HazardClass::Liquid));
        let other = major_extent(&estimator.estimate(center, &w, HazardClass::Other));

        assert!((gas - 2.0 * liquid).abs() < EPS);
        assert!((liquid - other).abs() < EPS);
    }

    #[test]
    fn test_gas_minor_axis_unchanged() {
        let gas = PlumeAxes::for_wind(10.0, HazardClass::Gas);
        let liquid = PlumeAxes::for_wind(10.0, HazardClass::Liquid);
        assert_eq!(gas.minor_deg, liquid.minor_deg);
    }

    #[test]
    fn test_major_axis_monotonic_in_speed() {
        let mut previous = -1.0;
        for speed in [0.0, 0.5, 3.0, 12.0, 40.0, 100.0] {
            let major = PlumeAxes::for_wind(speed, HazardClass::Other).major_deg;
            assert!(major > previous, "major axis must grow with wind speed");
            assert!((major - speed * 0.0005).abs() < EPS);
            previous = major;
        }
    }

    #[test]
    fn test_direction_270_points_east() {
        assert!(geo::meteorological_to_heading_rad(270.0).abs() < EPS);

        let estimator = LocalPlumeEstimator::new();
        let center = GeoPoint::new(0.0, 10.0);
        let result = estimator.estimate(center, &wind(10.0, 270.0), HazardClass::Other);
        let first = result.polygon.points()[0];
        assert!((first.latitude - center.latitude).abs() < EPS);
        assert!((first.longitude - (center.longitude + 0.005)).abs() < EPS);
    }

    #[test]
    fn test_estimate_is_idempotent() {
        let estimator = LocalPlumeEstimator::new();
        let center = GeoPoint::new(-33.87, 151.21);
        let w = wind(22.0, 135.0);

        let a = estimator.estimate(center, &w, HazardClass::Gas);
        let b = estimator.estimate(center, &w, HazardClass::Gas);
        assert_eq!(a.polygon, b.polygon);
        assert_eq!(a.center, b.center);
    }

    #[test]
    fn test_estimate_at_uses_given_timestamp() {
        let estimator = LocalPlumeEstimator::new();
        let at = Utc::now() - chrono::Duration::hours(1);
        let w = wind(5.0, 10.0);
        let result = estimator.estimate_at(GeoPoint::new(10.0, 10.0), &w, HazardClass::Liquid, at);
        assert_eq!(result.properties.generated_at, at);
        assert_eq!(result.properties.hazard_class, HazardClass::Liquid);
        assert_eq!(result.properties.wind_speed_mph, 5.0);
        assert_eq!(result.properties.wind_direction_degrees, 10.0);
        assert!(result.properties.source_chemical.is_none());
    }

    #[test]
    fn test_zero_wind_collapses_to_center() {
        let estimator = LocalPlumeEstimator::new();
        let center = GeoPoint::new(12.5, -45.25);
        let result = estimator.estimate(center, &wind(0.0, 90.0), HazardClass::Gas);
        assert_eq!(result.polygon.len(), 25);
        assert!(result.polygon.points().iter().all(|p| *p == center));
    }

    #[rstest]
    #[case(90.0)]
    #[case(-90.0)]
    fn test_pole_center_degenerates_without_panic(#[case] latitude: f64) {
        let estimator = LocalPlumeEstimator::new();
        let center = GeoPoint::new(latitude, 0.0);
        let result = estimator.estimate(center, &wind(10.0, 270.0), HazardClass::Other);

        let points = result.polygon.points();
        assert_eq!(points.len(), 25);
        // cos(±90°) is ~6e-17, so east-west offsets blow up instead of being clamped
        assert!(
            points
                .iter()
                .any(|p| !p.longitude.is_finite() || p.longitude.abs() > 1e6)
        );
    }

    #[test]
    fn test_longitude_stretched_at_high_latitude() {
        let estimator = LocalPlumeEstimator::new();
        let center = GeoPoint::new(60.0, 0.0);
        let result = estimator.estimate(center, &wind(10.0, 270.0), HazardClass::Other);
        let first = result.polygon.points()[0];
        // 0.005° eastward offset doubles in longitude at 60°
        assert!((first.longitude - 0.01).abs() < 1e-9);
    }
}
