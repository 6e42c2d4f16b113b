//! Data models for plumecast
//!
//! This module contains the core domain models organized by concern:
//! - Location: geographic points
//! - Weather: wind observations
//! - Hazard: hazard classes and chemicals
//! - Prediction: dispersion polygons, results and source tagging

pub mod hazard;
pub mod location;
pub mod prediction;
pub mod weather;

// Re-export all public types for convenient access
pub use hazard::{Chemical, ChemicalDescriptor, HazardClass};
pub use location::GeoPoint;
pub use prediction::{DataSource, DispersionPolygon, PredictionProperties, PredictionResult, Sourced};
pub use weather::WindObservation;
