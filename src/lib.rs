//! `plumecast` - Chemical release dispersion estimates
//!
//! This library predicts the ground footprint of an airborne chemical release
//! from the current wind. A remote dispersion model is preferred; a local
//! Gaussian-plume style ellipse is always available as fallback.

pub mod api;
pub mod chemicals;
pub mod config;
pub mod dispersion;
pub mod error;
pub mod geo;
pub mod http;
pub mod models;
pub mod orchestrator;
pub mod retry;
pub mod telemetry;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use chemicals::{ChemicalCatalog, HttpChemicalCatalog, StaticChemicalCatalog};
pub use config::PlumecastConfig;
pub use dispersion::{LocalPlumeEstimator, PlumeModel, RemotePlumeModel};
pub use error::PlumeError;
pub use models::{
    Chemical, DataSource, DispersionPolygon, GeoPoint, HazardClass, PredictionResult, Sourced,
    WindObservation,
};
pub use orchestrator::{PredictionOrchestrator, RemoteAvailability, Simulation};
pub use retry::RetryPolicy;
pub use weather::{OpenMeteoWeatherProvider, WeatherProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, PlumeError>;
