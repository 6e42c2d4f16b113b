//! Dispersion models
//!
//! - `local`: the offline ellipse estimator, total over its input domain
//! - `remote`: HTTP client for the server-side model
//! - `geojson`: the remote model's wire format

use async_trait::async_trait;

use crate::Result;
use crate::models::{Chemical, GeoPoint, PredictionResult, WindObservation};

pub mod geojson;
pub mod local;
pub mod remote;

pub use geojson::{DispersionFeature, DispersionRequest};
pub use local::{LocalPlumeEstimator, PlumeAxes};
pub use remote::RemotePlumeModel;

/// A dispersion model that may fail, e.g. because it lives behind the network
#[async_trait]
pub trait PlumeModel: Send + Sync {
    /// Predict the footprint of `chemical` released at `center`.
    ///
    /// `wind` is the observation the caller already fetched; it fills the
    /// result's properties.
    async fn predict(
        &self,
        center: GeoPoint,
        chemical: &Chemical,
        wind: &WindObservation,
    ) -> Result<PredictionResult>;
}
