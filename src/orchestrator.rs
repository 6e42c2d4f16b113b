//! Prediction orchestration
//!
//! One simulation request runs as a sequential chain: validate the selection,
//! fetch wind (default on failure), ask the remote model with retry, and fall
//! back to the local estimator. The prediction step never fails; only invalid
//! user input is reported as an error.
//!
//! Requests carry a [`RequestToken`]. A result is published to the latest
//! slot only if no newer request has started, so a slow response cannot
//! overwrite a fresher one.

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, instrument, warn};

use crate::config::PlumecastConfig;
use crate::dispersion::{LocalPlumeEstimator, PlumeModel, RemotePlumeModel};
use crate::models::{Chemical, GeoPoint, PredictionResult, Sourced, WindObservation};
use crate::retry::RetryPolicy;
use crate::weather::{self, WeatherProvider};
use crate::{PlumeError, Result};

/// Identifies one simulation request; higher is newer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RequestToken(u64);

impl RequestToken {
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Stages a simulation request passes through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationStage {
    Idle,
    FetchingWeather,
    InvokingRemoteModel,
    Success,
    RetryableFailure,
    ExhaustedRetries,
    FallingBackLocal,
    Done,
}

impl fmt::Display for SimulationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SimulationStage::Idle => "idle",
            SimulationStage::FetchingWeather => "fetching weather",
            SimulationStage::InvokingRemoteModel => "invoking remote model",
            SimulationStage::Success => "success",
            SimulationStage::RetryableFailure => "retryable failure",
            SimulationStage::ExhaustedRetries => "exhausted retries",
            SimulationStage::FallingBackLocal => "falling back to local estimate",
            SimulationStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// What the orchestrator has learned about the remote model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemoteAvailability {
    #[default]
    Unknown,
    Available,
    /// The endpoint answered 404; skip it until reset or a later success
    NotDeployed,
}

/// Outcome of one simulation request
#[derive(Debug, Clone, Serialize)]
pub struct Simulation {
    pub token: RequestToken,
    pub weather: Sourced<WindObservation>,
    pub prediction: Sourced<PredictionResult>,
    /// Non-fatal notices for the user, one per fallback used
    pub advisories: Vec<String>,
}

impl Simulation {
    #[must_use]
    pub fn used_fallback(&self) -> bool {
        self.weather.is_fallback() || self.prediction.is_fallback()
    }
}

/// Chooses between the remote model and the local estimator
pub struct PredictionOrchestrator {
    remote: Option<Arc<dyn PlumeModel>>,
    local: LocalPlumeEstimator,
    retry: RetryPolicy,
    remote_state: Mutex<RemoteAvailability>,
    epoch: AtomicU64,
    latest: Mutex<Option<Simulation>>,
}

impl PredictionOrchestrator {
    #[must_use]
    pub fn new(remote: Option<Arc<dyn PlumeModel>>, retry: RetryPolicy) -> Self {
        Self {
            remote,
            local: LocalPlumeEstimator::new(),
            retry,
            remote_state: Mutex::new(RemoteAvailability::Unknown),
            epoch: AtomicU64::new(0),
            latest: Mutex::new(None),
        }
    }

    /// Orchestrator that always uses the local estimator
    #[must_use]
    pub fn local_only(retry: RetryPolicy) -> Self {
        Self::new(None, retry)
    }

    /// Build from configuration; a remote model is used only when a base URL
    /// is configured.
    pub fn from_config(config: &PlumecastConfig) -> Result<Self> {
        let remote: Option<Arc<dyn PlumeModel>> = match config.remote.base_url.as_deref() {
            Some(base_url) => Some(Arc::new(RemotePlumeModel::new(base_url, &config.remote)?)),
            None => None,
        };
        Ok(Self::new(remote, RetryPolicy::from(&config.retry)))
    }

    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Run one simulation.
    ///
    /// Fails only with `Validation` when no chemical is selected; that check
    /// happens before any network call.
    pub async fn run_simulation(
        &self,
        center: GeoPoint,
        selection: Option<&Chemical>,
        weather: &dyn WeatherProvider,
    ) -> Result<Simulation> {
        self.run_catalog_simulation(center, selection.map(Sourced::live), weather)
            .await
    }

    /// Run one simulation for a chemical looked up in a catalog that may have
    /// fallen back to its built-in list; that fallback is reported as an
    /// advisory.
    #[instrument(skip_all, fields(center = %center.format_coordinates()))]
    pub async fn run_catalog_simulation(
        &self,
        center: GeoPoint,
        selection: Option<Sourced<&Chemical>>,
        weather: &dyn WeatherProvider,
    ) -> Result<Simulation> {
        let selection = selection.ok_or_else(|| {
            PlumeError::validation("Select a chemical before running a simulation")
        })?;
        let chemical = selection.data;

        let token = self.begin_request();
        log_stage(token, SimulationStage::FetchingWeather);
        let wind = weather::fetch_wind(weather, center, &self.retry).await;

        let (prediction, prediction_advisory) = self.predict(token, center, chemical, &wind.data).await;

        let mut advisories = Vec::new();
        if selection.is_fallback() {
            advisories.push("Chemical catalog unavailable; using built-in list.".to_string());
        }
        if wind.is_fallback() {
            advisories.push(format!(
                "Live weather unavailable; using default wind of {}.",
                wind.data.format_wind()
            ));
        }
        advisories.extend(prediction_advisory);

        let simulation = Simulation {
            token,
            weather: wind,
            prediction,
            advisories,
        };

        if self.publish(&simulation) {
            info!(
                "Simulation {} published: {}",
                token.value(),
                simulation.prediction.data.summary()
            );
        } else {
            debug!("Simulation {} superseded, not published", token.value());
        }
        log_stage(token, SimulationStage::Done);

        Ok(simulation)
    }

    /// Remote model with retry, local estimator on any failure
    async fn predict(
        &self,
        token: RequestToken,
        center: GeoPoint,
        chemical: &Chemical,
        wind: &WindObservation,
    ) -> (Sourced<PredictionResult>, Option<String>) {
        let Some(remote) = &self.remote else {
            return (
                self.local_fallback(token, center, chemical, wind),
                Some("Showing a simplified local dispersion estimate.".to_string()),
            );
        };

        if self.remote_availability() == RemoteAvailability::NotDeployed {
            debug!("Remote model known to be not deployed, skipping");
            return (
                self.local_fallback(token, center, chemical, wind),
                Some(not_deployed_advisory()),
            );
        }

        log_stage(token, SimulationStage::InvokingRemoteModel);
        let outcome = self
            .retry
            .run_observed(
                "remote dispersion",
                || remote.predict(center, chemical, wind),
                |attempt, err| {
                    log_stage(token, SimulationStage::RetryableFailure);
                    debug!("Remote attempt {} failed: {}", attempt, err);
                },
            )
            .await;

        match outcome {
            Ok(result) => {
                log_stage(token, SimulationStage::Success);
                self.set_remote_availability(RemoteAvailability::Available);
                (Sourced::live(result), None)
            }
            Err(PlumeError::EndpointAbsent { endpoint }) => {
                warn!(
                    "Dispersion model not deployed at {} (HTTP 404); deploy the backend to enable remote predictions",
                    endpoint
                );
                self.set_remote_availability(RemoteAvailability::NotDeployed);
                (
                    self.local_fallback(token, center, chemical, wind),
                    Some(not_deployed_advisory()),
                )
            }
            Err(e) => {
                log_stage(token, SimulationStage::ExhaustedRetries);
                warn!("Remote dispersion failed: {}", e);
                (
                    self.local_fallback(token, center, chemical, wind),
                    Some(
                        "Dispersion model unavailable; showing a simplified local estimate."
                            .to_string(),
                    ),
                )
            }
        }
    }

    fn local_fallback(
        &self,
        token: RequestToken,
        center: GeoPoint,
        chemical: &Chemical,
        wind: &WindObservation,
    ) -> Sourced<PredictionResult> {
        log_stage(token, SimulationStage::FallingBackLocal);
        let result = self
            .local
            .estimate(center, wind, chemical.hazard_class())
            .with_chemical(chemical.descriptor());
        Sourced::fallback(result)
    }

    /// Start a new request, superseding all earlier ones
    pub fn begin_request(&self) -> RequestToken {
        RequestToken(self.epoch.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether `token` belongs to the newest request
    #[must_use]
    pub fn is_current(&self, token: RequestToken) -> bool {
        self.epoch.load(Ordering::SeqCst) == token.0
    }

    /// Store `simulation` as the latest result if its request is still current
    pub fn publish(&self, simulation: &Simulation) -> bool {
        let mut latest = lock(&self.latest);
        if !self.is_current(simulation.token) {
            return false;
        }
        *latest = Some(simulation.clone());
        true
    }

    /// Latest published simulation
    #[must_use]
    pub fn latest(&self) -> Option<Simulation> {
        lock(&self.latest).clone()
    }

    /// Drop the latest result and supersede any request in flight
    pub fn clear(&self) {
        let mut latest = lock(&self.latest);
        self.epoch.fetch_add(1, Ordering::SeqCst);
        *latest = None;
        debug!("Simulation state: {}", SimulationStage::Idle);
    }

    #[must_use]
    pub fn remote_availability(&self) -> RemoteAvailability {
        *lock(&self.remote_state)
    }

    /// Forget a cached "not deployed" verdict
    pub fn reset_remote_availability(&self) {
        self.set_remote_availability(RemoteAvailability::Unknown);
    }

    fn set_remote_availability(&self, availability: RemoteAvailability) {
        *lock(&self.remote_state) = availability;
    }
}

fn not_deployed_advisory() -> String {
    "Dispersion model service is not deployed; showing a simplified local estimate.".to_string()
}

fn log_stage(token: RequestToken, stage: SimulationStage) {
    debug!("Simulation {}: {}", token.value(), stage);
}

// A poisoned lock only means another request panicked mid-update; the
// guarded values are plain data and stay usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}
