//! JSON API served under `/api`

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::chemicals::{self, ChemicalCatalog, HttpChemicalCatalog, StaticChemicalCatalog};
use crate::config::PlumecastConfig;
use crate::dispersion::{DispersionFeature, DispersionRequest, LocalPlumeEstimator};
use crate::models::{Chemical, GeoPoint, Sourced};
use crate::orchestrator::{PredictionOrchestrator, Simulation};
use crate::weather::{self, OpenMeteoWeatherProvider, WeatherProvider};
use crate::{PlumeError, VERSION};

/// Collaborators shared by all handlers
pub struct AppState {
    pub orchestrator: PredictionOrchestrator,
    pub catalog: Arc<dyn ChemicalCatalog>,
    pub weather: Arc<dyn WeatherProvider>,
    estimator: LocalPlumeEstimator,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    #[must_use]
    pub fn new(
        orchestrator: PredictionOrchestrator,
        catalog: Arc<dyn ChemicalCatalog>,
        weather: Arc<dyn WeatherProvider>,
    ) -> Self {
        Self {
            orchestrator,
            catalog,
            weather,
            estimator: LocalPlumeEstimator::new(),
        }
    }

    /// Wire up the Open-Meteo provider, and the remote catalog and model when
    /// a remote base URL is configured.
    pub fn from_config(config: &PlumecastConfig) -> crate::Result<Self> {
        let catalog: Arc<dyn ChemicalCatalog> = match config.remote.base_url.as_deref() {
            Some(base_url) => Arc::new(HttpChemicalCatalog::new(base_url, &config.remote)?),
            None => Arc::new(StaticChemicalCatalog::default()),
        };
        Ok(Self::new(
            PredictionOrchestrator::from_config(config)?,
            catalog,
            Arc::new(OpenMeteoWeatherProvider::new(&config.weather)?),
        ))
    }

    /// Resolve a chemical id against the catalog (built-in list on failure),
    /// keeping the catalog's source tag
    async fn find_chemical(&self, id: u32) -> Result<Sourced<Chemical>, ApiError> {
        let chemicals =
            chemicals::fetch_chemicals(self.catalog.as_ref(), self.orchestrator.retry_policy())
                .await;
        chemicals
            .map(|list| list.into_iter().find(|chemical| chemical.id == id))
            .transpose()
            .ok_or_else(|| {
                ApiError::new(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    format!("Unknown chemical id {id}"),
                )
            })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Body of `POST /simulate`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateRequest {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub chemical_id: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Handler error rendered as `{"error": ...}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<PlumeError> for ApiError {
    fn from(err: PlumeError) -> Self {
        let status = match &err {
            PlumeError::Validation { .. } => StatusCode::BAD_REQUEST,
            PlumeError::EndpointAbsent { .. }
            | PlumeError::Network { .. }
            | PlumeError::MalformedResponse { .. } => StatusCode::BAD_GATEWAY,
            PlumeError::Config { .. } | PlumeError::Io { .. } => {
                error!("Request failed: {}", err);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, err.user_message())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/chemicals", get(list_chemicals))
        .route("/dispersion", post(dispersion))
        .route("/simulate", post(simulate).delete(clear_simulation))
        .route("/simulate/latest", get(latest_simulation))
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: VERSION.to_string(),
    })
}

async fn list_chemicals(State(state): State<SharedState>) -> Json<Sourced<Vec<Chemical>>> {
    Json(
        chemicals::fetch_chemicals(state.catalog.as_ref(), state.orchestrator.retry_policy())
            .await,
    )
}

/// Server side of the remote model contract
#[instrument(skip(state))]
async fn dispersion(
    State(state): State<SharedState>,
    Json(request): Json<DispersionRequest>,
) -> Result<Json<DispersionFeature>, ApiError> {
    let center = GeoPoint::try_new(request.latitude, request.longitude)?;
    let chemical = state.find_chemical(request.chemical_id).await?.data;

    let wind = weather::fetch_wind(
        state.weather.as_ref(),
        center,
        state.orchestrator.retry_policy(),
    )
    .await;
    let result = state
        .estimator
        .estimate(center, &wind.data, chemical.hazard_class())
        .with_chemical(chemical.descriptor());

    info!("Served dispersion: {}", result.summary());
    Ok(Json(DispersionFeature::from(&result)))
}

#[instrument(skip(state))]
async fn simulate(
    State(state): State<SharedState>,
    Json(request): Json<SimulateRequest>,
) -> Result<Json<Simulation>, ApiError> {
    let center = GeoPoint::try_new(request.latitude, request.longitude)?;
    let chemical = match request.chemical_id {
        Some(id) => Some(state.find_chemical(id).await?),
        None => None,
    };

    let simulation = state
        .orchestrator
        .run_catalog_simulation(
            center,
            chemical.as_ref().map(Sourced::as_ref),
            state.weather.as_ref(),
        )
        .await?;
    Ok(Json(simulation))
}

async fn latest_simulation(
    State(state): State<SharedState>,
) -> Result<Json<Simulation>, ApiError> {
    state
        .orchestrator
        .latest()
        .map(Json)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "No simulation has been run"))
}

async fn clear_simulation(State(state): State<SharedState>) -> StatusCode {
    state.orchestrator.clear();
    StatusCode::NO_CONTENT
}
