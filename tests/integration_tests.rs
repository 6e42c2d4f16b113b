//! Integration tests for the plumecast service and its HTTP clients
//!
//! Each test starts the axum service on an ephemeral port, backed by the
//! built-in chemical catalog and a fixed weather provider.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::{Router, routing::post};
use chrono::Utc;
use plumecast::api::AppState;
use plumecast::config::RemoteConfig;
use plumecast::{
    Chemical, ChemicalCatalog, DataSource, GeoPoint, HazardClass, HttpChemicalCatalog,
    PlumeError, PlumeModel, PredictionOrchestrator, RemoteAvailability, RemotePlumeModel,
    RetryPolicy, StaticChemicalCatalog, WeatherProvider, WindObservation, web,
};
use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio::net::TcpListener;

struct FixedWeather;

#[async_trait]
impl WeatherProvider for FixedWeather {
    async fn current_wind(&self, _point: GeoPoint) -> plumecast::Result<WindObservation> {
        Ok(WindObservation::new(20.0, 180.0, 68.0, 55.0, Utc::now()))
    }
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 2,
        initial_delay: Duration::from_millis(10),
        multiplier: 2,
    }
}

struct OfflineCatalog;

#[async_trait]
impl ChemicalCatalog for OfflineCatalog {
    async fn list_chemicals(&self) -> plumecast::Result<Vec<Chemical>> {
        Err(PlumeError::endpoint_absent("/api/chemicals"))
    }
}

/// Start the service and return its base URL, e.g. `http://127.0.0.1:PORT`
async fn start_server() -> String {
    start_server_with_catalog(Arc::new(StaticChemicalCatalog::default())).await
}

async fn start_server_with_catalog(catalog: Arc<dyn ChemicalCatalog>) -> String {
    let state = AppState::new(
        PredictionOrchestrator::local_only(fast_retry()),
        catalog,
        Arc::new(FixedWeather),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(web::serve(listener, Arc::new(state)));
    format!("http://{addr}")
}

fn chlorine() -> Chemical {
    Chemical::new(1, "Chlorine", "gas")
}

fn remote_orchestrator(base_url: &str) -> PredictionOrchestrator {
    let model = RemotePlumeModel::new(base_url, &RemoteConfig::default()).unwrap();
    PredictionOrchestrator::new(Some(Arc::new(model)), fast_retry())
}

#[tokio::test]
async fn test_health() {
    let base = start_server().await;
    let body: Value = reqwest::get(format!("{base}/api/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], plumecast::VERSION);
}

#[tokio::test]
async fn test_http_catalog_lists_builtin_chemicals() {
    let base = start_server().await;
    let catalog = HttpChemicalCatalog::new(&format!("{base}/api"), &RemoteConfig::default()).unwrap();

    let chemicals = catalog.list_chemicals().await.unwrap();
    assert_eq!(chemicals, plumecast::chemicals::builtin_chemicals());

    let ammonia = chemicals.iter().find(|c| c.id == 2).unwrap();
    assert_eq!(ammonia.hazard_class(), HazardClass::Gas);
}

#[tokio::test]
async fn test_chemicals_endpoint_is_tagged() {
    let base = start_server().await;
    let body: Value = reqwest::get(format!("{base}/api/chemicals"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["source"], "live");
    assert_eq!(body["data"].as_array().unwrap().len(), 8);
}

#[tokio::test]
async fn test_catalog_outage_is_reported() {
    let base = start_server_with_catalog(Arc::new(OfflineCatalog)).await;
    let client = reqwest::Client::new();

    let chemicals: Value = client
        .get(format!("{base}/api/chemicals"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(chemicals["source"], "fallback");

    let response = client
        .post(format!("{base}/api/simulate"))
        .json(&json!({"latitude": 40, "longitude": -90, "chemicalId": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let simulation: Value = response.json().await.unwrap();
    let advisories = simulation["advisories"].as_array().unwrap();
    assert!(
        advisories
            .iter()
            .any(|a| a.as_str().unwrap().contains("Chemical catalog unavailable"))
    );
}

#[tokio::test]
async fn test_remote_model_round_trip() {
    let base = start_server().await;
    let model = RemotePlumeModel::new(&format!("{base}/api"), &RemoteConfig::default()).unwrap();
    let center = GeoPoint::new(40.0, -90.0);
    let wind = WindObservation::new(20.0, 180.0, 68.0, 55.0, Utc::now());

    let result = model.predict(center, &chlorine(), &wind).await.unwrap();

    assert_eq!(result.polygon.len(), 25);
    assert!(result.polygon.is_closed());
    assert_eq!(result.properties.hazard_class, HazardClass::Gas);
    assert_eq!(result.properties.source_chemical.unwrap().name, "Chlorine");

    // Served with 20 mph from 180°, so the first point lies due north
    let first = result.polygon.points()[0];
    assert!((first.latitude - 40.02).abs() < 1e-9);
    assert!((first.longitude + 90.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_remote_model_unknown_chemical_is_rejected() {
    let base = start_server().await;
    let model = RemotePlumeModel::new(&format!("{base}/api"), &RemoteConfig::default()).unwrap();
    let unknown = Chemical::new(999, "Unobtainium", "gas");

    let err = model
        .predict(GeoPoint::new(0.0, 0.0), &unknown, &WindObservation::fallback())
        .await
        .unwrap_err();
    assert!(matches!(err, PlumeError::Network { .. }));
}

#[tokio::test]
async fn test_orchestrator_uses_live_remote() {
    let base = start_server().await;
    let orchestrator = remote_orchestrator(&format!("{base}/api"));

    let simulation = orchestrator
        .run_simulation(GeoPoint::new(40.0, -90.0), Some(&chlorine()), &FixedWeather)
        .await
        .unwrap();

    assert_eq!(simulation.prediction.source, DataSource::Live);
    assert_eq!(simulation.prediction.data.polygon.len(), 25);
    assert!(simulation.advisories.is_empty());
    assert_eq!(
        orchestrator.remote_availability(),
        RemoteAvailability::Available
    );
}

#[tokio::test]
async fn test_orchestrator_handles_missing_endpoint() {
    let base = start_server().await;
    let orchestrator = remote_orchestrator(&format!("{base}/not-deployed"));

    let simulation = orchestrator
        .run_simulation(GeoPoint::new(40.0, -90.0), Some(&chlorine()), &FixedWeather)
        .await
        .unwrap();

    assert_eq!(simulation.prediction.source, DataSource::Fallback);
    assert_eq!(simulation.prediction.data.polygon.len(), 25);
    assert!(simulation.advisories[0].contains("not deployed"));
    assert_eq!(
        orchestrator.remote_availability(),
        RemoteAvailability::NotDeployed
    );
}

#[tokio::test]
async fn test_orchestrator_falls_back_when_unreachable() {
    // Bind and drop to get a port nothing listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let orchestrator = remote_orchestrator(&format!("http://{addr}/api"));
    let simulation = orchestrator
        .run_simulation(GeoPoint::new(10.0, 20.0), Some(&chlorine()), &FixedWeather)
        .await
        .unwrap();

    assert!(simulation.prediction.is_fallback());
    assert!(simulation.prediction.data.polygon.is_closed());
    assert_eq!(
        orchestrator.remote_availability(),
        RemoteAvailability::Unknown
    );
}

/// Dispersion endpoint that answers 200 with a body that is not GeoJSON
async fn start_garbled_model(calls: Arc<AtomicU32>) -> String {
    let app = Router::new().route(
        "/api/dispersion",
        post(move || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                "<html>maintenance</html>"
            }
        }),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_orchestrator_retries_malformed_response_then_falls_back() {
    let calls = Arc::new(AtomicU32::new(0));
    let base = start_garbled_model(calls.clone()).await;
    let orchestrator = remote_orchestrator(&format!("{base}/api"));

    let simulation = orchestrator
        .run_simulation(GeoPoint::new(40.0, -90.0), Some(&chlorine()), &FixedWeather)
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), fast_retry().max_attempts());
    assert!(simulation.prediction.is_fallback());
    assert_eq!(simulation.prediction.data.polygon.len(), 25);
    assert!(simulation.advisories[0].contains("Dispersion model unavailable"));
    assert_eq!(
        orchestrator.remote_availability(),
        RemoteAvailability::Unknown
    );
}

#[tokio::test]
async fn test_simulate_validation() {
    let base = start_server().await;
    let client = reqwest::Client::new();
    let url = format!("{base}/api/simulate");

    let no_chemical = client
        .post(&url)
        .json(&json!({"latitude": 40.0, "longitude": -90.0}))
        .send()
        .await
        .unwrap();
    assert_eq!(no_chemical.status(), StatusCode::BAD_REQUEST);
    let body: Value = no_chemical.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("Select a chemical"));

    let bad_latitude = client
        .post(&url)
        .json(&json!({"latitude": 95.0, "longitude": -90.0, "chemicalId": 1}))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_latitude.status(), StatusCode::BAD_REQUEST);

    let unknown = client
        .post(&url)
        .json(&json!({"latitude": 40.0, "longitude": -90.0, "chemicalId": 999}))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_simulate_latest_and_clear() {
    let base = start_server().await;
    let client = reqwest::Client::new();
    let latest_url = format!("{base}/api/simulate/latest");

    let empty = client.get(&latest_url).send().await.unwrap();
    assert_eq!(empty.status(), StatusCode::NOT_FOUND);

    let response = client
        .post(format!("{base}/api/simulate"))
        .json(&json!({"latitude": 40.0, "longitude": -90.0, "chemicalId": 5}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let simulation: Value = response.json().await.unwrap();
    assert_eq!(simulation["weather"]["source"], "live");
    assert_eq!(simulation["prediction"]["source"], "fallback");
    assert_eq!(
        simulation["prediction"]["data"]["properties"]["hazardClass"],
        "liquid"
    );
    assert_eq!(
        simulation["prediction"]["data"]["polygon"]
            .as_array()
            .unwrap()
            .len(),
        25
    );

    let latest: Value = client
        .get(&latest_url)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(latest["token"], simulation["token"]);

    let cleared = client
        .delete(format!("{base}/api/simulate"))
        .send()
        .await
        .unwrap();
    assert_eq!(cleared.status(), StatusCode::NO_CONTENT);

    let after_clear = client.get(&latest_url).send().await.unwrap();
    assert_eq!(after_clear.status(), StatusCode::NOT_FOUND);
}
