//! Chemical catalog
//!
//! The catalog lists the substances a user can pick for a simulation. The
//! HTTP catalog talks to the same backend as the remote dispersion model; a
//! built-in list stands in when that backend is unreachable.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::config::RemoteConfig;
use crate::http;
use crate::models::{Chemical, Sourced};
use crate::retry::RetryPolicy;
use crate::{PlumeError, Result};

/// Source of selectable chemicals
#[async_trait]
pub trait ChemicalCatalog: Send + Sync {
    async fn list_chemicals(&self) -> Result<Vec<Chemical>>;
}

/// List chemicals with retry, falling back to the built-in list
#[instrument(skip_all)]
pub async fn fetch_chemicals(
    catalog: &dyn ChemicalCatalog,
    policy: &RetryPolicy,
) -> Sourced<Vec<Chemical>> {
    match policy
        .run("chemical catalog", || catalog.list_chemicals())
        .await
    {
        Ok(chemicals) => Sourced::live(chemicals),
        Err(e) => {
            warn!("Chemical catalog unavailable, using built-in list: {}", e);
            Sourced::fallback(builtin_chemicals())
        }
    }
}

/// Chemicals known without any backend
#[must_use]
pub fn builtin_chemicals() -> Vec<Chemical> {
    vec![
        Chemical::new(1, "Chlorine", "gas"),
        Chemical::new(2, "Ammonia", "gas"),
        Chemical::new(3, "Hydrogen sulfide", "gas"),
        Chemical::new(4, "Sulfur dioxide", "gas"),
        Chemical::new(5, "Benzene", "liquid"),
        Chemical::new(6, "Sulfuric acid", "liquid"),
        Chemical::new(7, "Gasoline", "liquid"),
        Chemical::new(8, "Asbestos", "solid"),
    ]
}

/// In-memory catalog
#[derive(Debug, Clone)]
pub struct StaticChemicalCatalog {
    chemicals: Vec<Chemical>,
}

impl StaticChemicalCatalog {
    #[must_use]
    pub fn new(chemicals: Vec<Chemical>) -> Self {
        Self { chemicals }
    }
}

impl Default for StaticChemicalCatalog {
    fn default() -> Self {
        Self::new(builtin_chemicals())
    }
}

#[async_trait]
impl ChemicalCatalog for StaticChemicalCatalog {
    async fn list_chemicals(&self) -> Result<Vec<Chemical>> {
        Ok(self.chemicals.clone())
    }
}

/// Catalog served by the dispersion backend at `GET {base}/chemicals`
pub struct HttpChemicalCatalog {
    client: Client,
    url: String,
}

impl HttpChemicalCatalog {
    pub fn new(base_url: &str, config: &RemoteConfig) -> Result<Self> {
        Ok(Self {
            client: http::build_client(config.timeout())?,
            url: http::join_url(base_url, "chemicals"),
        })
    }
}

#[async_trait]
impl ChemicalCatalog for HttpChemicalCatalog {
    async fn list_chemicals(&self) -> Result<Vec<Chemical>> {
        let response = self.client.get(&self.url).send().await?;
        let response = http::check_status(response, &self.url).await?;
        let body: ChemicalListBody = response
            .json()
            .await
            .map_err(|e| PlumeError::malformed(format!("Invalid chemical list: {e}")))?;
        let chemicals = body.into_chemicals();
        info!("Loaded {} chemicals from {}", chemicals.len(), self.url);
        Ok(chemicals)
    }
}

/// A bare list, or the tagged envelope another plumecast node serves
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ChemicalListBody {
    Plain(Vec<Chemical>),
    Tagged(Sourced<Vec<Chemical>>),
}

impl ChemicalListBody {
    fn into_chemicals(self) -> Vec<Chemical> {
        match self {
            ChemicalListBody::Plain(chemicals) => chemicals,
            ChemicalListBody::Tagged(sourced) => {
                if sourced.is_fallback() {
                    warn!("Upstream catalog is serving its built-in list");
                }
                sourced.data
            }
        }
    }
}
