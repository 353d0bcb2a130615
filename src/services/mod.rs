// Service exports
pub mod encyclopedia;
pub mod generative;
pub mod geocoding;
pub mod knowledge_graph;
pub mod places;

pub use encyclopedia::WikipediaClient;
pub use generative::{GenerationError, OpenAiCompatibleClient};
pub use geocoding::NominatimClient;
pub use knowledge_graph::WikidataClient;
pub use places::FoursquareClient;

use crate::config::ProviderSettings;
use crate::models::{Coordinates, EntityFacts, Landmark};
use async_trait::async_trait;
use reqwest::Client;
use scraper::Html;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when talking to an external provider
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    Unconfigured(String),

    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

/// Run a provider call under its own deadline.
///
/// The inner future is dropped when the deadline passes, which cancels only
/// that call.
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or(Err(ProviderError::Timeout(limit)))
}

/// Encyclopedia keyword search hit
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub title: String,
    /// Plain-text snippet around the match, markup removed
    pub snippet: Option<String>,
}

/// One-paragraph encyclopedia page summary
#[derive(Debug, Clone, PartialEq)]
pub struct PageSummary {
    pub title: String,
    pub url: String,
    pub extract: Option<String>,
    pub is_disambiguation: bool,
}

/// Knowledge-graph entity search result
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: String,
    pub label: String,
    pub description: Option<String>,
    /// Canonical page for the entity
    pub url: String,
}

/// Reverse geocoding result with the OSM tags of the matched object
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReverseGeocodeResult {
    pub area_name: Option<String>,
    pub city: Option<String>,
    pub display_name: String,
    pub address: BTreeMap<String, String>,
    pub tags: BTreeMap<String, String>,
    pub osm_url: Option<String>,
}

#[async_trait]
pub trait PlaceSearch: Send + Sync {
    async fn search_places(
        &self,
        center: Coordinates,
        radius_m: u32,
        limit: u32,
    ) -> Result<Vec<Landmark>, ProviderError>;
}

#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse_geocode(
        &self,
        coordinates: Coordinates,
    ) -> Result<ReverseGeocodeResult, ProviderError>;
}

#[async_trait]
pub trait Encyclopedia: Send + Sync {
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<SearchHit>, ProviderError>;
    async fn summary(&self, title: &str) -> Result<PageSummary, ProviderError>;
}

#[async_trait]
pub trait KnowledgeGraph: Send + Sync {
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<Entity>, ProviderError>;
    async fn facts(&self, id: &str) -> Result<EntityFacts, ProviderError>;
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, timeout: Duration) -> Result<String, GenerationError>;
}

/// Read-only handles to every external collaborator used by the pipeline
#[derive(Clone)]
pub struct Providers {
    pub places: Arc<dyn PlaceSearch>,
    pub geocoder: Arc<dyn ReverseGeocoder>,
    pub encyclopedia: Arc<dyn Encyclopedia>,
    pub knowledge_graph: Arc<dyn KnowledgeGraph>,
    pub generator: Arc<dyn TextGenerator>,
}

impl Providers {
    /// Build the HTTP bindings from configuration.
    ///
    /// Missing credentials do not fail here; the affected provider reports
    /// `Unconfigured` when called.
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            places: Arc::new(FoursquareClient::new(
                client.clone(),
                settings.places.base_url.clone(),
                settings.places.api_key.clone(),
            )),
            geocoder: Arc::new(NominatimClient::new(
                client.clone(),
                settings.geocoding.base_url.clone(),
            )),
            encyclopedia: Arc::new(WikipediaClient::new(
                client.clone(),
                settings.encyclopedia.api_url.clone(),
                settings.encyclopedia.rest_url.clone(),
            )),
            knowledge_graph: Arc::new(WikidataClient::new(
                client.clone(),
                settings.knowledge_graph.api_url.clone(),
                settings.knowledge_graph.language.clone(),
            )),
            generator: Arc::new(OpenAiCompatibleClient::new(
                client,
                settings.generative.base_url.clone(),
                settings.generative.api_key.clone(),
                settings.generative.model.clone(),
            )),
        })
    }
}

/// Text content of an HTML snippet with entities decoded and whitespace collapsed
pub(crate) fn strip_markup(raw: &str) -> String {
    let fragment = Html::parse_fragment(raw);
    let text = fragment.root_element().text().collect::<String>();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Trimmed, non-empty string or `None`
pub(crate) fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
