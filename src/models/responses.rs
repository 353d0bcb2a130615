use serde::{Deserialize, Serialize};
use crate::models::domain::{Landmark, NarrativeResult, SourceDocument};

/// Number of sources surfaced to a client
pub const SURFACED_SOURCES: usize = 3;

/// Source reference as surfaced to clients (title + url only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceLink {
    pub title: String,
    pub url: String,
}

impl From<&SourceDocument> for SourceLink {
    fn from(doc: &SourceDocument) -> Self {
        Self {
            title: doc.title.clone(),
            url: doc.url.clone(),
        }
    }
}

/// First few sources in insertion order
pub fn surface_sources(sources: &[SourceDocument]) -> Vec<SourceLink> {
    sources.iter().take(SURFACED_SOURCES).map(SourceLink::from).collect()
}

/// Response for the single-landmark score endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResponse {
    #[serde(rename = "landmarkId")]
    pub landmark_id: String,
    pub score: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredLandmark {
    pub landmark: Landmark,
    pub score: u8,
}

/// Response for the batch score endpoint, in request order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreBatchResponse {
    pub results: Vec<ScoredLandmark>,
}

/// Narrative response for both landmark and area subjects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrativeResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landmark: Option<Landmark>,
    pub narrative: String,
    pub sources: Vec<SourceLink>,
    #[serde(rename = "usedGenerativePath")]
    pub used_generative_path: bool,
    #[serde(rename = "areaName", skip_serializing_if = "Option::is_none")]
    pub area_name: Option<String>,
}

impl NarrativeResponse {
    pub fn new(landmark: Option<Landmark>, result: &NarrativeResult) -> Self {
        Self {
            landmark,
            narrative: result.text.clone(),
            sources: surface_sources(&result.sources),
            used_generative_path: result.used_generative_path,
            area_name: result.area_name.clone(),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
