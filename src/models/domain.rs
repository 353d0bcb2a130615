use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A point on the globe in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Latitude within [-90, 90], longitude within [-180, 180], both finite
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Point of interest returned by the place search provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub id: String,
    pub name: String,
    pub category: String,
    #[serde(rename = "distanceM")]
    pub distance_m: f64,
    pub coordinates: Coordinates,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Landmark id -> significance score in [0, 100]
pub type SignificanceScores = HashMap<String, u8>;

/// A deduplicated reference backing a narrative
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceDocument {
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
}

impl SourceDocument {
    pub fn new(title: impl Into<String>, url: impl Into<String>, excerpt: Option<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            excerpt,
        }
    }

    /// Identity used for deduplication across providers
    pub fn key(&self) -> (&str, &str) {
        (&self.title, &self.url)
    }
}

/// Structured facts about a knowledge-graph entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityFacts {
    pub website: Option<String>,
    pub inception: Option<String>,
    pub architect: Option<String>,
    pub heritage: Option<String>,
}

/// The enclosing area of a coordinate, as named by reverse geocoding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaInfo {
    pub name: String,
    pub city: Option<String>,
    pub display_name: String,
    /// Address components in provider order of significance
    pub address: BTreeMap<String, String>,
    pub coordinates: Coordinates,
}

/// What a narrative (and its sources) is about
#[derive(Debug, Clone, PartialEq)]
pub enum Subject {
    Landmark(Landmark),
    Area(AreaInfo),
}

impl Subject {
    pub fn coordinates(&self) -> Coordinates {
        match self {
            Subject::Landmark(landmark) => landmark.coordinates,
            Subject::Area(area) => area.coordinates,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Subject::Landmark(landmark) => &landmark.name,
            Subject::Area(area) => &area.name,
        }
    }

    /// Search seed handed to the encyclopedia and knowledge graph
    pub fn query(&self) -> String {
        match self {
            Subject::Landmark(landmark) => [
                Some(landmark.name.as_str()),
                landmark.address.as_deref(),
                Some(landmark.category.as_str()),
            ]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
            Subject::Area(area) => match &area.city {
                Some(city) if !city.eq_ignore_ascii_case(&area.name) => {
                    format!("{} {}", area.name, city)
                }
                _ => area.name.clone(),
            },
        }
    }
}

/// Final narrative with the sources that back it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeResult {
    pub text: String,
    pub sources: Vec<SourceDocument>,
    #[serde(rename = "usedGenerativePath")]
    pub used_generative_path: bool,
    #[serde(rename = "areaName", skip_serializing_if = "Option::is_none")]
    pub area_name: Option<String>,
}

/// Result of landmark selection
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionOutcome {
    Chosen(Landmark),
    NoCandidate,
    NoLandmarksInRange,
}

/// Terminal output of one pipeline run
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    Landmark {
        landmark: Landmark,
        narrative: NarrativeResult,
    },
    Area {
        narrative: NarrativeResult,
    },
    NoResult {
        cause: String,
    },
}
