use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::domain::{Coordinates, Landmark};

/// Landmark as submitted by a client
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LandmarkPayload {
    #[validate(length(min = 1))]
    pub id: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[validate(range(min = 0.0))]
    #[serde(alias = "distance_m", rename = "distanceM")]
    pub distance_m: f64,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    #[validate(range(min = 0.0, max = 10.0))]
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<LandmarkPayload> for Landmark {
    fn from(payload: LandmarkPayload) -> Self {
        Landmark {
            id: payload.id,
            name: payload.name,
            category: payload.category,
            distance_m: payload.distance_m,
            coordinates: Coordinates::new(payload.latitude, payload.longitude),
            rating: payload.rating,
            address: payload.address,
            description: payload.description,
        }
    }
}

/// Request to score a single landmark
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScoreLandmarkRequest {
    #[validate(nested)]
    pub landmark: LandmarkPayload,
}

/// Request to score a batch of landmarks
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScoreBatchRequest {
    #[validate(length(min = 1, max = 50), nested)]
    pub landmarks: Vec<LandmarkPayload>,
}

/// Request to narrate a specific landmark
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LandmarkNarrativeRequest {
    #[validate(nested)]
    pub landmark: LandmarkPayload,
}

/// Request carrying only a coordinate (area narrative)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AreaNarrativeRequest {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

/// Request to run the full discovery pipeline
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_discover_coordinates"))]
pub struct DiscoverRequest {
    pub latitude: f64,
    pub longitude: f64,
    #[validate(range(min = 10, max = 5000))]
    #[serde(default, alias = "radius_meters", rename = "radiusMeters")]
    pub radius_meters: Option<u32>,
}

impl DiscoverRequest {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }
}

fn validate_discover_coordinates(req: &DiscoverRequest) -> Result<(), ValidationError> {
    if !req.coordinates().is_valid() {
        return Err(ValidationError::new("invalid_coordinates"));
    }
    Ok(())
}
