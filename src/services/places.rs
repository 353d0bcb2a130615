use crate::core::distance::haversine_distance;
use crate::models::{Coordinates, Landmark};
use crate::services::{non_empty, PlaceSearch, ProviderError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

const PLACE_FIELDS: &str = "fsq_id,name,categories,distance,geocodes,rating,location,description";

/// Foursquare Places API client
///
/// Ratings are on the provider's 0-10 scale and are passed through as-is.
pub struct FoursquareClient {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Place>,
}

#[derive(Debug, Deserialize)]
struct Place {
    fsq_id: String,
    name: String,
    #[serde(default)]
    categories: Vec<Category>,
    distance: Option<f64>,
    geocodes: Option<Geocodes>,
    rating: Option<f64>,
    location: Option<PlaceLocation>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Category {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Geocodes {
    main: Option<LatLng>,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct PlaceLocation {
    formatted_address: Option<String>,
}

impl FoursquareClient {
    pub fn new(client: Client, base_url: String, api_key: Option<String>) -> Self {
        Self {
            base_url,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            client,
        }
    }
}

impl Place {
    /// Map into a landmark, or `None` when the place has no usable position
    fn into_landmark(self, center: Coordinates) -> Option<Landmark> {
        let main = self.geocodes.and_then(|g| g.main)?;
        let coordinates = Coordinates::new(main.latitude, main.longitude);
        if !coordinates.is_valid() {
            return None;
        }

        let distance_m = match self.distance {
            Some(d) if d.is_finite() && d >= 0.0 => d,
            _ => {
                haversine_distance(
                    center.latitude,
                    center.longitude,
                    coordinates.latitude,
                    coordinates.longitude,
                ) * 1000.0
            }
        };

        Some(Landmark {
            id: self.fsq_id,
            name: self.name,
            category: self
                .categories
                .into_iter()
                .next()
                .map(|c| c.name)
                .unwrap_or_default(),
            distance_m,
            coordinates,
            rating: self.rating.filter(|r| r.is_finite()),
            address: non_empty(self.location.as_ref().and_then(|l| l.formatted_address.as_deref())),
            description: non_empty(self.description.as_deref()),
        })
    }
}

#[async_trait]
impl PlaceSearch for FoursquareClient {
    async fn search_places(
        &self,
        center: Coordinates,
        radius_m: u32,
        limit: u32,
    ) -> Result<Vec<Landmark>, ProviderError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| ProviderError::Unconfigured("place search API key is missing".into()))?;

        let url = format!(
            "{}/places/search?ll={},{}&radius={}&limit={}&fields={}",
            self.base_url.trim_end_matches('/'),
            center.latitude,
            center.longitude,
            radius_m,
            limit,
            urlencoding::encode(PLACE_FIELDS)
        );

        tracing::debug!("Searching places within {}m of {:?}", radius_m, center);

        let response = self
            .client
            .get(&url)
            .header("Authorization", api_key)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Place search failed: {} - {}", status, body);
            return Err(ProviderError::ApiError(format!("Place search failed: {}", status)));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse places: {}", e)))?;

        let landmarks: Vec<Landmark> = parsed
            .results
            .into_iter()
            .filter_map(|place| place.into_landmark(center))
            .collect();

        tracing::debug!("Place search returned {} landmarks", landmarks.len());
        Ok(landmarks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{
        "results": [
            {
                "fsq_id": "4adcda10f964a520af3521e3",
                "name": "Pantheon",
                "categories": [{"id": 16026, "name": "Historic Site"}],
                "distance": 142,
                "geocodes": {"main": {"latitude": 41.8986, "longitude": 12.4769}},
                "rating": 9.6,
                "location": {"formatted_address": "Piazza della Rotonda, 00186 Roma RM"},
                "description": "Former Roman temple, now a church."
            },
            {
                "fsq_id": "no-geo",
                "name": "Somewhere",
                "categories": []
            },
            {
                "fsq_id": "no-distance",
                "name": "Fontana",
                "categories": [{"name": "Fountain"}],
                "geocodes": {"main": {"latitude": 41.8990, "longitude": 12.4770}}
            }
        ]
    }"#;

    #[tokio::test]
    async fn test_search_places_maps_results() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/places/search")
            .match_query(mockito::Matcher::Any)
            .match_header("authorization", "fsq-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(BODY)
            .create_async()
            .await;

        let client = FoursquareClient::new(Client::new(), server.url(), Some("fsq-key".into()));
        let landmarks = client
            .search_places(Coordinates::new(41.8986, 12.4760), 500, 10)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(landmarks.len(), 2);
        assert_eq!(landmarks[0].name, "Pantheon");
        assert_eq!(landmarks[0].category, "Historic Site");
        assert_eq!(landmarks[0].distance_m, 142.0);
        assert_eq!(landmarks[0].rating, Some(9.6));
        assert_eq!(landmarks[1].category, "Fountain");
        // Distance computed locally when the provider omits it
        assert!(landmarks[1].distance_m > 0.0 && landmarks[1].distance_m < 200.0);
        assert!(landmarks[1].rating.is_none());
    }

    #[tokio::test]
    async fn test_missing_key_is_unconfigured() {
        let client = FoursquareClient::new(Client::new(), "http://unused".into(), Some("  ".into()));
        let result = client.search_places(Coordinates::new(0.0, 0.0), 500, 10).await;
        assert!(matches!(result, Err(ProviderError::Unconfigured(_))));
    }

    #[tokio::test]
    async fn test_non_success_is_api_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/places/search")
            .match_query(mockito::Matcher::Any)
            .with_status(401)
            .with_body("unauthorized")
            .create_async()
            .await;

        let client = FoursquareClient::new(Client::new(), server.url(), Some("bad".into()));
        let result = client.search_places(Coordinates::new(0.0, 0.0), 500, 10).await;
        assert!(matches!(result, Err(ProviderError::ApiError(_))));
    }
}
