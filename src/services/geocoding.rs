use crate::models::Coordinates;
use crate::services::{non_empty, ProviderError, ReverseGeocodeResult, ReverseGeocoder};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

/// Address keys, most specific first, that can name the enclosing area
const AREA_KEYS: &[&str] = &[
    "neighbourhood",
    "suburb",
    "quarter",
    "city_district",
    "village",
    "town",
    "city",
    "municipality",
    "county",
    "state",
];

const CITY_KEYS: &[&str] = &["city", "town", "village", "municipality"];

/// Nominatim reverse geocoding client
pub struct NominatimClient {
    base_url: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    error: Option<String>,
    osm_type: Option<String>,
    osm_id: Option<u64>,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    address: HashMap<String, String>,
    #[serde(default)]
    extratags: Option<HashMap<String, String>>,
}

impl NominatimClient {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { base_url, client }
    }
}

fn first_of(address: &HashMap<String, String>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| non_empty(address.get(*key).map(String::as_str)))
}

impl From<ReverseResponse> for ReverseGeocodeResult {
    fn from(resp: ReverseResponse) -> Self {
        let osm_url = match (resp.osm_type.as_deref(), resp.osm_id) {
            (Some(kind), Some(id)) if !kind.is_empty() => {
                Some(format!("https://www.openstreetmap.org/{}/{}", kind, id))
            }
            _ => None,
        };

        ReverseGeocodeResult {
            area_name: first_of(&resp.address, AREA_KEYS),
            city: first_of(&resp.address, CITY_KEYS),
            display_name: resp.display_name,
            address: resp.address.into_iter().collect::<BTreeMap<_, _>>(),
            tags: resp
                .extratags
                .unwrap_or_default()
                .into_iter()
                .collect::<BTreeMap<_, _>>(),
            osm_url,
        }
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimClient {
    async fn reverse_geocode(
        &self,
        coordinates: Coordinates,
    ) -> Result<ReverseGeocodeResult, ProviderError> {
        let url = format!(
            "{}/reverse?format=jsonv2&lat={}&lon={}&zoom=18&addressdetails=1&extratags=1",
            self.base_url.trim_end_matches('/'),
            coordinates.latitude,
            coordinates.longitude
        );

        tracing::debug!("Reverse geocoding {:?}", coordinates);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(ProviderError::ApiError(format!(
                "Reverse geocoding failed: {}",
                response.status()
            )));
        }

        let parsed: ReverseResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse reverse geocode: {}", e)))?;

        if let Some(error) = parsed.error {
            return Err(ProviderError::NotFound(error));
        }

        Ok(parsed.into())
    }
}
