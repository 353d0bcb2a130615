use crate::models::EntityFacts;
use crate::services::{non_empty, Entity, KnowledgeGraph, ProviderError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

const PROP_WEBSITE: &str = "P856";
const PROP_INCEPTION: &str = "P571";
const PROP_ARCHITECT: &str = "P84";
const PROP_HERITAGE: &str = "P1435";

/// Wikidata client for entity search and a fixed set of facts
pub struct WikidataClient {
    api_url: String,
    language: String,
    client: Client,
}

impl WikidataClient {
    pub fn new(client: Client, api_url: String, language: String) -> Self {
        Self {
            api_url,
            language,
            client,
        }
    }

    /// Human-readable entity page, derived from the API endpoint
    fn entity_url(&self, id: &str) -> String {
        let base = self
            .api_url
            .trim_end_matches('/')
            .trim_end_matches("/api.php")
            .trim_end_matches("/w");
        format!("{}/wiki/{}", base, id)
    }

    async fn get_json(&self, url: &str) -> Result<Value, ProviderError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::ApiError(format!(
                "Knowledge graph request failed: {}",
                response.status()
            )));
        }
        response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse knowledge graph: {}", e)))
    }

    /// Resolve entity ids to labels in one request; unresolved ids map to themselves
    async fn labels(&self, ids: &[String]) -> Vec<(String, String)> {
        if ids.is_empty() {
            return vec![];
        }
        let url = format!(
            "{}?action=wbgetentities&format=json&props=labels&languages={}&ids={}",
            self.api_url,
            self.language,
            urlencoding::encode(&ids.join("|"))
        );

        let json = match self.get_json(&url).await {
            Ok(json) => json,
            Err(e) => {
                tracing::debug!("Label lookup failed, keeping raw ids: {}", e);
                Value::Null
            }
        };

        ids.iter()
            .map(|id| {
                let label = json
                    .pointer(&format!("/entities/{}/labels/{}/value", id, self.language))
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| id.clone());
                (id.clone(), label)
            })
            .collect()
    }
}

/// First claim value for a property, as the raw datavalue
fn first_claim<'a>(claims: &'a Value, property: &str) -> Option<&'a Value> {
    claims
        .get(property)?
        .as_array()?
        .iter()
        .find_map(|claim| claim.pointer("/mainsnak/datavalue/value"))
}

fn string_claim(claims: &Value, property: &str) -> Option<String> {
    non_empty(first_claim(claims, property)?.as_str())
}

fn entity_claim(claims: &Value, property: &str) -> Option<String> {
    non_empty(first_claim(claims, property)?.get("id")?.as_str())
}

/// Wikidata time values look like "+1889-03-31T00:00:00Z"; keep the year
fn time_claim(claims: &Value, property: &str) -> Option<String> {
    let raw = first_claim(claims, property)?.get("time")?.as_str()?;
    let unsigned = raw.trim_start_matches(['+', '-']);
    let year = unsigned.split('-').next()?.trim_start_matches('0');
    if year.is_empty() {
        return None;
    }
    if raw.starts_with('-') {
        Some(format!("{} BCE", year))
    } else {
        Some(year.to_string())
    }
}

#[async_trait]
impl KnowledgeGraph for WikidataClient {
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<Entity>, ProviderError> {
        let url = format!(
            "{}?action=wbsearchentities&format=json&type=item&language={}&limit={}&search={}",
            self.api_url,
            self.language,
            limit,
            urlencoding::encode(query)
        );

        tracing::debug!("Knowledge graph search: {}", query);

        let json = self.get_json(&url).await?;
        let results = json
            .get("search")
            .and_then(Value::as_array)
            .ok_or_else(|| ProviderError::InvalidResponse("Missing search array".into()))?;

        let entities = results
            .iter()
            .filter_map(|item| {
                let id = item.get("id")?.as_str()?.to_string();
                let label = item
                    .get("label")
                    .and_then(Value::as_str)
                    .unwrap_or(&id)
                    .to_string();
                Some(Entity {
                    url: self.entity_url(&id),
                    description: non_empty(item.get("description").and_then(Value::as_str)),
                    id,
                    label,
                })
            })
            .take(limit as usize)
            .collect();

        Ok(entities)
    }

    async fn facts(&self, id: &str) -> Result<EntityFacts, ProviderError> {
        let url = format!(
            "{}?action=wbgetentities&format=json&props=claims&ids={}",
            self.api_url,
            urlencoding::encode(id)
        );

        let json = self.get_json(&url).await?;
        let claims = json
            .pointer(&format!("/entities/{}/claims", id))
            .ok_or_else(|| ProviderError::NotFound(format!("Entity {} has no claims", id)))?;

        let architect_id = entity_claim(claims, PROP_ARCHITECT);
        let heritage_id = entity_claim(claims, PROP_HERITAGE);
        let referenced: Vec<String> = architect_id.iter().chain(heritage_id.iter()).cloned().collect();
        let labels = self.labels(&referenced).await;
        let label_for = |id: Option<String>| {
            id.map(|id| {
                labels
                    .iter()
                    .find(|(k, _)| *k == id)
                    .map(|(_, label)| label.clone())
                    .unwrap_or(id)
            })
        };

        Ok(EntityFacts {
            website: string_claim(claims, PROP_WEBSITE),
            inception: time_claim(claims, PROP_INCEPTION),
            architect: label_for(architect_id),
            heritage: label_for(heritage_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_search_entities() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/w/api.php")
            .match_query(Matcher::UrlEncoded("action".into(), "wbsearchentities".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"search": [
                    {"id": "Q243", "label": "Eiffel Tower", "description": "tower in Paris, France, landmark and tourist attraction"},
                    {"id": "Q999"}
                ]}"#,
            )
            .create_async()
            .await;

        let client = WikidataClient::new(Client::new(), format!("{}/w/api.php", server.url()), "en".into());
        let entities = client.search("Eiffel Tower", 2).await.unwrap();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].id, "Q243");
        assert_eq!(entities[0].url, format!("{}/wiki/Q243", server.url()));
        assert!(entities[0].description.as_deref().unwrap().contains("landmark"));
        assert_eq!(entities[1].label, "Q999");
        assert!(entities[1].description.is_none());
    }

    #[tokio::test]
    async fn test_facts_resolves_labels() {
        let mut server = mockito::Server::new_async().await;
        let _claims = server
            .mock("GET", "/w/api.php")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("action".into(), "wbgetentities".into()),
                Matcher::UrlEncoded("props".into(), "claims".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"entities": {"Q243": {"claims": {
                    "P856": [{"mainsnak": {"datavalue": {"value": "https://www.toureiffel.paris/"}}}],
                    "P571": [{"mainsnak": {"datavalue": {"value": {"time": "+1887-01-28T00:00:00Z"}}}}],
                    "P84": [{"mainsnak": {"datavalue": {"value": {"id": "Q20882"}}}}],
                    "P1435": [{"mainsnak": {"datavalue": {"value": {"id": "Q916475"}}}}]
                }}}}"#,
            )
            .create_async()
            .await;
        let _labels = server
            .mock("GET", "/w/api.php")
            .match_query(Matcher::UrlEncoded("props".into(), "labels".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"entities": {
                    "Q20882": {"labels": {"en": {"value": "Stephen Sauvestre"}}},
                    "Q916475": {"labels": {"en": {"value": "monument historique classé"}}}
                }}"#,
            )
            .create_async()
            .await;

        let client = WikidataClient::new(Client::new(), format!("{}/w/api.php", server.url()), "en".into());
        let facts = client.facts("Q243").await.unwrap();
        assert_eq!(facts.website.as_deref(), Some("https://www.toureiffel.paris/"));
        assert_eq!(facts.inception.as_deref(), Some("1887"));
        assert_eq!(facts.architect.as_deref(), Some("Stephen Sauvestre"));
        assert_eq!(facts.heritage.as_deref(), Some("monument historique classé"));
    }

    #[test]
    fn test_time_claim_formats() {
        let claims: Value = serde_json::json!({
            "P571": [{"mainsnak": {"datavalue": {"value": {"time": "-0070-00-00T00:00:00Z"}}}}]
        });
        assert_eq!(time_claim(&claims, PROP_INCEPTION).as_deref(), Some("70 BCE"));

        let empty: Value = serde_json::json!({});
        assert!(time_claim(&empty, PROP_INCEPTION).is_none());
        assert!(string_claim(&empty, PROP_WEBSITE).is_none());
    }
}
