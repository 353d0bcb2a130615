use crate::config::{AggregationSettings, TimeoutSettings};
use crate::models::{Coordinates, EntityFacts, SourceDocument, Subject};
use crate::services::{
    with_timeout, Encyclopedia, Entity, KnowledgeGraph, ProviderError, ReverseGeocodeResult,
    ReverseGeocoder,
};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// OSM tags carried into the geodata source document, in output order
pub const GEODATA_TAGS: &[&str] = &[
    "heritage",
    "historic",
    "tourism",
    "wikipedia",
    "website",
    "start_date",
    "architect",
];

/// Fans out to the encyclopedia, knowledge graph and reverse geocoder for one
/// subject and merges what comes back.
///
/// Each channel runs under its own deadline. A failed or slow channel
/// contributes nothing; gathering itself never fails.
#[derive(Clone)]
pub struct SourceAggregator {
    encyclopedia: Arc<dyn Encyclopedia>,
    knowledge_graph: Arc<dyn KnowledgeGraph>,
    geocoder: Arc<dyn ReverseGeocoder>,
    channel_timeout: Duration,
    encyclopedia_results: u32,
    knowledge_graph_results: u32,
}

impl SourceAggregator {
    pub fn new(
        encyclopedia: Arc<dyn Encyclopedia>,
        knowledge_graph: Arc<dyn KnowledgeGraph>,
        geocoder: Arc<dyn ReverseGeocoder>,
        aggregation: &AggregationSettings,
        timeouts: &TimeoutSettings,
    ) -> Self {
        Self {
            encyclopedia,
            knowledge_graph,
            geocoder,
            channel_timeout: timeouts.aggregation(),
            encyclopedia_results: aggregation.encyclopedia_results,
            knowledge_graph_results: aggregation.knowledge_graph_results,
        }
    }

    /// Gather deduplicated sources for a subject, in channel order
    pub async fn gather_sources(&self, subject: &Subject) -> Vec<SourceDocument> {
        self.gather_sources_with(subject, None).await
    }

    /// Same as `gather_sources`, reusing a reverse geocode already made for
    /// the subject's coordinates instead of asking the geocoder again
    pub async fn gather_sources_with(
        &self,
        subject: &Subject,
        known_geocode: Option<&ReverseGeocodeResult>,
    ) -> Vec<SourceDocument> {
        let query = subject.query();
        let coordinates = subject.coordinates();

        let (encyclopedic, knowledge_graph, geodata) = tokio::join!(
            self.channel("encyclopedia", self.encyclopedia_documents(&query)),
            self.channel("knowledge_graph", self.knowledge_graph_documents(&query)),
            self.channel("geodata", self.geodata_documents(subject.display_name(), coordinates, known_geocode)),
        );

        let merged = deduplicate(
            encyclopedic
                .into_iter()
                .chain(knowledge_graph)
                .chain(geodata),
        );

        tracing::debug!("Gathered {} sources for '{}'", merged.len(), query);
        merged
    }

    /// Run one channel under the channel deadline, isolating its failure
    async fn channel<F>(&self, name: &str, call: F) -> Vec<SourceDocument>
    where
        F: std::future::Future<Output = Result<Vec<SourceDocument>, ProviderError>>,
    {
        match with_timeout(self.channel_timeout, call).await {
            Ok(documents) => {
                tracing::debug!("{} channel returned {} documents", name, documents.len());
                documents
            }
            Err(e) => {
                tracing::warn!("{} channel failed: {}", name, e);
                vec![]
            }
        }
    }

    async fn encyclopedia_documents(&self, query: &str) -> Result<Vec<SourceDocument>, ProviderError> {
        let hits = self.encyclopedia.search(query, self.encyclopedia_results).await?;

        let summaries = join_all(hits.iter().map(|hit| self.encyclopedia.summary(&hit.title))).await;

        let documents = summaries
            .into_iter()
            .filter_map(|summary| match summary {
                Ok(summary) => Some(summary),
                Err(e) => {
                    tracing::debug!("Skipping encyclopedia summary: {}", e);
                    None
                }
            })
            .filter(|summary| !(summary.is_disambiguation && summary.extract.is_none()))
            .map(|summary| SourceDocument::new(summary.title, summary.url, summary.extract))
            .collect();

        Ok(documents)
    }

    async fn knowledge_graph_documents(&self, query: &str) -> Result<Vec<SourceDocument>, ProviderError> {
        let entities = self
            .knowledge_graph
            .search(query, self.knowledge_graph_results)
            .await?;

        let facts = join_all(entities.iter().map(|entity| self.knowledge_graph.facts(&entity.id))).await;

        let documents = entities
            .into_iter()
            .zip(facts)
            .map(|(entity, facts)| {
                let facts = facts.unwrap_or_else(|e| {
                    tracing::debug!("Keeping {} without facts: {}", entity.id, e);
                    EntityFacts::default()
                });
                entity_document(entity, &facts)
            })
            .collect();

        Ok(documents)
    }

    async fn geodata_documents(
        &self,
        subject_name: &str,
        coordinates: Coordinates,
        known_geocode: Option<&ReverseGeocodeResult>,
    ) -> Result<Vec<SourceDocument>, ProviderError> {
        let looked_up;
        let result = match known_geocode {
            Some(result) => result,
            None => {
                looked_up = self.geocoder.reverse_geocode(coordinates).await?;
                &looked_up
            }
        };
        Ok(geodata_document(subject_name, coordinates, result)
            .into_iter()
            .collect())
    }
}

/// Drop documents whose (title, url) pair was already seen, keeping the first
pub fn deduplicate(documents: impl IntoIterator<Item = SourceDocument>) -> Vec<SourceDocument> {
    let mut seen = HashSet::new();
    documents
        .into_iter()
        .filter(|doc| {
            let (title, url) = doc.key();
            seen.insert((title.to_owned(), url.to_owned()))
        })
        .collect()
}

/// Knowledge-graph entity as a source: description followed by known facts
pub fn entity_document(entity: Entity, facts: &EntityFacts) -> SourceDocument {
    let mut parts: Vec<String> = Vec::new();
    if let Some(description) = &entity.description {
        parts.push(format!("{}.", description.trim_end_matches('.')));
    }
    if let Some(website) = &facts.website {
        parts.push(format!("Official site: {}.", website));
    }
    if let Some(inception) = &facts.inception {
        parts.push(format!("Inception: {}.", inception));
    }
    if let Some(architect) = &facts.architect {
        parts.push(format!("Architect: {}.", architect));
    }
    if let Some(heritage) = &facts.heritage {
        parts.push(format!("Heritage designation: {}.", heritage));
    }

    let excerpt = if parts.is_empty() { None } else { Some(parts.join(" ")) };
    SourceDocument::new(entity.label, entity.url, excerpt)
}

/// Allow-listed OSM tags rendered into one synthetic source, if any are present
pub fn geodata_document(
    subject_name: &str,
    coordinates: Coordinates,
    result: &ReverseGeocodeResult,
) -> Option<SourceDocument> {
    let facts: Vec<String> = GEODATA_TAGS
        .iter()
        .filter_map(|tag| {
            result
                .tags
                .get(*tag)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .map(|value| format!("{}: {}", tag, value))
        })
        .collect();

    if facts.is_empty() {
        return None;
    }

    let url = result
        .osm_url
        .clone()
        .or_else(|| result.tags.get("website").cloned())
        .unwrap_or_else(|| {
            format!(
                "https://www.openstreetmap.org/?mlat={lat}&mlon={lon}#map=18/{lat}/{lon}",
                lat = coordinates.latitude,
                lon = coordinates.longitude
            )
        });

    Some(SourceDocument::new(
        format!("{} (OpenStreetMap)", subject_name),
        url,
        Some(facts.join("; ")),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn doc(title: &str, url: &str) -> SourceDocument {
        SourceDocument::new(title, url, None)
    }

    #[test]
    fn test_deduplicate_keeps_first_seen() {
        let docs = vec![
            SourceDocument::new("Louvre", "https://a", Some("first".into())),
            doc("Louvre", "https://b"),
            SourceDocument::new("Louvre", "https://a", Some("second".into())),
            doc("Louvre Pyramid", "https://a"),
        ];
        let merged = deduplicate(docs);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].excerpt.as_deref(), Some("first"));
        assert_eq!(merged[2].title, "Louvre Pyramid");
    }

    #[test]
    fn test_entity_document_composes_facts() {
        let entity = Entity {
            id: "Q90".to_string(),
            label: "Arc de Triomphe".to_string(),
            description: Some("monument in Paris, France.".to_string()),
            url: "https://www.wikidata.org/wiki/Q90".to_string(),
        };
        let facts = EntityFacts {
            inception: Some("1806".to_string()),
            architect: Some("Jean Chalgrin".to_string()),
            ..Default::default()
        };
        let document = entity_document(entity, &facts);
        assert_eq!(
            document.excerpt.as_deref(),
            Some("monument in Paris, France. Inception: 1806. Architect: Jean Chalgrin.")
        );
    }

    #[test]
    fn test_entity_document_without_anything() {
        let entity = Entity {
            id: "Q1".to_string(),
            label: "Bare".to_string(),
            description: None,
            url: "https://www.wikidata.org/wiki/Q1".to_string(),
        };
        assert!(entity_document(entity, &EntityFacts::default()).excerpt.is_none());
    }

    #[test]
    fn test_geodata_document_allow_list() {
        let mut result = ReverseGeocodeResult {
            tags: BTreeMap::from([
                ("tourism".to_string(), "attraction".to_string()),
                ("heritage".to_string(), "2".to_string()),
                ("opening_hours".to_string(), "24/7".to_string()),
            ]),
            osm_url: Some("https://www.openstreetmap.org/way/1".to_string()),
            ..Default::default()
        };
        let coordinates = Coordinates::new(45.4341, 12.3388);

        let document = geodata_document("Rialto Bridge", coordinates, &result).unwrap();
        assert_eq!(document.title, "Rialto Bridge (OpenStreetMap)");
        assert_eq!(document.url, "https://www.openstreetmap.org/way/1");
        assert_eq!(document.excerpt.as_deref(), Some("heritage: 2; tourism: attraction"));

        result.osm_url = None;
        let document = geodata_document("Rialto Bridge", coordinates, &result).unwrap();
        assert!(document.url.contains("mlat=45.4341"));
    }

    #[test]
    fn test_geodata_document_website_fallback_and_empty() {
        let result = ReverseGeocodeResult {
            tags: BTreeMap::from([("website".to_string(), "https://example.org".to_string())]),
            ..Default::default()
        };
        let document = geodata_document("X", Coordinates::new(0.0, 0.0), &result).unwrap();
        assert_eq!(document.url, "https://example.org");

        let nothing = ReverseGeocodeResult::default();
        assert!(geodata_document("X", Coordinates::new(0.0, 0.0), &nothing).is_none());
    }
}
