use crate::core::filters::{
    count_keywords, is_historical_category, looks_like_disambiguation, NOTABLE_TOURISM_VALUES,
    SIGNIFICANCE_KEYWORDS,
};
use crate::models::{EntityFacts, Landmark};
use crate::services::{
    with_timeout, Encyclopedia, Entity, KnowledgeGraph, ProviderError, ReverseGeocoder, SearchHit,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinSet;

pub const ENCYCLOPEDIC_CAP: u8 = 40;
pub const KNOWLEDGE_GRAPH_CAP: u8 = 30;
pub const GEODATA_CAP: u8 = 20;
pub const MAX_SCORE: u8 = 100;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("Scoring task failed: {0}")]
    TaskFailed(String),
}

/// Per-signal contributions to a significance score
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreBreakdown {
    pub encyclopedic: u8,
    pub knowledge_graph: u8,
    pub geodata: u8,
    pub rating: u8,
    pub category: u8,
}

impl ScoreBreakdown {
    /// Sum of all terms clamped to [0, 100]
    pub fn total(&self) -> u8 {
        let sum = self.encyclopedic as u16
            + self.knowledge_graph as u16
            + self.geodata as u16
            + self.rating as u16
            + self.category as u16;
        sum.min(MAX_SCORE as u16) as u8
    }
}

/// Encyclopedic signal (0-40)
///
/// Base 20 when the search found a page, 5 when the top hit is a
/// disambiguation page, plus 2 per significance keyword in its snippet (max +20).
pub fn encyclopedic_term(hits: &[SearchHit]) -> u8 {
    let Some(top) = hits.first() else {
        return 0;
    };

    let base: u32 = if looks_like_disambiguation(top) { 5 } else { 20 };
    let keywords = top
        .snippet
        .as_deref()
        .map(|s| count_keywords(s, SIGNIFICANCE_KEYWORDS))
        .unwrap_or(0) as u32;
    let bonus = (keywords * 2).min(20);

    (base + bonus).min(ENCYCLOPEDIC_CAP as u32) as u8
}

/// Knowledge-graph signal (0-30)
///
/// Base 10 for a matching entity, plus 3 per significance keyword in its
/// description (max +20), plus 10 for a heritage designation.
pub fn knowledge_graph_term(entity: Option<&Entity>, facts: Option<&EntityFacts>) -> u8 {
    let Some(entity) = entity else {
        return 0;
    };

    let keywords = entity
        .description
        .as_deref()
        .map(|d| count_keywords(d, SIGNIFICANCE_KEYWORDS))
        .unwrap_or(0) as u32;
    let heritage = if facts.is_some_and(|f| f.heritage.is_some()) { 10 } else { 0 };

    (10 + (keywords * 3).min(20) + heritage).min(KNOWLEDGE_GRAPH_CAP as u32) as u8
}

/// Geodata signal from OSM tags (0-20)
pub fn geodata_term(tags: &BTreeMap<String, String>) -> u8 {
    let mut score: u32 = 0;

    // Stage 1: tourism tag
    match tags.get("tourism").map(|t| t.trim().to_lowercase()) {
        Some(t) if NOTABLE_TOURISM_VALUES.contains(&t.as_str()) => score += 10,
        Some(t) if t == "information" => score += 3,
        _ => {}
    }

    // Stage 2: presence tags
    if tags.contains_key("historic") {
        score += 8;
    }
    if tags.contains_key("heritage") {
        score += 5;
    }
    if tags.contains_key("wikipedia") {
        score += 2;
    }

    score.min(GEODATA_CAP as u32) as u8
}

#[inline]
pub fn rating_bonus(rating: Option<f64>) -> u8 {
    match rating {
        Some(r) if r >= 8.0 => 10,
        Some(r) if r >= 7.0 => 5,
        _ => 0,
    }
}

#[inline]
pub fn category_bonus(category: &str) -> u8 {
    if is_historical_category(category) {
        10
    } else {
        0
    }
}

/// Computes bounded significance scores from three time-boxed provider
/// signals plus the landmark's own rating and category.
#[derive(Clone)]
pub struct SignificanceScorer {
    encyclopedia: Arc<dyn Encyclopedia>,
    knowledge_graph: Arc<dyn KnowledgeGraph>,
    geocoder: Arc<dyn ReverseGeocoder>,
    signal_timeout: Duration,
}

impl SignificanceScorer {
    pub fn new(
        encyclopedia: Arc<dyn Encyclopedia>,
        knowledge_graph: Arc<dyn KnowledgeGraph>,
        geocoder: Arc<dyn ReverseGeocoder>,
        signal_timeout: Duration,
    ) -> Self {
        Self {
            encyclopedia,
            knowledge_graph,
            geocoder,
            signal_timeout,
        }
    }

    /// Score one landmark, returning every term
    pub async fn breakdown(&self, landmark: &Landmark) -> ScoreBreakdown {
        let (encyclopedic, knowledge_graph, geodata) = tokio::join!(
            self.encyclopedic_signal(landmark),
            self.knowledge_graph_signal(landmark),
            self.geodata_signal(landmark),
        );

        let breakdown = ScoreBreakdown {
            encyclopedic,
            knowledge_graph,
            geodata,
            rating: rating_bonus(landmark.rating),
            category: category_bonus(&landmark.category),
        };

        tracing::debug!("Scored {} ({}): {:?}", landmark.name, landmark.id, breakdown);
        breakdown
    }

    pub async fn score(&self, landmark: &Landmark) -> u8 {
        self.breakdown(landmark).await.total()
    }

    /// Score every landmark in its own task, returning results in input order
    ///
    /// Tasks belong to a `JoinSet`, so dropping the returned future aborts
    /// every scoring task still running.
    pub async fn score_all(&self, landmarks: &[Landmark]) -> Result<Vec<(Landmark, u8)>, ScoringError> {
        let mut tasks = JoinSet::new();
        for (index, landmark) in landmarks.iter().cloned().enumerate() {
            let scorer = self.clone();
            tasks.spawn(async move {
                let score = scorer.score(&landmark).await;
                (index, landmark, score)
            });
        }

        let mut slots: Vec<Option<(Landmark, u8)>> = vec![None; landmarks.len()];
        while let Some(joined) = tasks.join_next().await {
            let (index, landmark, score) = joined.map_err(|e| ScoringError::TaskFailed(e.to_string()))?;
            slots[index] = Some((landmark, score));
        }

        slots
            .into_iter()
            .map(|slot| slot.ok_or_else(|| ScoringError::TaskFailed("missing score".to_string())))
            .collect()
    }

    async fn encyclopedic_signal(&self, landmark: &Landmark) -> u8 {
        let hits = with_timeout(self.signal_timeout, self.encyclopedia.search(&landmark.name, 1)).await;
        match hits {
            Ok(hits) => encyclopedic_term(&hits),
            Err(e) => signal_failed("encyclopedic", landmark, e),
        }
    }

    async fn knowledge_graph_signal(&self, landmark: &Landmark) -> u8 {
        let lookup = async {
            let entity = self
                .knowledge_graph
                .search(&landmark.name, 1)
                .await?
                .into_iter()
                .next();
            let facts = match &entity {
                Some(entity) => match self.knowledge_graph.facts(&entity.id).await {
                    Ok(facts) => Some(facts),
                    Err(e) => {
                        tracing::debug!("Facts unavailable for {}: {}", entity.id, e);
                        None
                    }
                },
                None => None,
            };
            Ok::<_, ProviderError>((entity, facts))
        };

        match with_timeout(self.signal_timeout, lookup).await {
            Ok((entity, facts)) => knowledge_graph_term(entity.as_ref(), facts.as_ref()),
            Err(e) => signal_failed("knowledge_graph", landmark, e),
        }
    }

    async fn geodata_signal(&self, landmark: &Landmark) -> u8 {
        let result = with_timeout(self.signal_timeout, self.geocoder.reverse_geocode(landmark.coordinates)).await;
        match result {
            Ok(result) => geodata_term(&result.tags),
            Err(e) => signal_failed("geodata", landmark, e),
        }
    }
}

fn signal_failed(signal: &str, landmark: &Landmark, error: ProviderError) -> u8 {
    tracing::warn!("{} signal failed for {}: {}", signal, landmark.name, error);
    0
}
