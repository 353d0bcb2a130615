use crate::config::{PipelineSettings, Settings};
use crate::core::aggregator::SourceAggregator;
use crate::core::narrative::NarrativeSynthesizer;
use crate::core::scoring::{ScoringError, SignificanceScorer};
use crate::core::selector::{select_by_heuristic, select_with_relaxation};
use crate::models::{
    AreaInfo, Coordinates, Landmark, NarrativeResult, PipelineOutcome, SelectionOutcome,
    SignificanceScores, Subject,
};
use crate::services::{with_timeout, PlaceSearch, Providers, ReverseGeocodeResult, ReverseGeocoder};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid coordinates: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Searching,
    Scoring,
    Selecting,
    AreaFallback,
    Aggregating,
    Synthesizing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Searching => "SEARCHING",
            Stage::Scoring => "SCORING",
            Stage::Selecting => "SELECTING",
            Stage::AreaFallback => "AREA_FALLBACK",
            Stage::Aggregating => "AGGREGATING",
            Stage::Synthesizing => "SYNTHESIZING",
        };
        f.write_str(name)
    }
}

fn enter(stage: Stage, coordinates: Coordinates) {
    tracing::debug!(
        "Pipeline stage {} at ({}, {})",
        stage,
        coordinates.latitude,
        coordinates.longitude
    );
}

/// End-to-end discovery: search, score, select, aggregate, narrate
///
/// Holds only read-only provider handles, so one instance serves any number of
/// concurrent requests, each run fully independent of the others.
#[derive(Clone)]
pub struct NarrationPipeline {
    places: Arc<dyn PlaceSearch>,
    geocoder: Arc<dyn ReverseGeocoder>,
    scorer: SignificanceScorer,
    aggregator: SourceAggregator,
    synthesizer: NarrativeSynthesizer,
    settings: PipelineSettings,
    search_timeout: Duration,
}

impl NarrationPipeline {
    pub fn new(providers: Providers, settings: &Settings) -> Self {
        let timeouts = &settings.timeouts;

        Self {
            scorer: SignificanceScorer::new(
                providers.encyclopedia.clone(),
                providers.knowledge_graph.clone(),
                providers.geocoder.clone(),
                timeouts.signal(),
            ),
            aggregator: SourceAggregator::new(
                providers.encyclopedia.clone(),
                providers.knowledge_graph.clone(),
                providers.geocoder.clone(),
                &settings.aggregation,
                timeouts,
            ),
            synthesizer: NarrativeSynthesizer::new(providers.generator.clone(), timeouts.generation()),
            places: providers.places,
            geocoder: providers.geocoder,
            settings: settings.pipeline.clone(),
            search_timeout: timeouts.search(),
        }
    }

    /// Run discovery at the configured search radius
    pub async fn run(&self, coordinates: Coordinates) -> Result<PipelineOutcome, PipelineError> {
        self.run_with_radius(coordinates, self.settings.search_radius_m).await
    }

    pub async fn run_with_radius(
        &self,
        coordinates: Coordinates,
        radius_m: u32,
    ) -> Result<PipelineOutcome, PipelineError> {
        validate(coordinates)?;

        enter(Stage::Searching, coordinates);
        let search = self
            .places
            .search_places(coordinates, radius_m, self.settings.search_limit);
        let landmarks = match with_timeout(self.search_timeout, search).await {
            Ok(landmarks) => landmarks,
            Err(e) => {
                tracing::error!("Place search failed: {}", e);
                return Ok(PipelineOutcome::NoResult {
                    cause: format!("Place search failed: {}", e),
                });
            }
        };

        tracing::info!("Found {} landmarks within {}m", landmarks.len(), radius_m);

        let selection = if landmarks.is_empty() {
            SelectionOutcome::NoLandmarksInRange
        } else {
            self.choose(&landmarks, coordinates).await
        };

        match selection {
            SelectionOutcome::Chosen(landmark) => {
                tracing::info!("Selected landmark {} ({:.0}m)", landmark.name, landmark.distance_m);
                let narrative = self.narrate_landmark(&landmark).await;
                Ok(PipelineOutcome::Landmark { landmark, narrative })
            }
            outcome => {
                tracing::info!("No landmark selected ({:?})", outcome);
                if !self.settings.area_fallback_enabled {
                    return Ok(PipelineOutcome::NoResult {
                        cause: "No significant landmark nearby and area fallback is disabled".to_string(),
                    });
                }
                Ok(self.area_branch(coordinates).await)
            }
        }
    }

    /// Score then select; falls back to the heuristic when scoring is off or failed
    async fn choose(&self, landmarks: &[Landmark], coordinates: Coordinates) -> SelectionOutcome {
        if self.settings.scoring_enabled {
            enter(Stage::Scoring, coordinates);
            match self.scorer.score_all(landmarks).await {
                Ok(scored) => {
                    let scores: SignificanceScores = scored
                        .into_iter()
                        .map(|(landmark, score)| (landmark.id, score))
                        .collect();
                    enter(Stage::Selecting, coordinates);
                    return select_with_relaxation(landmarks, &scores, self.settings.significance_threshold);
                }
                Err(e) => {
                    tracing::warn!("Scoring failed, using heuristic selection: {}", e);
                }
            }
        }

        enter(Stage::Selecting, coordinates);
        match select_by_heuristic(landmarks) {
            Some(landmark) => SelectionOutcome::Chosen(landmark.clone()),
            None => SelectionOutcome::NoLandmarksInRange,
        }
    }

    /// Gather sources for a landmark and narrate it
    pub async fn narrate_landmark(&self, landmark: &Landmark) -> NarrativeResult {
        let subject = Subject::Landmark(landmark.clone());
        self.narrate(subject, None, None).await
    }

    /// Narrate the area enclosing `coordinates`
    pub async fn narrate_area(&self, coordinates: Coordinates) -> Result<PipelineOutcome, PipelineError> {
        validate(coordinates)?;
        Ok(self.area_branch(coordinates).await)
    }

    pub async fn score(&self, landmark: &Landmark) -> u8 {
        self.scorer.score(landmark).await
    }

    pub async fn score_batch(&self, landmarks: &[Landmark]) -> Result<Vec<(Landmark, u8)>, ScoringError> {
        self.scorer.score_all(landmarks).await
    }

    async fn area_branch(&self, coordinates: Coordinates) -> PipelineOutcome {
        enter(Stage::AreaFallback, coordinates);

        let lookup = with_timeout(self.search_timeout, self.geocoder.reverse_geocode(coordinates)).await;
        let result = match lookup {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("Reverse geocoding failed during area fallback: {}", e);
                return PipelineOutcome::NoResult {
                    cause: format!("Could not determine the surrounding area: {}", e),
                };
            }
        };

        let Some(name) = result.area_name.clone() else {
            return PipelineOutcome::NoResult {
                cause: "No area name known for this location".to_string(),
            };
        };

        let area = AreaInfo {
            name: name.clone(),
            city: result.city.clone(),
            display_name: result.display_name.clone(),
            address: result.address.clone(),
            coordinates,
        };

        let narrative = self.narrate(Subject::Area(area), Some(name), Some(&result)).await;
        PipelineOutcome::Area { narrative }
    }

    async fn narrate(
        &self,
        subject: Subject,
        area_name: Option<String>,
        known_geocode: Option<&ReverseGeocodeResult>,
    ) -> NarrativeResult {
        let coordinates = subject.coordinates();

        enter(Stage::Aggregating, coordinates);
        let sources = self.aggregator.gather_sources_with(&subject, known_geocode).await;

        enter(Stage::Synthesizing, coordinates);
        let narration = self.synthesizer.synthesize(&subject, &sources).await;

        NarrativeResult {
            text: narration.text,
            sources,
            used_generative_path: narration.used_generative_path,
            area_name,
        }
    }
}

fn validate(coordinates: Coordinates) -> Result<(), PipelineError> {
    if coordinates.is_valid() {
        Ok(())
    } else {
        Err(PipelineError::Validation(format!(
            "({}, {}) is outside [-90, 90] x [-180, 180]",
            coordinates.latitude, coordinates.longitude
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_out_of_range() {
        assert!(validate(Coordinates::new(45.0, 9.0)).is_ok());
        assert!(matches!(
            validate(Coordinates::new(95.0, 9.0)),
            Err(PipelineError::Validation(_))
        ));
        assert!(validate(Coordinates::new(0.0, f64::INFINITY)).is_err());
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::AreaFallback.to_string(), "AREA_FALLBACK");
        assert_eq!(Stage::Synthesizing.to_string(), "SYNTHESIZING");
    }
}
