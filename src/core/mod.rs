// Core algorithm exports
pub mod aggregator;
pub mod distance;
pub mod filters;
pub mod narrative;
pub mod pipeline;
pub mod scoring;
pub mod selector;

pub use aggregator::{deduplicate, SourceAggregator};
pub use distance::{describe_distance, haversine_distance};
pub use filters::{count_keywords, is_historical_category, looks_like_disambiguation};
pub use narrative::{build_prompt, template_narrative, Narration, NarrativeSynthesizer, SkippedTier, Tier};
pub use pipeline::{NarrationPipeline, PipelineError};
pub use scoring::{ScoreBreakdown, ScoringError, SignificanceScorer};
pub use selector::{select, select_by_heuristic, select_with_relaxation};
