//! Landmark narrator - finds significant landmarks near a coordinate and
//! narrates them
//!
//! The core pipeline searches nearby places, scores their significance from
//! several independent providers, selects the closest significant one and
//! produces a short spoken narrative, falling back to the surrounding area
//! when nothing qualifies.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{NarrationPipeline, PipelineError, SignificanceScorer, SourceAggregator, NarrativeSynthesizer};
pub use models::{Coordinates, Landmark, NarrativeResult, PipelineOutcome, SelectionOutcome, SourceDocument, Subject};
pub use services::{ProviderError, Providers};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        // Verify that the library exports work correctly
        let coordinates = Coordinates::new(40.7128, -74.0060);
        assert!(coordinates.is_valid());
        assert!(crate::core::haversine_distance(40.7128, -74.0060, 40.7128, -74.0060) < 1e-9);
    }
}
