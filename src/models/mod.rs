// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    AreaInfo, Coordinates, EntityFacts, Landmark, NarrativeResult, PipelineOutcome,
    SelectionOutcome, SignificanceScores, SourceDocument, Subject,
};
pub use requests::{
    AreaNarrativeRequest, DiscoverRequest, LandmarkNarrativeRequest, LandmarkPayload,
    ScoreBatchRequest, ScoreLandmarkRequest,
};
pub use responses::{
    ErrorResponse, HealthResponse, NarrativeResponse, ScoreBatchResponse, ScoreResponse,
    ScoredLandmark, SourceLink,
};
