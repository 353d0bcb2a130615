use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::core::{NarrationPipeline, PipelineError};
use crate::models::{
    AreaNarrativeRequest, Coordinates, DiscoverRequest, ErrorResponse, HealthResponse, Landmark,
    LandmarkNarrativeRequest, NarrativeResponse, PipelineOutcome, ScoreBatchRequest,
    ScoreBatchResponse, ScoreLandmarkRequest, ScoreResponse, ScoredLandmark,
};
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<NarrationPipeline>,
}

/// Configure all narrator routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/significance/score", web::post().to(score_landmark))
        .route("/significance/batch", web::post().to(score_batch))
        .route("/narrative/landmark", web::post().to(narrate_landmark))
        .route("/narrative/area", web::post().to(narrate_area))
        .route("/discover", web::post().to(discover));
}

fn validation_failed(message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message,
        status_code: 400,
    })
}

/// Map a pipeline outcome onto the HTTP response shape
fn outcome_response(outcome: Result<PipelineOutcome, PipelineError>) -> HttpResponse {
    match outcome {
        Ok(PipelineOutcome::Landmark { landmark, narrative }) => {
            HttpResponse::Ok().json(NarrativeResponse::new(Some(landmark), &narrative))
        }
        Ok(PipelineOutcome::Area { narrative }) => {
            HttpResponse::Ok().json(NarrativeResponse::new(None, &narrative))
        }
        Ok(PipelineOutcome::NoResult { cause }) => {
            tracing::info!("No result: {}", cause);
            HttpResponse::NotFound().json(ErrorResponse {
                error: "no_result".to_string(),
                message: cause,
                status_code: 404,
            })
        }
        Err(e) => validation_failed(e.to_string()),
    }
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Score a single landmark
///
/// POST /api/v1/significance/score
///
/// Request body:
/// ```json
/// {
///   "landmark": {"id": "string", "name": "string", "category": "string",
///                "distanceM": 120.0, "latitude": 0.0, "longitude": 0.0, "rating": 8.7}
/// }
/// ```
async fn score_landmark(
    state: web::Data<AppState>,
    req: web::Json<ScoreLandmarkRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors.to_string());
    }

    let landmark: Landmark = req.into_inner().landmark.into();
    let score = state.pipeline.score(&landmark).await;

    tracing::info!("Scored landmark {} ({}): {}", landmark.name, landmark.id, score);

    HttpResponse::Ok().json(ScoreResponse {
        landmark_id: landmark.id,
        score,
    })
}

/// Score a batch of landmarks; results keep request order
///
/// POST /api/v1/significance/batch
async fn score_batch(
    state: web::Data<AppState>,
    req: web::Json<ScoreBatchRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors.to_string());
    }

    let landmarks: Vec<Landmark> = req
        .into_inner()
        .landmarks
        .into_iter()
        .map(Landmark::from)
        .collect();

    match state.pipeline.score_batch(&landmarks).await {
        Ok(scored) => {
            tracing::info!("Scored batch of {} landmarks", scored.len());
            HttpResponse::Ok().json(ScoreBatchResponse {
                results: scored
                    .into_iter()
                    .map(|(landmark, score)| ScoredLandmark { landmark, score })
                    .collect(),
            })
        }
        Err(e) => {
            tracing::error!("Batch scoring failed: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Scoring failed".to_string(),
                message: e.to_string(),
                status_code: 500,
            })
        }
    }
}

/// Narrate a landmark chosen by the client
///
/// POST /api/v1/narrative/landmark
async fn narrate_landmark(
    state: web::Data<AppState>,
    req: web::Json<LandmarkNarrativeRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors.to_string());
    }

    let landmark: Landmark = req.into_inner().landmark.into();
    let narrative = state.pipeline.narrate_landmark(&landmark).await;

    tracing::info!(
        "Narrated {} with {} sources (generative: {})",
        landmark.name,
        narrative.sources.len(),
        narrative.used_generative_path
    );

    HttpResponse::Ok().json(NarrativeResponse::new(None, &narrative))
}

/// Narrate the area around a coordinate
///
/// POST /api/v1/narrative/area
async fn narrate_area(
    state: web::Data<AppState>,
    req: web::Json<AreaNarrativeRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_failed(errors.to_string());
    }

    let coordinates = Coordinates::new(req.latitude, req.longitude);
    outcome_response(state.pipeline.narrate_area(coordinates).await)
}

/// Run the full discovery pipeline
///
/// POST /api/v1/discover
///
/// Request body:
/// ```json
/// {
///   "latitude": 41.8986,
///   "longitude": 12.4769,
///   "radiusMeters": 800
/// }
/// ```
async fn discover(
    state: web::Data<AppState>,
    req: web::Json<DiscoverRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for discover request: {:?}", errors);
        return validation_failed(errors.to_string());
    }

    let coordinates = req.coordinates();
    tracing::info!("Discovering around ({}, {})", coordinates.latitude, coordinates.longitude);

    let outcome = match req.radius_meters {
        Some(radius) => state.pipeline.run_with_radius(coordinates, radius).await,
        None => state.pipeline.run(coordinates).await,
    };

    outcome_response(outcome)
}
