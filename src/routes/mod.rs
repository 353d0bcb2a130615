// Route exports
pub mod narrator;

use actix_web::web;

pub use narrator::AppState;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(narrator::configure),
    );
}
