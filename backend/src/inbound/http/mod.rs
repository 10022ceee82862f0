//! HTTP inbound adapter exposing REST endpoints.

use actix_web::web;

pub mod error;
pub mod health;
pub mod schemas;
pub mod state;
pub mod validation;
pub mod votes;

pub use error::ApiResult;

/// Register the ballot endpoint under `/api/v1` and at the root, with JSON
/// extractor failures routed through the error envelope.
///
/// Callers supply [`state::HttpState`] as app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
        .service(web::scope("/api/v1").service(votes::submit_votes))
        .service(votes::submit_votes);
}
