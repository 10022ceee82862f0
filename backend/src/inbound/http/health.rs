//! Readiness and liveness probes.
//!
//! `/health/ready` turns green once the listener is bound and the store is
//! open; `/health/live` stays green until the process starts draining.

use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::{HttpResponse, get, http::header, web};
use serde::Serialize;
use utoipa::ToSchema;

/// Probe flags shared between `main` and the handlers.
#[derive(Debug, Default)]
pub struct HealthState {
    store_open: AtomicBool,
    draining: AtomicBool,
}

/// Body returned by both probes.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Ok,
    Starting,
    Draining,
}

impl HealthState {
    /// Not ready, not draining.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_ready(&self) {
        self.store_open.store(true, Ordering::Release);
    }

    /// Fail both probes so orchestrators stop routing ballots here.
    pub fn mark_draining(&self) {
        self.draining.store(true, Ordering::Release);
    }

    fn draining(&self) -> bool {
        self.draining.load(Ordering::Acquire)
    }

    fn readiness(&self) -> ProbeStatus {
        if self.draining() {
            ProbeStatus::Draining
        } else if self.store_open.load(Ordering::Acquire) {
            ProbeStatus::Ok
        } else {
            ProbeStatus::Starting
        }
    }

    fn liveness(&self) -> ProbeStatus {
        if self.draining() {
            ProbeStatus::Draining
        } else {
            ProbeStatus::Ok
        }
    }
}

fn probe_response(status: ProbeStatus) -> HttpResponse {
    let mut builder = match status {
        ProbeStatus::Ok => HttpResponse::Ok(),
        ProbeStatus::Starting | ProbeStatus::Draining => HttpResponse::ServiceUnavailable(),
    };
    builder
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .json(serde_json::json!({ "status": status }))
}

/// Readiness probe.
#[utoipa::path(
    get,
    path = "/health/ready",
    tags = ["health"],
    responses(
        (status = 200, description = "Accepting ballots"),
        (status = 503, description = "Starting up or draining")
    )
)]
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    probe_response(state.readiness())
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health/live",
    tags = ["health"],
    responses(
        (status = 200, description = "Process is alive"),
        (status = 503, description = "Draining")
    )
)]
#[get("/health/live")]
pub async fn live(state: web::Data<HealthState>) -> HttpResponse {
    probe_response(state.liveness())
}
