//! OpenAPI schema definitions for domain types.
//!
//! Domain types stay framework-agnostic and do not derive `ToSchema`. These
//! wrappers mirror their wire shape for utoipa.

use serde::Serialize;
use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
#[derive(Serialize, ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCodeSchema {
    InvalidRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
#[derive(Serialize, ToSchema)]
#[schema(as = crate::domain::Error)]
#[serde(rename_all = "camelCase")]
#[allow(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorSchema {
    /// Coarse failure category.
    #[schema(example = "unauthorized")]
    code: ErrorCodeSchema,
    /// Human-readable message.
    #[schema(example = "Session expired, please verify again")]
    error: String,
    /// Precise reason clients branch on.
    #[schema(example = "SESSION_EXPIRED")]
    error_code: Option<String>,
    /// Correlation identifier echoed in the `trace-id` header.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    /// `{votesUsed, maxVotes}` for quota failures, a diagnostic string for
    /// store failures, field context for validation failures.
    details: Option<serde_json::Value>,
}
