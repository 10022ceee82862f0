//! Domain primitives, ports and services.
//!
//! Purpose: hold the vote transaction rules independent of HTTP and storage.
//! Adapters depend on this module; it depends on none of them.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure envelope.
//! - voting types: identifiers, rounds, phone numbers, stored documents.
//! - VoteSubmissionService: the vote transaction processor.

pub mod error;
pub mod ports;
pub mod trace_id;
pub mod vote_submission;
pub mod voting;

pub use self::error::{Error, ErrorCode};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::vote_submission::{
    StatsUpdateError, VALIDATION_ERROR, VoteRejection, VoteSubmissionService, validation_error,
};
pub use self::voting::*;

/// Convenient API result alias.
pub type ApiResult<T> = Result<T, Error>;
