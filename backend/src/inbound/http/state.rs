//! Shared HTTP adapter state.
//!
//! Handlers receive this via `actix_web::web::Data` and depend only on the
//! driving port, so they stay testable without I/O.

use std::sync::Arc;

use crate::domain::ports::VoteSubmissionCommand;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub votes: Arc<dyn VoteSubmissionCommand>,
}

impl HttpState {
    pub fn new(votes: Arc<dyn VoteSubmissionCommand>) -> Self {
        Self { votes }
    }
}
