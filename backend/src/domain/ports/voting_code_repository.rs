//! Port for voting code documents.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{CodeId, VotingCode};

use super::define_port_error;

define_port_error! {
    /// Errors raised by voting code repository adapters.
    pub enum VotingCodeRepositoryError {
        /// Store connection could not be established.
        Connection { message: String } =>
            "voting code store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "voting code store query failed: {message}",
        /// The code vanished between reads.
        Missing { code_id: String } =>
            "voting code {code_id} does not exist",
        /// The code has no `qvote` media block to hold stats.
        MissingQVoteBlock { code_id: String } =>
            "voting code {code_id} has no qvote media block",
    }
}

/// Read access to voting codes plus the best-effort stats counter.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VotingCodeRepository: Send + Sync {
    /// Fetch a voting code; `None` when it does not exist.
    async fn find_by_id(
        &self,
        code_id: &CodeId,
    ) -> Result<Option<VotingCode>, VotingCodeRepositoryError>;

    /// Re-read the code and add `added_votes` to its `qvote` block's
    /// `stats.totalVotes`, stamping `stats.lastUpdated` with `at`.
    ///
    /// Not part of the ballot transaction; callers treat failure as
    /// observability loss only.
    async fn record_vote_stats(
        &self,
        code_id: &CodeId,
        added_votes: u32,
        at: DateTime<Utc>,
    ) -> Result<(), VotingCodeRepositoryError>;
}
