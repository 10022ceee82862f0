//! Port for ballots and candidate tallies.
//!
//! [`BallotRepository::commit_ballots`] is the atomic heart of vote
//! submission. Adapters must:
//!
//! - read the existence of every key in [`BallotBatch::vote_keys`] before
//!   issuing any write;
//! - feed the flags to [`BallotBatch::resolve`] and, for each accepted
//!   ballot, create the ballot document and increment the candidate counter
//!   selected by [`crate::domain::Round::tally_field`];
//! - commit all of it or nothing;
//! - serialise against concurrent commits touching the same keys, retrying
//!   the whole read/write cycle on conflict so that the losing call observes
//!   the winner's ballot as a duplicate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{BallotBatch, BallotPlan, CategoryId, Round, VoterId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by ballot repository adapters.
    pub enum BallotRepositoryError {
        /// Store connection could not be established.
        Connection { message: String } =>
            "ballot store connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } =>
            "ballot store query failed: {message}",
        /// A write inside the ballot transaction failed; nothing was kept.
        Write { message: String } =>
            "ballot transaction aborted: {message}",
        /// Concurrent transactions kept conflicting.
        Contention { attempts: u32 } =>
            "ballot transaction gave up after {attempts} conflicting attempts",
    }
}

/// Storage for ballots and candidate counters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BallotRepository: Send + Sync {
    /// Whether the voter already has any ballot in `category_id` for `round`.
    async fn has_category_ballot(
        &self,
        voter_id: &VoterId,
        category_id: &CategoryId,
        round: Round,
    ) -> Result<bool, BallotRepositoryError>;

    /// Atomically record the batch, stamping new ballots with `at`.
    ///
    /// Returns the resolved plan: ballots written and candidates skipped as
    /// duplicates.
    async fn commit_ballots(
        &self,
        batch: &BallotBatch,
        at: DateTime<Utc>,
    ) -> Result<BallotPlan, BallotRepositoryError>;
}
