//! Port for phone-verified voter records.
//!
//! Records are issued by the external verification flow; this side only
//! reads them and bumps the `votesUsed` counter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{VerifiedVoter, VerifiedVoterKey};

use super::define_port_error;

define_port_error! {
    /// Errors raised by verified voter repository adapters.
    pub enum VerifiedVoterRepositoryError {
        /// Store connection could not be established.
        Connection { message: String } =>
            "verified voter store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "verified voter store query failed: {message}",
        /// The record vanished before the counter update.
        Missing { key: String } =>
            "verified voter {key} does not exist",
    }
}

/// Result of asking the store to spend one vote from a voter's quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaClaim {
    /// The counter was bumped; `votes_used` is its new value.
    Granted { votes_used: u32 },
    /// The quota was already spent when the claim reached the store.
    Exhausted { votes_used: u32, max_votes: u32 },
}

/// Storage for verified voters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VerifiedVoterRepository: Send + Sync {
    /// Fetch a verified voter; `None` when the phone was never verified.
    async fn find_by_key(
        &self,
        key: &VerifiedVoterKey,
    ) -> Result<Option<VerifiedVoter>, VerifiedVoterRepositoryError>;

    /// Add one to `votesUsed` and stamp `updatedAt`, but only while
    /// `votesUsed` is below the voter's quota.
    ///
    /// The check and the increment must be a single atomic step so that
    /// concurrent submissions cannot both spend the last vote.
    async fn increment_votes_used(
        &self,
        key: &VerifiedVoterKey,
        at: DateTime<Utc>,
    ) -> Result<QuotaClaim, VerifiedVoterRepositoryError>;
}
