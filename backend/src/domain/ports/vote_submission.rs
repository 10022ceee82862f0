//! Driving port for ballot submission.
//!
//! The [`VoteSubmissionCommand`] trait is what inbound adapters call once a
//! request body has been parsed into typed identifiers. Implementations own
//! the whole decision chain: code lookup, phone session checks, quotas and
//! the ballot transaction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{CandidateId, CategoryId, CodeId, Error, PhoneNumber, Round, VoterId};

/// Ballots a voter wants to cast in one call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteSubmissionRequest {
    /// Voting event the ballots belong to.
    pub code_id: CodeId,
    /// Opaque client-chosen voter identity.
    pub voter_id: VoterId,
    /// Candidates to vote for, in request order.
    pub candidate_ids: Vec<CandidateId>,
    /// Voting round; selects the tally counter.
    pub round: Round,
    /// Category the ballots belong to, when the event is categorised.
    pub category_id: Option<CategoryId>,
    /// Normalised phone of a verified voter.
    pub phone: Option<PhoneNumber>,
    /// Session token issued by the verification flow.
    pub session_token: Option<String>,
}

/// Outcome of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteSubmissionResponse {
    /// `true` when at least one ballot was created.
    pub success: bool,
    /// Number of ballots created by this call.
    pub votes_submitted: u32,
    /// Candidates that were already voted for.
    pub duplicates: Vec<CandidateId>,
}

impl VoteSubmissionResponse {
    /// Build the response for a committed transaction.
    pub fn submitted(votes_submitted: u32, duplicates: Vec<CandidateId>) -> Self {
        Self {
            success: votes_submitted > 0,
            votes_submitted,
            duplicates,
        }
    }
}

/// Driving port for ballot submission.
///
/// Submitting the same ballots twice is safe: the second call creates
/// nothing and reports every candidate as a duplicate.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VoteSubmissionCommand: Send + Sync {
    /// Validate the request against the event and record its ballots.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] carrying a stable `errorCode` when the voter is
    /// not allowed to vote, when the code does not exist, or when the
    /// ballot transaction fails.
    async fn submit(
        &self,
        request: VoteSubmissionRequest,
    ) -> Result<VoteSubmissionResponse, Error>;
}

/// Fixture implementation for adapter tests.
///
/// Accepts every candidate once without persisting anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureVoteSubmissionCommand;

#[async_trait]
impl VoteSubmissionCommand for FixtureVoteSubmissionCommand {
    async fn submit(
        &self,
        request: VoteSubmissionRequest,
    ) -> Result<VoteSubmissionResponse, Error> {
        let submitted = u32::try_from(request.candidate_ids.len()).unwrap_or(u32::MAX);
        Ok(VoteSubmissionResponse::submitted(submitted, Vec::new()))
    }
}
