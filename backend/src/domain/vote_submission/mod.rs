//! Vote transaction processor.
//!
//! Decides whether a voter may cast the requested ballots and records them.
//! A call moves through these stages, stopping at the first rejection:
//!
//! 1. resolve the voting code;
//! 2. when the code's `qvote` block enables verification, check the phone
//!    session and then the quota (per category, or the global `votesUsed`
//!    counter);
//! 3. commit the ballots in one all-or-nothing transaction;
//! 4. bump the code's vote stats, logging and discarding any failure.
//!
//! The quota increment and the ballot transaction are separate store
//! operations. A failure between them leaves `votesUsed` incremented with no
//! ballots recorded.

mod rejection;

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    BallotRepository, QuotaClaim, VerifiedVoterRepository, VoteSubmissionCommand, VoteSubmissionRequest,
    VoteSubmissionResponse, VotingCodeRepository,
};
use crate::domain::{BallotBatch, CodeId, Error, VerifiedVoter, VerifiedVoterKey};

pub use rejection::{StatsUpdateError, VALIDATION_ERROR, VoteRejection, validation_error};

/// Domain service implementing [`VoteSubmissionCommand`].
#[derive(Clone)]
pub struct VoteSubmissionService<C, V, B> {
    codes: Arc<C>,
    voters: Arc<V>,
    ballots: Arc<B>,
    clock: Arc<dyn Clock>,
}

impl<C, V, B> VoteSubmissionService<C, V, B> {
    /// Create a new service over the given repositories.
    pub fn new(codes: Arc<C>, voters: Arc<V>, ballots: Arc<B>, clock: Arc<dyn Clock>) -> Self {
        Self {
            codes,
            voters,
            ballots,
            clock,
        }
    }
}

impl<C, V, B> VoteSubmissionService<C, V, B>
where
    C: VotingCodeRepository,
    V: VerifiedVoterRepository,
    B: BallotRepository,
{
    async fn process(
        &self,
        request: VoteSubmissionRequest,
    ) -> Result<VoteSubmissionResponse, VoteRejection> {
        let code = self
            .codes
            .find_by_id(&request.code_id)
            .await
            .map_err(VoteRejection::store)?
            .ok_or(VoteRejection::CodeNotFound)?;

        if code.verification_enabled() {
            let voter = self.verify_session(&request).await?;
            self.enforce_quota(&request, &voter).await?;
        }

        let VoteSubmissionRequest {
            code_id,
            voter_id,
            candidate_ids,
            round,
            category_id,
            phone,
            ..
        } = request;
        let batch = BallotBatch::new(code_id, voter_id, round, candidate_ids)
            .with_category(category_id)
            .with_phone(phone);
        let plan = self
            .ballots
            .commit_ballots(&batch, self.clock.utc())
            .await
            .map_err(VoteRejection::store)?;

        let votes_submitted = plan.votes_submitted();
        if votes_submitted > 0 {
            if let Err(error) = self.record_stats(batch.code_id(), votes_submitted).await {
                warn!(code_id = %batch.code_id(), %error, "vote stats not updated");
            }
        }

        info!(
            code_id = %batch.code_id(),
            round = batch.round().number(),
            votes_submitted,
            duplicates = plan.duplicates.len(),
            "ballots committed"
        );
        Ok(VoteSubmissionResponse::submitted(
            votes_submitted,
            plan.duplicates,
        ))
    }

    /// Check the phone session of a verification-enabled code.
    async fn verify_session(
        &self,
        request: &VoteSubmissionRequest,
    ) -> Result<VerifiedVoter, VoteRejection> {
        let (Some(phone), Some(token)) = (request.phone.as_ref(), request.session_token.as_deref())
        else {
            return Err(VoteRejection::VerificationRequired);
        };

        let key = VerifiedVoterKey::new(&request.code_id, phone);
        let Some(voter) = self
            .voters
            .find_by_key(&key)
            .await
            .map_err(VoteRejection::store)?
        else {
            debug!(phone = %phone.fingerprint(), "no verified voter for phone");
            return Err(VoteRejection::NotVerified);
        };

        if !voter.session_matches(token) {
            debug!(phone = %phone.fingerprint(), "session token mismatch");
            return Err(VoteRejection::InvalidSession);
        }
        if !voter.session_is_live(self.clock.utc()) {
            return Err(VoteRejection::SessionExpired);
        }
        Ok(voter)
    }

    async fn enforce_quota(
        &self,
        request: &VoteSubmissionRequest,
        voter: &VerifiedVoter,
    ) -> Result<(), VoteRejection> {
        if let Some(category_id) = request.category_id.as_ref() {
            let voted = self
                .ballots
                .has_category_ballot(&request.voter_id, category_id, request.round)
                .await
                .map_err(VoteRejection::store)?;
            return if voted {
                Err(VoteRejection::AlreadyVotedCategory)
            } else {
                Ok(())
            };
        }

        if voter.quota_exhausted() {
            return Err(VoteRejection::VoteLimitReached {
                votes_used: voter.votes_used,
                max_votes: voter.effective_max_votes(),
            });
        }
        let claim = self
            .voters
            .increment_votes_used(&voter.key, self.clock.utc())
            .await
            .map_err(VoteRejection::store)?;
        match claim {
            QuotaClaim::Granted { votes_used } => {
                debug!(votes_used, "vote quota consumed");
                Ok(())
            }
            // A concurrent submission spent the last vote after our read.
            QuotaClaim::Exhausted {
                votes_used,
                max_votes,
            } => Err(VoteRejection::VoteLimitReached {
                votes_used,
                max_votes,
            }),
        }
    }

    /// Add `added` ballots to the code's stats outside the ballot
    /// transaction.
    pub async fn record_stats(&self, code_id: &CodeId, added: u32) -> Result<(), StatsUpdateError> {
        self.codes
            .record_vote_stats(code_id, added, self.clock.utc())
            .await
            .map_err(StatsUpdateError::from)
    }
}

#[async_trait]
impl<C, V, B> VoteSubmissionCommand for VoteSubmissionService<C, V, B>
where
    C: VotingCodeRepository,
    V: VerifiedVoterRepository,
    B: BallotRepository,
{
    async fn submit(
        &self,
        request: VoteSubmissionRequest,
    ) -> Result<VoteSubmissionResponse, Error> {
        if request.candidate_ids.is_empty() {
            return Err(validation_error(
                "candidateIds must contain at least one candidate",
            ));
        }
        self.process(request).await.map_err(|rejection| {
            if let VoteRejection::Store { message } = &rejection {
                warn!(%message, "vote submission failed in store");
            }
            Error::from(rejection)
        })
    }
}
