//! Ballot batches: the unit of work committed by one submission.
//!
//! A batch is resolved in two phases so storage adapters can honour stores
//! that forbid reads after writes inside a transaction:
//!
//! 1. read existence of every key from [`BallotBatch::vote_keys`];
//! 2. hand the flags to [`BallotBatch::resolve`] and write only the accepted
//!    ballots it returns.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::{Ballot, CandidateId, CategoryId, CodeId, PhoneNumber, Round, VoteKey, VoterId};

/// Ballots one voter casts in one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BallotBatch {
    code_id: CodeId,
    voter_id: VoterId,
    category_id: Option<CategoryId>,
    round: Round,
    phone: Option<PhoneNumber>,
    candidate_ids: Vec<CandidateId>,
}

/// Outcome of resolving a batch against stored ballots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BallotPlan {
    /// Ballots to create, in request order.
    pub accepted: Vec<Ballot>,
    /// Candidates already voted for, in request order.
    pub duplicates: Vec<CandidateId>,
}

/// Raised when an adapter returns a flag list that does not match the keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("expected {expected} existence flags, got {actual}")]
pub struct BallotResolutionError {
    pub expected: usize,
    pub actual: usize,
}

impl BallotBatch {
    /// Assemble a batch for one submission.
    pub fn new(
        code_id: CodeId,
        voter_id: VoterId,
        round: Round,
        candidate_ids: Vec<CandidateId>,
    ) -> Self {
        Self {
            code_id,
            voter_id,
            category_id: None,
            round,
            phone: None,
            candidate_ids,
        }
    }

    /// Tag every ballot with a category.
    #[must_use]
    pub fn with_category(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = category_id;
        self
    }

    /// Record the voter's normalised phone on every ballot.
    #[must_use]
    pub fn with_phone(mut self, phone: Option<PhoneNumber>) -> Self {
        self.phone = phone;
        self
    }

    pub fn code_id(&self) -> &CodeId {
        &self.code_id
    }

    pub fn voter_id(&self) -> &VoterId {
        &self.voter_id
    }

    pub fn round(&self) -> Round {
        self.round
    }

    /// Candidates exactly as requested, repeats included.
    pub fn candidate_ids(&self) -> &[CandidateId] {
        &self.candidate_ids
    }

    /// Keys to read in phase one, one per distinct candidate, in first-seen
    /// order.
    pub fn vote_keys(&self) -> Vec<VoteKey> {
        let mut seen = HashSet::new();
        self.candidate_ids
            .iter()
            .filter(|candidate| seen.insert(*candidate))
            .map(|candidate| VoteKey::new(&self.voter_id, candidate, self.round))
            .collect()
    }

    /// Decide which ballots to write given the phase-one existence flags.
    ///
    /// `existing[i]` answers whether `vote_keys()[i]` is already stored. A
    /// candidate repeated inside the request is a duplicate after its first
    /// occurrence.
    pub fn resolve(
        &self,
        existing: &[bool],
        created_at: DateTime<Utc>,
    ) -> Result<BallotPlan, BallotResolutionError> {
        let expected = self.vote_keys().len();
        if existing.len() != expected {
            return Err(BallotResolutionError {
                expected,
                actual: existing.len(),
            });
        }

        let mut flags = existing.iter().copied();
        let mut seen = HashSet::new();
        let mut plan = BallotPlan::default();
        for candidate in &self.candidate_ids {
            if !seen.insert(candidate) {
                plan.duplicates.push(candidate.clone());
                continue;
            }
            if flags.next().unwrap_or(true) {
                plan.duplicates.push(candidate.clone());
            } else {
                plan.accepted.push(self.ballot_for(candidate, created_at));
            }
        }
        Ok(plan)
    }

    fn ballot_for(&self, candidate_id: &CandidateId, created_at: DateTime<Utc>) -> Ballot {
        Ballot {
            id: VoteKey::new(&self.voter_id, candidate_id, self.round),
            code_id: self.code_id.clone(),
            category_id: self.category_id.clone(),
            candidate_id: candidate_id.clone(),
            voter_id: self.voter_id.clone(),
            round: self.round,
            phone: self.phone.clone(),
            created_at,
        }
    }
}

impl BallotPlan {
    /// Number of ballots the plan creates.
    pub fn votes_submitted(&self) -> u32 {
        u32::try_from(self.accepted.len()).unwrap_or(u32::MAX)
    }
}
