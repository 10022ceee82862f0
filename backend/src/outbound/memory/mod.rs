//! In-process document store implementing the voting repository ports.
//!
//! Used when no database URL is configured and by the integration suites.
//! A single mutex guards every collection, so a ballot commit observes and
//! mutates a consistent snapshot. Commits stage their writes and apply them
//! only once every write has been validated.

mod seed;

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ports::{
    BallotRepository, BallotRepositoryError, QuotaClaim, VerifiedVoterRepository,
    VerifiedVoterRepositoryError, VotingCodeRepository, VotingCodeRepositoryError,
};
use crate::domain::{
    Ballot, BallotBatch, BallotPlan, CandidateId, CategoryId, CodeId, Round, TallyField,
    VerifiedVoter, VerifiedVoterKey, VoteKey, VoterId, VotingCode,
};

pub use seed::{SeedCandidate, SeedDocument, SeedError};

/// Vote counters of one candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateTally {
    #[serde(default)]
    pub vote_count: u64,
    #[serde(default)]
    pub finals_vote_count: u64,
}

impl CandidateTally {
    /// Value of the counter selected by `field`.
    pub fn get(&self, field: TallyField) -> u64 {
        match field {
            TallyField::VoteCount => self.vote_count,
            TallyField::FinalsVoteCount => self.finals_vote_count,
        }
    }

    fn increment(&mut self, field: TallyField) {
        let counter = match field {
            TallyField::VoteCount => &mut self.vote_count,
            TallyField::FinalsVoteCount => &mut self.finals_vote_count,
        };
        *counter = counter.saturating_add(1);
    }
}

type CandidateKey = (CodeId, CandidateId);

#[derive(Default)]
struct Documents {
    voting_codes: HashMap<CodeId, VotingCode>,
    verified_voters: HashMap<VerifiedVoterKey, VerifiedVoter>,
    ballots: BTreeMap<VoteKey, Ballot>,
    candidates: HashMap<CandidateKey, CandidateTally>,
}

#[derive(Default)]
struct Faults {
    /// 1-based index of the staged write the next commit fails on.
    commit_write: Option<usize>,
    stats_update: Option<String>,
}

/// Shared in-memory store for voting codes, verified voters, ballots and
/// candidate tallies.
#[derive(Default)]
pub struct InMemoryVoteStore {
    documents: Mutex<Documents>,
    faults: Mutex<Faults>,
}

impl InMemoryVoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated from a seed document.
    pub fn from_seed(seed: SeedDocument) -> Self {
        let store = Self::new();
        for code in seed.voting_codes {
            store.insert_voting_code(code);
        }
        for voter in seed.verified_voters {
            store.insert_verified_voter(voter);
        }
        for candidate in seed.candidates {
            store.insert_candidate_tally(candidate.code_id, candidate.id, candidate.tally);
        }
        store
    }

    // Writes are applied only after validation, so a poisoned lock still
    // guards consistent data.
    fn documents(&self) -> MutexGuard<'_, Documents> {
        self.documents.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn faults(&self) -> MutexGuard<'_, Faults> {
        self.faults.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert_voting_code(&self, code: VotingCode) {
        self.documents().voting_codes.insert(code.id.clone(), code);
    }

    pub fn insert_verified_voter(&self, voter: VerifiedVoter) {
        self.documents()
            .verified_voters
            .insert(voter.key.clone(), voter);
    }

    /// Register a candidate with zeroed counters.
    pub fn insert_candidate(&self, code_id: CodeId, candidate_id: CandidateId) {
        self.insert_candidate_tally(code_id, candidate_id, CandidateTally::default());
    }

    pub fn insert_candidate_tally(
        &self,
        code_id: CodeId,
        candidate_id: CandidateId,
        tally: CandidateTally,
    ) {
        self.documents()
            .candidates
            .insert((code_id, candidate_id), tally);
    }

    pub fn voting_code(&self, code_id: &CodeId) -> Option<VotingCode> {
        self.documents().voting_codes.get(code_id).cloned()
    }

    pub fn verified_voter(&self, key: &VerifiedVoterKey) -> Option<VerifiedVoter> {
        self.documents().verified_voters.get(key).cloned()
    }

    pub fn ballot(&self, key: &VoteKey) -> Option<Ballot> {
        self.documents().ballots.get(key).cloned()
    }

    pub fn ballot_count(&self) -> usize {
        self.documents().ballots.len()
    }

    pub fn tally(&self, code_id: &CodeId, candidate_id: &CandidateId) -> Option<CandidateTally> {
        self.documents()
            .candidates
            .get(&(code_id.clone(), candidate_id.clone()))
            .copied()
    }

    /// Make the next ballot commit fail on its `write`-th staged write.
    ///
    /// Each accepted ballot stages two writes: the ballot, then its tally.
    #[cfg(any(test, feature = "test-support"))]
    pub fn fail_commit_at_write(&self, write: usize) {
        self.faults().commit_write = Some(write);
    }

    /// Make every stats update fail with `message`.
    #[cfg(any(test, feature = "test-support"))]
    pub fn fail_stats_updates(&self, message: impl Into<String>) {
        self.faults().stats_update = Some(message.into());
    }
}

/// Writes staged by one commit.
#[derive(Default)]
struct StagedCommit {
    ballots: Vec<Ballot>,
    tallies: Vec<(CandidateKey, TallyField)>,
    writes: usize,
}

impl StagedCommit {
    fn next_write(&mut self, fail_at: Option<usize>) -> Result<(), BallotRepositoryError> {
        self.writes += 1;
        if fail_at == Some(self.writes) {
            return Err(BallotRepositoryError::write(format!(
                "injected failure at write {}",
                self.writes
            )));
        }
        Ok(())
    }

    fn apply(self, documents: &mut Documents) {
        for ballot in self.ballots {
            documents.ballots.insert(ballot.id.clone(), ballot);
        }
        for (key, field) in self.tallies {
            if let Some(tally) = documents.candidates.get_mut(&key) {
                tally.increment(field);
            }
        }
    }
}

#[async_trait]
impl VotingCodeRepository for InMemoryVoteStore {
    async fn find_by_id(
        &self,
        code_id: &CodeId,
    ) -> Result<Option<VotingCode>, VotingCodeRepositoryError> {
        Ok(self.voting_code(code_id))
    }

    async fn record_vote_stats(
        &self,
        code_id: &CodeId,
        added_votes: u32,
        at: DateTime<Utc>,
    ) -> Result<(), VotingCodeRepositoryError> {
        if let Some(message) = self.faults().stats_update.clone() {
            return Err(VotingCodeRepositoryError::query(message));
        }
        let mut documents = self.documents();
        let code = documents
            .voting_codes
            .get_mut(code_id)
            .ok_or_else(|| VotingCodeRepositoryError::missing(code_id.as_str()))?;
        let config = code
            .qvote_config_mut()
            .ok_or_else(|| VotingCodeRepositoryError::missing_q_vote_block(code_id.as_str()))?;
        config.stats.record_votes(added_votes, at);
        Ok(())
    }
}

#[async_trait]
impl VerifiedVoterRepository for InMemoryVoteStore {
    async fn find_by_key(
        &self,
        key: &VerifiedVoterKey,
    ) -> Result<Option<VerifiedVoter>, VerifiedVoterRepositoryError> {
        Ok(self.verified_voter(key))
    }

    async fn increment_votes_used(
        &self,
        key: &VerifiedVoterKey,
        at: DateTime<Utc>,
    ) -> Result<QuotaClaim, VerifiedVoterRepositoryError> {
        let mut documents = self.documents();
        let voter = documents
            .verified_voters
            .get_mut(key)
            .ok_or_else(|| VerifiedVoterRepositoryError::missing(key.as_str()))?;
        if voter.quota_exhausted() {
            return Ok(QuotaClaim::Exhausted {
                votes_used: voter.votes_used,
                max_votes: voter.effective_max_votes(),
            });
        }
        voter.votes_used = voter.votes_used.saturating_add(1);
        voter.updated_at = at;
        Ok(QuotaClaim::Granted {
            votes_used: voter.votes_used,
        })
    }
}

#[async_trait]
impl BallotRepository for InMemoryVoteStore {
    async fn has_category_ballot(
        &self,
        voter_id: &VoterId,
        category_id: &CategoryId,
        round: Round,
    ) -> Result<bool, BallotRepositoryError> {
        Ok(self.documents().ballots.values().any(|ballot| {
            ballot.voter_id == *voter_id
                && ballot.round == round
                && ballot.category_id.as_ref() == Some(category_id)
        }))
    }

    async fn commit_ballots(
        &self,
        batch: &BallotBatch,
        at: DateTime<Utc>,
    ) -> Result<BallotPlan, BallotRepositoryError> {
        let fail_at = self.faults().commit_write.take();
        let mut documents = self.documents();

        let existing: Vec<bool> = batch
            .vote_keys()
            .iter()
            .map(|key| documents.ballots.contains_key(key))
            .collect();
        let plan = batch
            .resolve(&existing, at)
            .map_err(|err| BallotRepositoryError::query(err.to_string()))?;

        let mut staged = StagedCommit::default();
        for ballot in &plan.accepted {
            staged.next_write(fail_at)?;
            staged.ballots.push(ballot.clone());

            staged.next_write(fail_at)?;
            let key = (ballot.code_id.clone(), ballot.candidate_id.clone());
            if !documents.candidates.contains_key(&key) {
                return Err(BallotRepositoryError::write(format!(
                    "candidate {} not found in voting code {}",
                    ballot.candidate_id, ballot.code_id
                )));
            }
            staged.tallies.push((key, ballot.round.tally_field()));
        }

        staged.apply(&mut documents);
        Ok(plan)
    }
}
