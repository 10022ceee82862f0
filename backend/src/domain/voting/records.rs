//! Documents read and written by the vote transaction processor.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CandidateId, CategoryId, CodeId, PhoneNumber, Round, VoterId};

/// Quota granted to a verified voter whose record carries no explicit limit.
pub const DEFAULT_MAX_VOTES: u32 = 1;

/// Kind of an embedded media block. Only `qvote` blocks matter here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Q.Vote configuration block.
    Qvote,
    /// Any other media (images, Q.Hunt, Q.Treasure, ...).
    #[serde(other)]
    Other,
}

/// Phone verification settings of a voting event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationConfig {
    /// Whether ballots require a verified phone session.
    #[serde(default)]
    pub enabled: bool,
}

/// Denormalised summary shown on admin dashboards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QVoteStats {
    #[serde(default)]
    pub total_candidates: u32,
    #[serde(default)]
    pub approved_candidates: u32,
    #[serde(default)]
    pub total_voters: u32,
    #[serde(default)]
    pub total_votes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl QVoteStats {
    /// Add `added` ballots to the running total.
    pub fn record_votes(&mut self, added: u32, at: DateTime<Utc>) {
        self.total_votes = self.total_votes.saturating_add(u64::from(added));
        self.last_updated = Some(at);
    }
}

/// Configuration held by the `qvote` media block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QVoteConfig {
    #[serde(default)]
    pub verification: VerificationConfig,
    #[serde(default)]
    pub stats: QVoteStats,
}

/// One embedded media block of a voting code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaBlock {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qvote_config: Option<QVoteConfig>,
}

/// A voting event as stored by the admin tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingCode {
    pub id: CodeId,
    #[serde(default)]
    pub media: Vec<MediaBlock>,
}

impl VotingCode {
    /// Configuration of the first `qvote` block, if any.
    pub fn qvote_config(&self) -> Option<&QVoteConfig> {
        self.media
            .iter()
            .find(|block| block.kind == MediaKind::Qvote)
            .and_then(|block| block.qvote_config.as_ref())
    }

    /// Mutable access to the first `qvote` block's configuration.
    pub fn qvote_config_mut(&mut self) -> Option<&mut QVoteConfig> {
        self.media
            .iter_mut()
            .find(|block| block.kind == MediaKind::Qvote)
            .map(|block| block.qvote_config.get_or_insert_with(QVoteConfig::default))
    }

    /// Whether ballots for this code need a verified phone session.
    pub fn verification_enabled(&self) -> bool {
        self.qvote_config()
            .is_some_and(|config| config.verification.enabled)
    }
}

/// Key of a verified voter record: `{codeId}_{digits}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerifiedVoterKey(String);

impl VerifiedVoterKey {
    /// Build the key for `phone` under `code_id`.
    pub fn new(code_id: &CodeId, phone: &PhoneNumber) -> Self {
        Self(format!("{code_id}_{phone}"))
    }

    /// Borrow the key.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for VerifiedVoterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Phone-verified voter record created by the verification flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedVoter {
    pub key: VerifiedVoterKey,
    pub session_token: String,
    #[serde(default)]
    pub session_expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub votes_used: u32,
    #[serde(default)]
    pub max_votes: Option<u32>,
    pub updated_at: DateTime<Utc>,
}

impl VerifiedVoter {
    /// Quota for this voter, defaulting to [`DEFAULT_MAX_VOTES`].
    pub fn effective_max_votes(&self) -> u32 {
        self.max_votes.unwrap_or(DEFAULT_MAX_VOTES)
    }

    /// Whether the global quota is exhausted.
    pub fn quota_exhausted(&self) -> bool {
        self.votes_used >= self.effective_max_votes()
    }

    /// Compare `token` with the stored session token.
    ///
    /// Runs over every byte regardless of where the first mismatch occurs.
    pub fn session_matches(&self, token: &str) -> bool {
        let stored = self.session_token.as_bytes();
        let given = token.as_bytes();
        if stored.len() != given.len() {
            return false;
        }
        stored
            .iter()
            .zip(given)
            .fold(0_u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }

    /// A session without an expiry is treated as expired.
    pub fn session_is_live(&self, now: DateTime<Utc>) -> bool {
        self.session_expires_at.is_some_and(|expires| now < expires)
    }
}

/// Ballot key: `{voterId}_{candidateId}_{round}`.
///
/// At most one ballot may ever exist per key; existence of the key is the
/// only signal that the voter already voted for the candidate in the round.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoteKey(String);

impl VoteKey {
    /// Build the key for one voter, candidate and round.
    pub fn new(voter_id: &VoterId, candidate_id: &CandidateId, round: Round) -> Self {
        Self(format!("{voter_id}_{candidate_id}_{round}"))
    }

    /// Borrow the key.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for VoteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Recorded ballot. Created once, never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ballot {
    pub id: VoteKey,
    pub code_id: CodeId,
    pub category_id: Option<CategoryId>,
    pub candidate_id: CandidateId,
    pub voter_id: VoterId,
    pub round: Round,
    pub phone: Option<PhoneNumber>,
    pub created_at: DateTime<Utc>,
}
