//! Internal Diesel row structs.
//!
//! These types never leave the persistence layer; repositories convert them
//! to and from domain documents.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::schema::{ballots, verified_voters, voting_codes};
use crate::domain::{Ballot, MediaBlock, VerifiedVoter, VerifiedVoterKey};

/// Row struct for reading from the voting_codes table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = voting_codes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct VotingCodeRow {
    pub media: serde_json::Value,
}

impl VotingCodeRow {
    /// Decode the media column.
    pub(crate) fn media_blocks(self) -> Result<Vec<MediaBlock>, serde_json::Error> {
        serde_json::from_value(self.media)
    }
}

/// Row struct for reading from the verified_voters table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = verified_voters)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct VerifiedVoterRow {
    pub session_token: String,
    pub session_expires_at: Option<DateTime<Utc>>,
    pub votes_used: i32,
    pub max_votes: Option<i32>,
    pub updated_at: DateTime<Utc>,
}

impl VerifiedVoterRow {
    /// Counters are constrained non-negative by the schema; clamp anyway.
    pub(crate) fn into_domain(self, key: VerifiedVoterKey) -> VerifiedVoter {
        VerifiedVoter {
            key,
            session_token: self.session_token,
            session_expires_at: self.session_expires_at,
            votes_used: u32::try_from(self.votes_used).unwrap_or(0),
            max_votes: self.max_votes.map(|max| u32::try_from(max).unwrap_or(0)),
            updated_at: self.updated_at,
        }
    }
}

/// Insertable struct for creating ballots.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = ballots)]
pub(crate) struct NewBallotRow<'a> {
    pub id: &'a str,
    pub code_id: &'a str,
    pub category_id: Option<&'a str>,
    pub candidate_id: &'a str,
    pub voter_id: &'a str,
    pub round: i16,
    pub phone: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

impl<'a> From<&'a Ballot> for NewBallotRow<'a> {
    fn from(ballot: &'a Ballot) -> Self {
        Self {
            id: ballot.id.as_str(),
            code_id: ballot.code_id.as_str(),
            category_id: ballot.category_id.as_ref().map(|category| category.as_str()),
            candidate_id: ballot.candidate_id.as_str(),
            voter_id: ballot.voter_id.as_str(),
            round: i16::from(ballot.round.number()),
            phone: ballot.phone.as_ref().map(|phone| phone.as_str()),
            created_at: ballot.created_at,
        }
    }
}
