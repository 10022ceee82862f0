//! PostgreSQL-backed `BallotRepository` adapter.
//!
//! Each commit runs as one `SERIALIZABLE` transaction: existence of every
//! ballot key is read first, the batch is resolved, then the accepted
//! ballots and their tally increments are written. Conflicting commits are
//! re-run from the read phase so the loser sees the winner's ballots as
//! duplicates.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::ports::{BallotRepository, BallotRepositoryError};
use crate::domain::{
    Ballot, BallotBatch, BallotPlan, BallotResolutionError, CategoryId, Round, TallyField,
    VoteKey, VoterId,
};

use super::diesel_error_mapping::{is_retryable, map_diesel_error, map_pool_error};
use super::models::NewBallotRow;
use super::pool::DbPool;
use super::schema::{ballots, candidates};

/// Transaction attempts before a commit reports contention.
pub const MAX_COMMIT_ATTEMPTS: u32 = 5;

/// Diesel-backed ballot repository.
#[derive(Clone)]
pub struct DieselBallotRepository {
    pool: DbPool,
}

impl DieselBallotRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn query_error(message: String) -> BallotRepositoryError {
    BallotRepositoryError::query(message)
}

fn connection_error(message: String) -> BallotRepositoryError {
    BallotRepositoryError::connection(message)
}

/// Failure inside one commit attempt.
#[derive(Debug)]
enum CommitTxError {
    Diesel(diesel::result::Error),
    Resolution(BallotResolutionError),
    MissingCandidate { candidate_id: String, code_id: String },
}

impl From<diesel::result::Error> for CommitTxError {
    fn from(err: diesel::result::Error) -> Self {
        Self::Diesel(err)
    }
}

impl From<CommitTxError> for BallotRepositoryError {
    fn from(err: CommitTxError) -> Self {
        match err {
            CommitTxError::Diesel(err) => map_diesel_error(err, query_error, connection_error),
            CommitTxError::Resolution(err) => BallotRepositoryError::query(err.to_string()),
            CommitTxError::MissingCandidate {
                candidate_id,
                code_id,
            } => BallotRepositoryError::write(format!(
                "candidate {candidate_id} not found in voting code {code_id}"
            )),
        }
    }
}

/// Increment the counter `field` of one candidate, returning rows touched.
async fn increment_tally(
    conn: &mut AsyncPgConnection,
    ballot: &Ballot,
    field: TallyField,
) -> Result<usize, diesel::result::Error> {
    let target = candidates::table.find((ballot.code_id.as_str(), ballot.candidate_id.as_str()));
    match field {
        TallyField::VoteCount => {
            diesel::update(target)
                .set(candidates::vote_count.eq(candidates::vote_count + 1))
                .execute(conn)
                .await
        }
        TallyField::FinalsVoteCount => {
            diesel::update(target)
                .set(candidates::finals_vote_count.eq(candidates::finals_vote_count + 1))
                .execute(conn)
                .await
        }
    }
}

async fn commit_once(
    conn: &mut AsyncPgConnection,
    batch: &BallotBatch,
    at: DateTime<Utc>,
) -> Result<BallotPlan, CommitTxError> {
    conn.build_transaction()
        .serializable()
        .run(|conn| {
            async move {
                let keys = batch.vote_keys();
                let key_ids: Vec<&str> = keys.iter().map(VoteKey::as_str).collect();
                let stored: HashSet<String> = ballots::table
                    .filter(ballots::id.eq_any(key_ids.clone()))
                    .select(ballots::id)
                    .load::<String>(conn)
                    .await?
                    .into_iter()
                    .collect();
                let existing: Vec<bool> = key_ids.iter().map(|id| stored.contains(*id)).collect();

                let plan = batch
                    .resolve(&existing, at)
                    .map_err(CommitTxError::Resolution)?;

                for ballot in &plan.accepted {
                    diesel::insert_into(ballots::table)
                        .values(NewBallotRow::from(ballot))
                        .execute(conn)
                        .await?;
                    let touched = increment_tally(conn, ballot, ballot.round.tally_field()).await?;
                    if touched == 0 {
                        return Err(CommitTxError::MissingCandidate {
                            candidate_id: ballot.candidate_id.to_string(),
                            code_id: ballot.code_id.to_string(),
                        });
                    }
                }
                Ok(plan)
            }
            .scope_boxed()
        })
        .await
}

#[async_trait]
impl BallotRepository for DieselBallotRepository {
    async fn has_category_ballot(
        &self,
        voter_id: &VoterId,
        category_id: &CategoryId,
        round: Round,
    ) -> Result<bool, BallotRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, connection_error))?;

        diesel::select(diesel::dsl::exists(
            ballots::table
                .filter(ballots::voter_id.eq(voter_id.as_str()))
                .filter(ballots::category_id.eq(category_id.as_str()))
                .filter(ballots::round.eq(i16::from(round.number()))),
        ))
        .get_result::<bool>(&mut conn)
        .await
        .map_err(|err| map_diesel_error(err, query_error, connection_error))
    }

    async fn commit_ballots(
        &self,
        batch: &BallotBatch,
        at: DateTime<Utc>,
    ) -> Result<BallotPlan, BallotRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, connection_error))?;

        for attempt in 1..=MAX_COMMIT_ATTEMPTS {
            match commit_once(&mut conn, batch, at).await {
                Ok(plan) => return Ok(plan),
                Err(CommitTxError::Diesel(err)) if is_retryable(&err) => {
                    debug!(attempt, error = %err, "ballot transaction conflicted, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(BallotRepositoryError::contention(MAX_COMMIT_ATTEMPTS))
    }
}
