//! PostgreSQL-backed `VerifiedVoterRepository` adapter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::{VerifiedVoter, VerifiedVoterKey};
use crate::domain::ports::{QuotaClaim, VerifiedVoterRepository, VerifiedVoterRepositoryError};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::VerifiedVoterRow;
use super::pool::DbPool;
use super::schema::verified_voters;

/// Diesel-backed verified voter repository.
#[derive(Clone)]
pub struct DieselVerifiedVoterRepository {
    pool: DbPool,
}

impl DieselVerifiedVoterRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn query_error(message: String) -> VerifiedVoterRepositoryError {
    VerifiedVoterRepositoryError::query(message)
}

fn connection_error(message: String) -> VerifiedVoterRepositoryError {
    VerifiedVoterRepositoryError::connection(message)
}

/// Failure inside the quota claim transaction.
enum ClaimTxError {
    Diesel(diesel::result::Error),
    Repository(VerifiedVoterRepositoryError),
}

impl From<diesel::result::Error> for ClaimTxError {
    fn from(err: diesel::result::Error) -> Self {
        Self::Diesel(err)
    }
}

impl From<ClaimTxError> for VerifiedVoterRepositoryError {
    fn from(err: ClaimTxError) -> Self {
        match err {
            ClaimTxError::Diesel(err) => map_diesel_error(err, query_error, connection_error),
            ClaimTxError::Repository(err) => err,
        }
    }
}

#[async_trait]
impl VerifiedVoterRepository for DieselVerifiedVoterRepository {
    async fn find_by_key(
        &self,
        key: &VerifiedVoterKey,
    ) -> Result<Option<VerifiedVoter>, VerifiedVoterRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, connection_error))?;

        let row: Option<VerifiedVoterRow> = verified_voters::table
            .find(key.as_str())
            .select(VerifiedVoterRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, query_error, connection_error))?;

        Ok(row.map(|row| row.into_domain(key.clone())))
    }

    async fn increment_votes_used(
        &self,
        key: &VerifiedVoterKey,
        at: DateTime<Utc>,
    ) -> Result<QuotaClaim, VerifiedVoterRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, connection_error))?;

        // The row lock makes the quota check and the increment one step, so
        // concurrent submissions queue behind each other here.
        conn.transaction(|conn| {
            async move {
                let row: Option<VerifiedVoterRow> = verified_voters::table
                    .find(key.as_str())
                    .select(VerifiedVoterRow::as_select())
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?;
                let voter = row
                    .map(|row| row.into_domain(key.clone()))
                    .ok_or_else(|| {
                        ClaimTxError::Repository(VerifiedVoterRepositoryError::missing(
                            key.as_str(),
                        ))
                    })?;
                if voter.quota_exhausted() {
                    return Ok(QuotaClaim::Exhausted {
                        votes_used: voter.votes_used,
                        max_votes: voter.effective_max_votes(),
                    });
                }

                let votes_used: i32 = diesel::update(verified_voters::table.find(key.as_str()))
                    .set((
                        verified_voters::votes_used.eq(verified_voters::votes_used + 1),
                        verified_voters::updated_at.eq(at),
                    ))
                    .returning(verified_voters::votes_used)
                    .get_result(conn)
                    .await?;
                Ok::<_, ClaimTxError>(QuotaClaim::Granted {
                    votes_used: u32::try_from(votes_used).unwrap_or(0),
                })
            }
            .scope_boxed()
        })
        .await
        .map_err(VerifiedVoterRepositoryError::from)
    }
}
