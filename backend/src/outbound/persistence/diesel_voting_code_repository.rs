//! PostgreSQL-backed `VotingCodeRepository` adapter.
//!
//! Media blocks live in a JSONB column owned by the admin tooling. The stats
//! counter is updated by locking the row and patching only the `qvote`
//! block's stats in the raw document, so unrelated fields survive.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ports::{VotingCodeRepository, VotingCodeRepositoryError};
use crate::domain::{CodeId, VotingCode};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::media_stats::{self, MediaStatsError};
use super::models::VotingCodeRow;
use super::pool::DbPool;
use super::schema::voting_codes;

/// Diesel-backed voting code repository.
#[derive(Clone)]
pub struct DieselVotingCodeRepository {
    pool: DbPool,
}

impl DieselVotingCodeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn query_error(message: String) -> VotingCodeRepositoryError {
    VotingCodeRepositoryError::query(message)
}

fn connection_error(message: String) -> VotingCodeRepositoryError {
    VotingCodeRepositoryError::connection(message)
}

fn corrupt_media(code_id: &CodeId, err: &serde_json::Error) -> VotingCodeRepositoryError {
    VotingCodeRepositoryError::query(format!("voting code {code_id} has malformed media: {err}"))
}

fn stats_error(code_id: &CodeId, err: MediaStatsError) -> VotingCodeRepositoryError {
    match err {
        MediaStatsError::NoQVoteBlock => {
            VotingCodeRepositoryError::missing_q_vote_block(code_id.as_str())
        }
        other => VotingCodeRepositoryError::query(format!(
            "voting code {code_id} has malformed media: {other}"
        )),
    }
}

/// Failure inside the stats transaction.
enum StatsTxError {
    Diesel(diesel::result::Error),
    Repository(VotingCodeRepositoryError),
}

impl From<diesel::result::Error> for StatsTxError {
    fn from(err: diesel::result::Error) -> Self {
        Self::Diesel(err)
    }
}

impl From<StatsTxError> for VotingCodeRepositoryError {
    fn from(err: StatsTxError) -> Self {
        match err {
            StatsTxError::Diesel(err) => map_diesel_error(err, query_error, connection_error),
            StatsTxError::Repository(err) => err,
        }
    }
}

#[async_trait]
impl VotingCodeRepository for DieselVotingCodeRepository {
    async fn find_by_id(
        &self,
        code_id: &CodeId,
    ) -> Result<Option<VotingCode>, VotingCodeRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, connection_error))?;

        let row: Option<VotingCodeRow> = voting_codes::table
            .find(code_id.as_str())
            .select(VotingCodeRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, query_error, connection_error))?;

        row.map(|row| {
            let media = row
                .media_blocks()
                .map_err(|err| corrupt_media(code_id, &err))?;
            Ok(VotingCode {
                id: code_id.clone(),
                media,
            })
        })
        .transpose()
    }

    async fn record_vote_stats(
        &self,
        code_id: &CodeId,
        added_votes: u32,
        at: DateTime<Utc>,
    ) -> Result<(), VotingCodeRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, connection_error))?;

        conn.transaction(|conn| {
            async move {
                let media: Option<serde_json::Value> = voting_codes::table
                    .find(code_id.as_str())
                    .select(voting_codes::media)
                    .for_update()
                    .first(conn)
                    .await
                    .optional()?;
                let mut media = media.ok_or_else(|| {
                    StatsTxError::Repository(VotingCodeRepositoryError::missing(code_id.as_str()))
                })?;
                media_stats::record_votes(&mut media, added_votes, at)
                    .map_err(|err| StatsTxError::Repository(stats_error(code_id, err)))?;

                diesel::update(voting_codes::table.find(code_id.as_str()))
                    .set((voting_codes::media.eq(media), voting_codes::updated_at.eq(at)))
                    .execute(conn)
                    .await?;
                Ok::<_, StatsTxError>(())
            }
            .scope_boxed()
        })
        .await
        .map_err(VotingCodeRepositoryError::from)
    }
}
