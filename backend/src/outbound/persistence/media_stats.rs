//! In-place stats update on the stored `media` JSONB array.
//!
//! The admin tooling owns everything else in a voting code's media blocks,
//! so the counter is bumped on the raw document rather than through the
//! typed [`crate::domain::MediaBlock`] view, which only models the fields
//! vote submission reads.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

const QVOTE_KIND: &str = "qvote";

/// Why the stats could not be applied to a media document.
#[derive(Debug, Error)]
pub(crate) enum MediaStatsError {
    #[error("media is not an array")]
    NotAnArray,
    #[error("no qvote media block")]
    NoQVoteBlock,
    #[error("`{field}` is not an object")]
    NotAnObject { field: &'static str },
    #[error("`totalVotes` is not a non-negative integer")]
    BadTotal,
    #[error("cannot encode timestamp: {0}")]
    Timestamp(#[from] serde_json::Error),
}

/// Object stored under `field`, created when absent or null.
fn object_at<'a>(
    parent: &'a mut Map<String, Value>,
    field: &'static str,
) -> Result<&'a mut Map<String, Value>, MediaStatsError> {
    let slot = parent
        .entry(field)
        .or_insert_with(|| Value::Object(Map::new()));
    if slot.is_null() {
        *slot = Value::Object(Map::new());
    }
    slot.as_object_mut()
        .ok_or(MediaStatsError::NotAnObject { field })
}

/// Add `added` to the first `qvote` block's `qvoteConfig.stats.totalVotes`
/// and stamp `lastUpdated`. Every other key is left untouched.
pub(crate) fn record_votes(
    media: &mut Value,
    added: u32,
    at: DateTime<Utc>,
) -> Result<(), MediaStatsError> {
    let block = media
        .as_array_mut()
        .ok_or(MediaStatsError::NotAnArray)?
        .iter_mut()
        .filter_map(Value::as_object_mut)
        .find(|block| block.get("type").and_then(Value::as_str) == Some(QVOTE_KIND))
        .ok_or(MediaStatsError::NoQVoteBlock)?;

    let config = object_at(block, "qvoteConfig")?;
    let stats = object_at(config, "stats")?;
    let total = match stats.get("totalVotes") {
        None | Some(Value::Null) => 0,
        Some(value) => value.as_u64().ok_or(MediaStatsError::BadTotal)?,
    };
    stats.insert(
        "totalVotes".to_owned(),
        Value::from(total.saturating_add(u64::from(added))),
    );
    stats.insert("lastUpdated".to_owned(), serde_json::to_value(at)?);
    Ok(())
}
