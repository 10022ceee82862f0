//! Reasons a submission is refused, and their wire codes.

use std::fmt;

use serde_json::{Value, json};
use thiserror::Error;

use crate::domain::Error;
use crate::domain::ports::VotingCodeRepositoryError;

/// `errorCode` attached to every request validation failure.
pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";

/// Build a 400 error tagged [`VALIDATION_ERROR`].
pub fn validation_error(message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_error_code(VALIDATION_ERROR)
}

/// Why a submission did not reach or survive the ballot transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoteRejection {
    #[error("Voting code not found")]
    CodeNotFound,
    #[error("Phone verification required")]
    VerificationRequired,
    #[error("Phone number not verified")]
    NotVerified,
    #[error("Invalid session")]
    InvalidSession,
    #[error("Session expired, please verify again")]
    SessionExpired,
    #[error("Already voted in this category")]
    AlreadyVotedCategory,
    #[error("Vote limit reached")]
    VoteLimitReached { votes_used: u32, max_votes: u32 },
    /// Any persistence failure on the decision path.
    #[error("Failed to submit votes")]
    Store { message: String },
}

impl VoteRejection {
    /// Wrap a persistence failure.
    pub fn store(error: impl fmt::Display) -> Self {
        Self::Store {
            message: error.to_string(),
        }
    }

    /// Stable code clients branch on.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::CodeNotFound => "CODE_NOT_FOUND",
            Self::VerificationRequired => "VERIFICATION_REQUIRED",
            Self::NotVerified => "NOT_VERIFIED",
            Self::InvalidSession => "INVALID_SESSION",
            Self::SessionExpired => "SESSION_EXPIRED",
            Self::AlreadyVotedCategory => "ALREADY_VOTED_CATEGORY",
            Self::VoteLimitReached { .. } => "VOTE_LIMIT_REACHED",
            Self::Store { .. } => "SUBMIT_FAILED",
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            Self::VoteLimitReached {
                votes_used,
                max_votes,
            } => Some(json!({ "votesUsed": votes_used, "maxVotes": max_votes })),
            Self::Store { message } => Some(Value::String(message.clone())),
            _ => None,
        }
    }
}

impl From<VoteRejection> for Error {
    fn from(rejection: VoteRejection) -> Self {
        let message = rejection.to_string();
        let error = match rejection {
            VoteRejection::CodeNotFound => Error::not_found(message),
            VoteRejection::VerificationRequired
            | VoteRejection::NotVerified
            | VoteRejection::InvalidSession
            | VoteRejection::SessionExpired => Error::unauthorized(message),
            VoteRejection::AlreadyVotedCategory | VoteRejection::VoteLimitReached { .. } => {
                Error::forbidden(message)
            }
            VoteRejection::Store { .. } => Error::internal(message),
        }
        .with_error_code(rejection.error_code());
        match rejection.details() {
            Some(details) => error.with_details(details),
            None => error,
        }
    }
}

/// Failure of the post-commit stats update. Logged, never returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("vote stats update failed: {source}")]
pub struct StatsUpdateError {
    #[from]
    source: VotingCodeRepositoryError,
}
