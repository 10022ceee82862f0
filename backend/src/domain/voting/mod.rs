//! Voting data contracts: identifiers, rounds, phone numbers, documents and
//! ballot batches.

mod batch;
mod ids;
mod phone;
mod records;
mod round;

pub use batch::{BallotBatch, BallotPlan, BallotResolutionError};
pub use ids::{CandidateId, CategoryId, CodeId, IdentifierValidationError, VoterId};
pub use phone::{PhoneNumber, PhoneNumberValidationError};
pub use records::{
    Ballot, DEFAULT_MAX_VOTES, MediaBlock, MediaKind, QVoteConfig, QVoteStats,
    VerificationConfig, VerifiedVoter, VerifiedVoterKey, VoteKey, VotingCode,
};
pub use round::{Round, RoundValidationError, TallyField};
