//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod ballot_repository;
mod verified_voter_repository;
mod vote_submission;
mod voting_code_repository;

#[cfg(test)]
pub use ballot_repository::MockBallotRepository;
pub use ballot_repository::{BallotRepository, BallotRepositoryError};
#[cfg(test)]
pub use verified_voter_repository::MockVerifiedVoterRepository;
pub use verified_voter_repository::{
    QuotaClaim, VerifiedVoterRepository, VerifiedVoterRepositoryError,
};
#[cfg(test)]
pub use vote_submission::MockVoteSubmissionCommand;
pub use vote_submission::{
    FixtureVoteSubmissionCommand, VoteSubmissionCommand, VoteSubmissionRequest,
    VoteSubmissionResponse,
};
#[cfg(test)]
pub use voting_code_repository::MockVotingCodeRepository;
pub use voting_code_repository::{VotingCodeRepository, VotingCodeRepositoryError};
