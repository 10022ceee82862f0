//! PostgreSQL persistence adapters using Diesel.
//!
//! Repositories are thin: they translate between row structs and domain
//! documents and map database failures onto the port error types. Row
//! structs (`models.rs`) and table definitions (`schema.rs`) stay private to
//! this module. Connections come from a `bb8` pool of `diesel-async`
//! connections shared by all three repositories.
//!
//! ```ignore
//! use qvote_backend::outbound::persistence::{DbPool, DieselBallotRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/qvote")).await?;
//! let ballots = DieselBallotRepository::new(pool.clone());
//! ```

mod diesel_ballot_repository;
mod diesel_error_mapping;
mod diesel_verified_voter_repository;
mod diesel_voting_code_repository;
mod media_stats;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_ballot_repository::{DieselBallotRepository, MAX_COMMIT_ATTEMPTS};
pub use diesel_verified_voter_repository::DieselVerifiedVoterRepository;
pub use diesel_voting_code_repository::DieselVotingCodeRepository;
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
