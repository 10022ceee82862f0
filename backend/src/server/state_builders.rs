//! Builders wiring repositories into the HTTP state.

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock};

use qvote_backend::domain::VoteSubmissionService;
use qvote_backend::domain::ports::VoteSubmissionCommand;
use qvote_backend::inbound::http::state::HttpState;
use qvote_backend::outbound::persistence::{
    DieselBallotRepository, DieselVerifiedVoterRepository, DieselVotingCodeRepository,
};

use super::StoreBackend;

/// Build the vote submission command over the configured store.
///
/// The Postgres backend gets one repository per port sharing the pool; the
/// memory backend serves all three ports from the same store.
pub(crate) fn build_vote_submission(
    store: &StoreBackend,
    clock: Arc<dyn Clock>,
) -> Arc<dyn VoteSubmissionCommand> {
    match store {
        StoreBackend::Postgres(pool) => Arc::new(VoteSubmissionService::new(
            Arc::new(DieselVotingCodeRepository::new(pool.clone())),
            Arc::new(DieselVerifiedVoterRepository::new(pool.clone())),
            Arc::new(DieselBallotRepository::new(pool.clone())),
            clock,
        )),
        StoreBackend::Memory(store) => Arc::new(VoteSubmissionService::new(
            Arc::clone(store),
            Arc::clone(store),
            Arc::clone(store),
            clock,
        )),
    }
}

/// Build the shared HTTP state using the system clock.
pub(crate) fn build_http_state(store: &StoreBackend) -> web::Data<HttpState> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    web::Data::new(HttpState::new(build_vote_submission(store, clock)))
}
