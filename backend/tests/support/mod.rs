//! Shared harness for the HTTP integration suites.
//!
//! Builds the real Actix app over an [`InMemoryVoteStore`] and a
//! [`MutableClock`] so suites can seed documents, submit ballots and inspect
//! what was persisted.

use std::sync::Arc;

use actix_web::dev::{Service, ServiceResponse};
use actix_web::{App, test, web};
use chrono::{DateTime, TimeZone, Utc};
use mockable::Clock;
use serde_json::Value;

use qvote_backend::Trace;
use qvote_backend::domain::{
    CandidateId, CodeId, MediaBlock, MediaKind, PhoneNumber, QVoteConfig, VerificationConfig,
    VerifiedVoter, VerifiedVoterKey, VoteSubmissionService, VotingCode,
};
use qvote_backend::inbound::http::configure;
use qvote_backend::inbound::http::state::HttpState;
use qvote_backend::outbound::memory::InMemoryVoteStore;
use qvote_backend::test_support::MutableClock;

pub const SESSION_TOKEN: &str = "session-token-1";
pub const PHONE: &str = "+1 555 0100";

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 18, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub fn code_id(raw: &str) -> CodeId {
    CodeId::new(raw).expect("code id")
}

pub fn candidate(raw: &str) -> CandidateId {
    CandidateId::new(raw).expect("candidate id")
}

pub fn voter_key(code: &str) -> VerifiedVoterKey {
    let phone = PhoneNumber::normalize(PHONE).expect("phone");
    VerifiedVoterKey::new(&code_id(code), &phone)
}

/// Store plus clock behind one app.
pub struct Harness {
    pub store: Arc<InMemoryVoteStore>,
    pub clock: Arc<MutableClock>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemoryVoteStore::new()),
            clock: Arc::new(MutableClock::new(now())),
        }
    }

    /// Register a voting code with `candidates`, verification on or off.
    pub fn with_code(self, code: &str, verification: bool, candidates: &[&str]) -> Self {
        self.store.insert_voting_code(VotingCode {
            id: code_id(code),
            media: vec![
                MediaBlock {
                    id: "cover".to_owned(),
                    kind: MediaKind::Other,
                    qvote_config: None,
                },
                MediaBlock {
                    id: "qvote".to_owned(),
                    kind: MediaKind::Qvote,
                    qvote_config: Some(QVoteConfig {
                        verification: VerificationConfig {
                            enabled: verification,
                        },
                        ..QVoteConfig::default()
                    }),
                },
            ],
        });
        for id in candidates {
            self.store.insert_candidate(code_id(code), candidate(id));
        }
        self
    }

    /// Register the verified voter for [`PHONE`] with a live session.
    pub fn with_verified_voter(self, code: &str, votes_used: u32, max_votes: u32) -> Self {
        self.store.insert_verified_voter(VerifiedVoter {
            key: voter_key(code),
            session_token: SESSION_TOKEN.to_owned(),
            session_expires_at: Some(now() + chrono::Duration::minutes(30)),
            votes_used,
            max_votes: Some(max_votes),
            updated_at: now() - chrono::Duration::hours(1),
        });
        self
    }

    pub async fn app(
        &self,
    ) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>
    {
        let clock: Arc<dyn Clock> = self.clock.clone();
        let service = VoteSubmissionService::new(
            Arc::clone(&self.store),
            Arc::clone(&self.store),
            Arc::clone(&self.store),
            clock,
        );
        let state = web::Data::new(HttpState::new(Arc::new(service)));
        test::init_service(App::new().app_data(state).wrap(Trace).configure(configure)).await
    }

    pub fn votes_for(&self, code: &str, id: &str) -> u64 {
        self.store
            .tally(&code_id(code), &candidate(id))
            .expect("candidate registered")
            .vote_count
    }

    pub fn finals_votes_for(&self, code: &str, id: &str) -> u64 {
        self.store
            .tally(&code_id(code), &candidate(id))
            .expect("candidate registered")
            .finals_vote_count
    }

    pub fn votes_used(&self, code: &str) -> u32 {
        self.store
            .verified_voter(&voter_key(code))
            .expect("voter registered")
            .votes_used
    }

    pub fn total_votes_stat(&self, code: &str) -> u64 {
        self.store
            .voting_code(&code_id(code))
            .and_then(|code| code.qvote_config().map(|config| config.stats.total_votes))
            .expect("qvote block")
    }
}

/// POST `body` to `/api/v1/votes`, returning status and decoded JSON.
pub async fn submit<S>(app: &S, body: Value) -> (u16, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = test::TestRequest::post()
        .uri("/api/v1/votes")
        .set_json(body)
        .to_request();
    let res = test::call_service(app, req).await;
    let status = res.status().as_u16();
    let body: Value = test::read_body_json(res).await;
    (status, body)
}
