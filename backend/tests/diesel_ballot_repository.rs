//! Integration tests for the Diesel voting adapters.
//!
//! Runs the ballot transaction, the quota claim and the stats update against
//! embedded PostgreSQL, one freshly migrated database per test.

use chrono::{DateTime, Duration, TimeZone, Utc};
use pg_embedded_setup_unpriv::TemporaryDatabase;
use qvote_backend::domain::ports::{
    BallotRepository, BallotRepositoryError, QuotaClaim, VerifiedVoterRepository,
    VotingCodeRepository,
};
use qvote_backend::domain::{
    BallotBatch, CandidateId, CategoryId, CodeId, PhoneNumber, Round, VerifiedVoterKey, VoterId,
};
use qvote_backend::outbound::persistence::{
    DbPool, DieselBallotRepository, DieselVerifiedVoterRepository, DieselVotingCodeRepository,
    PoolConfig,
};
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use tokio::runtime::Runtime;

#[path = "support/cluster_skip.rs"]
mod cluster_skip;
#[path = "support/embedded_postgres.rs"]
mod embedded_postgres;

use cluster_skip::handle_cluster_setup_failure;
use embedded_postgres::{client, format_postgres_error, provision_template_database};

const CODE: &str = "code_555";
const PHONE: &str = "+1 555 0100";

struct TestContext {
    runtime: Runtime,
    ballots: DieselBallotRepository,
    voters: DieselVerifiedVoterRepository,
    codes: DieselVotingCodeRepository,
    database_url: String,
    _database: TemporaryDatabase,
}

impl TestContext {
    fn execute(&self, sql: &str, params: &[&(dyn postgres::types::ToSql + Sync)]) {
        let mut db = client(&self.database_url).expect("seed client");
        db.execute(sql, params)
            .map_err(|err| format_postgres_error(&err))
            .expect("seed statement");
    }

    fn query_one(&self, sql: &str, params: &[&(dyn postgres::types::ToSql + Sync)]) -> postgres::Row {
        let mut db = client(&self.database_url).expect("query client");
        db.query_one(sql, params)
            .map_err(|err| format_postgres_error(&err))
            .expect("query row")
    }

    fn insert_code(&self, media: &Value) {
        let media = media.to_string();
        self.execute(
            "INSERT INTO voting_codes (id, media) VALUES ($1, $2::text::jsonb)",
            &[&CODE, &media],
        );
    }

    fn insert_candidates(&self, ids: &[&str]) {
        for id in ids {
            self.execute(
                "INSERT INTO candidates (code_id, id) VALUES ($1, $2)",
                &[&CODE, id],
            );
        }
    }

    fn insert_voter(&self, votes_used: i32, max_votes: Option<i32>) -> VerifiedVoterKey {
        let key = voter_key();
        self.execute(
            concat!(
                "INSERT INTO verified_voters (key, session_token, session_expires_at, ",
                "votes_used, max_votes) VALUES ($1, 'token', now() + interval '1 hour', $2, $3)"
            ),
            &[&key.as_str(), &votes_used, &max_votes],
        );
        key
    }

    /// `(voteCount, finalsVoteCount)` of one candidate.
    fn tally(&self, candidate: &str) -> (i64, i64) {
        let row = self.query_one(
            "SELECT vote_count, finals_vote_count FROM candidates WHERE code_id = $1 AND id = $2",
            &[&CODE, &candidate],
        );
        (row.get(0), row.get(1))
    }

    fn ballot_count(&self) -> i64 {
        self.query_one("SELECT count(*) FROM ballots", &[]).get(0)
    }

    fn votes_used(&self, key: &VerifiedVoterKey) -> i32 {
        self.query_one(
            "SELECT votes_used FROM verified_voters WHERE key = $1",
            &[&key.as_str()],
        )
        .get(0)
    }

    fn media(&self) -> Value {
        let raw: String = self
            .query_one(
                "SELECT media::text FROM voting_codes WHERE id = $1",
                &[&CODE],
            )
            .get(0);
        serde_json::from_str(&raw).expect("media json")
    }
}

fn at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 18, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn code_id() -> CodeId {
    CodeId::new(CODE).expect("code id")
}

fn voter_key() -> VerifiedVoterKey {
    let phone = PhoneNumber::normalize(PHONE).expect("phone");
    VerifiedVoterKey::new(&code_id(), &phone)
}

fn batch(candidates: &[&str], round: Round) -> BallotBatch {
    BallotBatch::new(
        code_id(),
        VoterId::new("voter-1").expect("voter id"),
        round,
        candidates
            .iter()
            .map(|id| CandidateId::new(*id).expect("candidate id"))
            .collect(),
    )
}

fn admin_media() -> Value {
    json!([
        { "id": "m0", "type": "image", "url": "https://cdn/x.png" },
        {
            "id": "m1",
            "type": "qvote",
            "order": 2,
            "qvoteConfig": {
                "verification": { "enabled": true, "codeLength": 6 },
                "categories": [{ "id": "best-dish", "name": "Best dish" }],
                "stats": { "totalVotes": 4, "totalCandidates": 3 }
            }
        }
    ])
}

fn setup_context() -> Result<TestContext, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = pg_embedded_setup_unpriv::test_support::shared_cluster_handle()
        .map_err(|err| err.to_string())?;
    let database = provision_template_database(cluster)?;
    let database_url = database.url().to_string();

    let pool = runtime
        .block_on(DbPool::new(
            PoolConfig::new(database_url.as_str()).with_max_size(4),
        ))
        .map_err(|err| err.to_string())?;

    Ok(TestContext {
        runtime,
        ballots: DieselBallotRepository::new(pool.clone()),
        voters: DieselVerifiedVoterRepository::new(pool.clone()),
        codes: DieselVotingCodeRepository::new(pool),
        database_url,
        _database: database,
    })
}

#[fixture]
fn repo_context() -> Option<TestContext> {
    match setup_context() {
        Ok(context) => {
            context.insert_code(&admin_media());
            context.insert_candidates(&["c1", "c2", "c3"]);
            Some(context)
        }
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

#[rstest]
fn repeated_candidates_are_reported_as_duplicates(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: repeated_candidates_are_reported_as_duplicates skipped");
        return;
    };

    let (first, second) = context.runtime.block_on(async {
        let first = context
            .ballots
            .commit_ballots(&batch(&["c1", "c2"], Round::First), at())
            .await
            .expect("first commit");
        let second = context
            .ballots
            .commit_ballots(&batch(&["c1", "c3"], Round::First), at())
            .await
            .expect("second commit");
        (first, second)
    });

    assert_eq!(first.votes_submitted(), 2);
    assert_eq!(second.votes_submitted(), 1);
    assert_eq!(second.duplicates, vec![CandidateId::new("c1").expect("c1")]);
    assert_eq!(context.ballot_count(), 3);
    assert_eq!(context.tally("c1"), (1, 0));
    assert_eq!(context.tally("c2"), (1, 0));
    assert_eq!(context.tally("c3"), (1, 0));
}

#[rstest]
fn unknown_candidate_rolls_back_the_whole_batch(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: unknown_candidate_rolls_back_the_whole_batch skipped");
        return;
    };

    let err = context
        .runtime
        .block_on(
            context
                .ballots
                .commit_ballots(&batch(&["c1", "c9", "c2"], Round::First), at()),
        )
        .expect_err("missing candidate aborts");

    assert!(matches!(err, BallotRepositoryError::Write { .. }), "{err}");
    assert_eq!(context.ballot_count(), 0);
    assert_eq!(context.tally("c1"), (0, 0));
    assert_eq!(context.tally("c2"), (0, 0));
}

#[rstest]
fn finals_ballots_feed_the_finals_counter(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: finals_ballots_feed_the_finals_counter skipped");
        return;
    };

    let (finals, first) = context.runtime.block_on(async {
        let finals = context
            .ballots
            .commit_ballots(&batch(&["c1"], Round::Finals), at())
            .await
            .expect("finals commit");
        let first = context
            .ballots
            .commit_ballots(&batch(&["c1"], Round::First), at())
            .await
            .expect("first-round commit");
        (finals, first)
    });

    assert_eq!(finals.votes_submitted(), 1);
    assert_eq!(first.votes_submitted(), 1);
    assert_eq!(context.tally("c1"), (1, 1));
    let round: i16 = context
        .query_one("SELECT round FROM ballots WHERE id = 'voter-1_c1_2'", &[])
        .get(0);
    assert_eq!(round, 2);
}

#[rstest]
fn category_lookup_is_scoped_to_category_and_round(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: category_lookup_is_scoped_to_category_and_round skipped");
        return;
    };
    let voter = VoterId::new("voter-1").expect("voter id");
    let dish = CategoryId::new("best-dish").expect("category");
    let drink = CategoryId::new("best-drink").expect("category");

    let (same, other_round, other_category) = context.runtime.block_on(async {
        context
            .ballots
            .commit_ballots(
                &batch(&["c1"], Round::First).with_category(Some(dish.clone())),
                at(),
            )
            .await
            .expect("commit");
        (
            context
                .ballots
                .has_category_ballot(&voter, &dish, Round::First)
                .await
                .expect("lookup"),
            context
                .ballots
                .has_category_ballot(&voter, &dish, Round::Finals)
                .await
                .expect("lookup"),
            context
                .ballots
                .has_category_ballot(&voter, &drink, Round::First)
                .await
                .expect("lookup"),
        )
    });

    assert!(same);
    assert!(!other_round);
    assert!(!other_category);
}

#[rstest]
fn concurrent_identical_commits_write_one_ballot(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: concurrent_identical_commits_write_one_ballot skipped");
        return;
    };
    let request = batch(&["c2"], Round::First);

    let (left, right) = context.runtime.block_on(async {
        futures::join!(
            context.ballots.commit_ballots(&request, at()),
            context.ballots.commit_ballots(&request, at()),
        )
    });

    let left = left.expect("left commit");
    let right = right.expect("right commit");
    assert_eq!(left.votes_submitted() + right.votes_submitted(), 1);
    assert_eq!(left.duplicates.len() + right.duplicates.len(), 1);
    assert_eq!(context.ballot_count(), 1);
    assert_eq!(context.tally("c2"), (1, 0));
}

#[rstest]
fn quota_claim_stops_at_the_limit(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: quota_claim_stops_at_the_limit skipped");
        return;
    };
    let key = context.insert_voter(1, Some(2));

    let (granted, refused) = context.runtime.block_on(async {
        (
            context
                .voters
                .increment_votes_used(&key, at())
                .await
                .expect("claim"),
            context
                .voters
                .increment_votes_used(&key, at() + Duration::seconds(1))
                .await
                .expect("claim"),
        )
    });

    assert_eq!(granted, QuotaClaim::Granted { votes_used: 2 });
    assert_eq!(
        refused,
        QuotaClaim::Exhausted {
            votes_used: 2,
            max_votes: 2
        }
    );
    assert_eq!(context.votes_used(&key), 2);
}

#[rstest]
fn concurrent_claims_spend_the_last_vote_once(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: concurrent_claims_spend_the_last_vote_once skipped");
        return;
    };
    let key = context.insert_voter(0, None);

    let (left, right) = context.runtime.block_on(async {
        futures::join!(
            context.voters.increment_votes_used(&key, at()),
            context.voters.increment_votes_used(&key, at()),
        )
    });

    let claims = [left.expect("left claim"), right.expect("right claim")];
    let granted = claims
        .iter()
        .filter(|claim| matches!(claim, QuotaClaim::Granted { .. }))
        .count();
    assert_eq!(granted, 1, "{claims:?}");
    assert_eq!(context.votes_used(&key), 1);
}

#[rstest]
fn stats_update_keeps_admin_fields(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: stats_update_keeps_admin_fields skipped");
        return;
    };

    let code = context.runtime.block_on(async {
        context
            .codes
            .record_vote_stats(&code_id(), 2, at())
            .await
            .expect("stats update");
        context
            .codes
            .find_by_id(&code_id())
            .await
            .expect("lookup")
            .expect("code exists")
    });

    assert!(code.verification_enabled());
    let media = context.media();
    assert_eq!(
        media.get(0),
        Some(&json!({ "id": "m0", "type": "image", "url": "https://cdn/x.png" }))
    );
    let qvote = media.get(1).expect("qvote block");
    assert_eq!(qvote["order"], 2);
    assert_eq!(qvote["qvoteConfig"]["verification"]["codeLength"], 6);
    assert_eq!(qvote["qvoteConfig"]["categories"][0]["id"], "best-dish");
    assert_eq!(qvote["qvoteConfig"]["stats"]["totalCandidates"], 3);
    assert_eq!(qvote["qvoteConfig"]["stats"]["totalVotes"], 6);
}
