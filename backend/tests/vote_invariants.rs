//! Invariants of the vote transaction processor under repeated and
//! concurrent submissions.

mod support;

use rstest::rstest;
use serde_json::json;

use support::{Harness, PHONE, SESSION_TOKEN, submit};

const CODE: &str = "code_777";

#[rstest]
#[case::first_ballot(1)]
#[case::second_ballot(3)]
#[case::second_tally(4)]
#[case::last_tally(6)]
#[actix_web::test]
async fn failed_write_leaves_no_trace(#[case] failing_write: usize) {
    let harness = Harness::new().with_code(CODE, false, &["c1", "c2", "c3"]);
    harness.store.fail_commit_at_write(failing_write);
    let app = harness.app().await;

    let (status, body) = submit(
        &app,
        json!({"codeId": CODE, "voterId": "v1", "candidateIds": ["c1", "c2", "c3"]}),
    )
    .await;

    assert_eq!(status, 500);
    assert_eq!(body["errorCode"], "SUBMIT_FAILED");
    assert_eq!(harness.store.ballot_count(), 0);
    for id in ["c1", "c2", "c3"] {
        assert_eq!(harness.votes_for(CODE, id), 0, "{id} must be untouched");
    }
    assert_eq!(harness.total_votes_stat(CODE), 0);
}

#[actix_web::test]
async fn retry_after_failed_write_commits_everything() {
    let harness = Harness::new().with_code(CODE, false, &["c1", "c2", "c3"]);
    harness.store.fail_commit_at_write(3);
    let app = harness.app().await;
    let body = json!({"codeId": CODE, "voterId": "v1", "candidateIds": ["c1", "c2", "c3"]});
    submit(&app, body.clone()).await;

    let (status, response) = submit(&app, body).await;

    assert_eq!(status, 200);
    assert_eq!(response["votesSubmitted"], 3);
    assert_eq!(harness.store.ballot_count(), 3);
}

#[actix_web::test]
async fn exhausted_quota_writes_nothing() {
    let harness = Harness::new()
        .with_code(CODE, true, &["c1"])
        .with_verified_voter(CODE, 3, 3);
    let app = harness.app().await;

    let (status, body) = submit(
        &app,
        json!({"codeId": CODE, "voterId": "v1", "candidateIds": ["c1"],
               "phone": PHONE, "sessionToken": SESSION_TOKEN}),
    )
    .await;

    assert_eq!(status, 403);
    assert_eq!(body["errorCode"], "VOTE_LIMIT_REACHED");
    assert_eq!(body["details"], json!({"votesUsed": 3, "maxVotes": 3}));
    assert_eq!(harness.store.ballot_count(), 0);
    assert_eq!(harness.votes_used(CODE), 3);
    assert_eq!(harness.votes_for(CODE, "c1"), 0);
}

#[actix_web::test]
async fn quota_is_consumed_once_per_call() {
    let harness = Harness::new()
        .with_code(CODE, true, &["c1", "c2", "c3"])
        .with_verified_voter(CODE, 0, 2);
    let app = harness.app().await;
    let credentials = |candidates: serde_json::Value| {
        json!({"codeId": CODE, "voterId": "v1", "candidateIds": candidates,
               "phone": PHONE, "sessionToken": SESSION_TOKEN})
    };

    let (first, _) = submit(&app, credentials(json!(["c1", "c2"]))).await;
    let (second, _) = submit(&app, credentials(json!(["c3"]))).await;
    let (third, body) = submit(&app, credentials(json!(["c1"]))).await;

    assert_eq!((first, second, third), (200, 200, 403));
    assert_eq!(body["details"], json!({"votesUsed": 2, "maxVotes": 2}));
    assert_eq!(harness.votes_used(CODE), 2);
    assert_eq!(harness.store.ballot_count(), 3);
}

#[actix_web::test]
async fn category_path_ignores_the_global_quota() {
    let harness = Harness::new()
        .with_code(CODE, true, &["c1", "c2"])
        .with_verified_voter(CODE, 5, 5);
    let app = harness.app().await;
    let in_category = |category: &str, round: u8| {
        json!({"codeId": CODE, "voterId": "v1", "candidateIds": ["c1"], "round": round,
               "categoryId": category, "phone": PHONE, "sessionToken": SESSION_TOKEN})
    };

    let (cat1, _) = submit(&app, in_category("cat1", 1)).await;
    let (cat1_again, blocked) = submit(&app, in_category("cat1", 1)).await;
    let (cat1_finals, _) = submit(&app, in_category("cat1", 2)).await;
    let (global, limited) = submit(
        &app,
        json!({"codeId": CODE, "voterId": "v1", "candidateIds": ["c2"],
               "phone": PHONE, "sessionToken": SESSION_TOKEN}),
    )
    .await;

    assert_eq!(cat1, 200);
    assert_eq!(cat1_again, 403);
    assert_eq!(blocked["errorCode"], "ALREADY_VOTED_CATEGORY");
    assert_eq!(cat1_finals, 200);
    assert_eq!(global, 403);
    assert_eq!(limited["errorCode"], "VOTE_LIMIT_REACHED");
    assert_eq!(harness.votes_used(CODE), 5);
}

#[actix_web::test]
async fn counters_match_accepted_ballots() {
    let harness = Harness::new().with_code(CODE, false, &["c1", "c2"]);
    let app = harness.app().await;

    for voter in ["v1", "v2", "v3"] {
        submit(
            &app,
            json!({"codeId": CODE, "voterId": voter, "candidateIds": ["c1", "c1", "c2"]}),
        )
        .await;
        submit(
            &app,
            json!({"codeId": CODE, "voterId": voter, "candidateIds": ["c1"]}),
        )
        .await;
    }
    for voter in ["v1", "v2"] {
        submit(
            &app,
            json!({"codeId": CODE, "voterId": voter, "candidateIds": ["c2"], "round": 2}),
        )
        .await;
    }

    assert_eq!(harness.votes_for(CODE, "c1"), 3);
    assert_eq!(harness.votes_for(CODE, "c2"), 3);
    assert_eq!(harness.finals_votes_for(CODE, "c1"), 0);
    assert_eq!(harness.finals_votes_for(CODE, "c2"), 2);
    assert_eq!(harness.store.ballot_count(), 8);
    assert_eq!(harness.total_votes_stat(CODE), 8);
}

#[actix_web::test]
async fn concurrent_identical_submissions_create_one_ballot() {
    let harness = Harness::new().with_code(CODE, false, &["c1"]);
    let app = harness.app().await;
    let body = json!({"codeId": CODE, "voterId": "v1", "candidateIds": ["c1"]});

    let ((first_status, first), (second_status, second)) =
        futures::join!(submit(&app, body.clone()), submit(&app, body.clone()));

    assert_eq!((first_status, second_status), (200, 200));
    let submitted = first["votesSubmitted"].as_u64().unwrap_or_default()
        + second["votesSubmitted"].as_u64().unwrap_or_default();
    assert_eq!(submitted, 1);
    assert_eq!(harness.store.ballot_count(), 1);
    assert_eq!(harness.votes_for(CODE, "c1"), 1);
}
