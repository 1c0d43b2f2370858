use chrono::{Duration, TimeZone, Utc};
use common::{ScoringRecord, Task, VoteValue, Winner};
use server::export::{ExportOptions, PLACEHOLDER_JUDGE, scoring_records};
use server::ledger::votes_for_scoring;

use crate::common::TestApp;

const PROLIFIC_SESSION: &str = "prolific-id-p-s";

fn task() -> Task {
    "a-en".parse().unwrap()
}

/// Votes of three sessions on `a-en` plus one on `a-es`, and a prompt whose
/// `s1` and `s2` outputs are identical.
async fn seed_export(app: &TestApp) {
    app.seed_grid("a-en", &["en_001", "en_002"], &["s1", "s2", "s3"])
        .await;
    app.insert_prompt("en_003", "a-en").await;
    app.insert_output("en_003", "s1", "Same joke").await;
    app.insert_output("en_003", "s2", "Same joke").await;
    app.insert_output("en_003", "s3", "Other joke").await;
    app.insert_prompt("es_001", "a-es").await;
    app.insert_output("es_001", "s1", "Chiste").await;
    app.insert_output("es_001", "s2", "Otro chiste").await;

    let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    let hours = |h| t0 + Duration::hours(h);
    app.insert_vote_at("es_001", "s1", "s2", "alice", VoteValue::A, hours(0))
        .await;
    app.insert_vote_at("en_001", "s1", "s2", "alice", VoteValue::A, hours(1))
        .await;
    app.insert_vote_at("en_001", "s1", "s3", PROLIFIC_SESSION, VoteValue::B, hours(2))
        .await;
    app.insert_vote_at("en_002", "s2", "s3", "internal", VoteValue::Tie, hours(3))
        .await;
    app.insert_vote_at("en_002", "s1", "s3", "alice", VoteValue::Skip, hours(4))
        .await;
}

fn options(excluded: &[&str], only_prolific: bool, min_votes: u64) -> ExportOptions {
    ExportOptions {
        excluded_session_ids: excluded.iter().map(|s| s.to_string()).collect(),
        only_prolific,
        min_votes,
    }
}

fn battles(records: &[ScoringRecord]) -> Vec<(&str, &str, &str, &str, Winner)> {
    records
        .iter()
        .map(|r| {
            (
                r.judge.as_str(),
                r.question_id.as_str(),
                r.model_a.as_str(),
                r.model_b.as_str(),
                r.winner,
            )
        })
        .collect()
}

#[tokio::test]
async fn counted_votes_of_the_task_oldest_first() {
    let app = TestApp::spawn().await;
    seed_export(&app).await;

    let votes = votes_for_scoring(&app.db, &task(), &[]).await.unwrap();
    let sessions: Vec<&str> = votes.iter().map(|v| v.session_id.as_str()).collect();
    assert_eq!(sessions, ["alice", PROLIFIC_SESSION, "internal"]);
    assert!(votes.iter().all(|v| v.vote != VoteValue::Skip));

    let excluded = ["internal".to_string(), "alice".to_string()];
    let votes = votes_for_scoring(&app.db, &task(), &excluded).await.unwrap();
    assert_eq!(votes.len(), 1);
    assert_eq!(votes[0].session_id, PROLIFIC_SESSION);
}

#[tokio::test]
async fn records_drop_skips_and_append_same_text_ties() {
    let app = TestApp::spawn().await;
    seed_export(&app).await;

    let records = scoring_records(&app.db, &task(), &options(&[], false, 0))
        .await
        .unwrap();

    assert_eq!(
        battles(&records),
        [
            ("alice", "en_001", "s1", "s2", Winner::ModelA),
            (PROLIFIC_SESSION, "en_001", "s1", "s3", Winner::ModelB),
            ("internal", "en_002", "s2", "s3", Winner::Tie),
            (PLACEHOLDER_JUDGE, "en_003", "s1", "s2", Winner::Tie),
        ]
    );
    let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 13, 0, 0).unwrap();
    assert_eq!(records[0].tstamp, t0.timestamp());
}

#[tokio::test]
async fn excluded_sessions_are_left_out() {
    let app = TestApp::spawn().await;
    seed_export(&app).await;

    let records = scoring_records(&app.db, &task(), &options(&["internal"], false, 0))
        .await
        .unwrap();

    assert_eq!(
        battles(&records),
        [
            ("alice", "en_001", "s1", "s2", Winner::ModelA),
            (PROLIFIC_SESSION, "en_001", "s1", "s3", Winner::ModelB),
            (PLACEHOLDER_JUDGE, "en_003", "s1", "s2", Winner::Tie),
        ]
    );
}

#[tokio::test]
async fn only_prolific_keeps_recruited_sessions_and_ties() {
    let app = TestApp::spawn().await;
    seed_export(&app).await;

    let records = scoring_records(&app.db, &task(), &options(&[], true, 0))
        .await
        .unwrap();

    assert_eq!(
        battles(&records),
        [
            (PROLIFIC_SESSION, "en_001", "s1", "s3", Winner::ModelB),
            (PLACEHOLDER_JUDGE, "en_003", "s1", "s2", Winner::Tie),
        ]
    );
}

#[tokio::test]
async fn systems_below_min_votes_lose_their_battles() {
    let app = TestApp::spawn().await;
    seed_export(&app).await;

    // s1 and s2 have three counted votes with the synthesized tie, s3 two.
    let records = scoring_records(&app.db, &task(), &options(&[], false, 3))
        .await
        .unwrap();

    assert_eq!(
        battles(&records),
        [
            ("alice", "en_001", "s1", "s2", Winner::ModelA),
            (PLACEHOLDER_JUDGE, "en_003", "s1", "s2", Winner::Tie),
        ]
    );
}
