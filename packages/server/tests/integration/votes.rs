use common::{Task, VoteValue};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use server::config::VerificationConfig;
use server::entity::vote;
use server::ledger;

use crate::common::{TestApp, TestOptions, output_ids, routes};

async fn vote_rows(app: &TestApp) -> Vec<vote::Model> {
    vote::Entity::find().all(&app.db).await.unwrap()
}

fn form<'a>(prompt_id: &'a str, a: &'a str, b: &'a str, vote: &'a str) -> Vec<(&'a str, &'a str)> {
    vec![
        ("prompt_id", prompt_id),
        ("system_id_a", a),
        ("system_id_b", b),
        ("vote", vote),
        ("is_offensive_a", "false"),
        ("is_offensive_b", "false"),
    ]
}

mod recording {
    use super::*;

    #[tokio::test]
    async fn reversed_presentation_is_stored_in_canonical_order() {
        let app = TestApp::spawn().await;
        app.seed_grid("a-en", &["en_001"], &["alpha", "beta"]).await;

        let mut body = form("en_001", "beta", "alpha", "a");
        body[4] = ("is_offensive_a", "TRUE");
        let res = app.post_form(routes::VOTE, &body).await;
        assert_eq!(res.status, 200, "{}", res.text);

        let rows = vote_rows(&app).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].system_id_a, "alpha");
        assert_eq!(rows[0].system_id_b, "beta");
        assert_eq!(rows[0].vote, VoteValue::B);
        assert!(!rows[0].is_offensive_a);
        assert!(rows[0].is_offensive_b);
    }

    #[tokio::test]
    async fn mixed_case_systems_are_stored_in_byte_order() {
        let app = TestApp::spawn().await;
        app.seed_grid("a-en", &["en_001", "en_002"], &["Zeta", "alpha"])
            .await;

        // Both presentation orders of the same pair of systems.
        let res = app
            .post_form(routes::VOTE, &form("en_001", "alpha", "Zeta", "a"))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        let res = app
            .post_form(routes::VOTE, &form("en_002", "Zeta", "alpha", "a"))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let mut rows = vote_rows(&app).await;
        rows.sort_by(|a, b| a.prompt_id.cmp(&b.prompt_id));
        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(row.system_id_a, "Zeta");
            assert_eq!(row.system_id_b, "alpha");
        }
        assert_eq!(rows[0].vote, VoteValue::B);
        assert_eq!(rows[1].vote, VoteValue::A);

        let res = app
            .post_form(routes::VOTE, &form("en_001", "Zeta", "alpha", "t"))
            .await;
        assert_eq!(res.status, 409);
    }

    #[tokio::test]
    async fn replacement_comes_from_the_prompt_task_and_skips_ignored_outputs() {
        let app = TestApp::spawn().await;
        app.seed_grid(
            "a-es",
            &["es_001", "es_002", "es_003"],
            &["s1", "s2", "s3", "s4"],
        )
        .await;
        app.insert_prompt("en_001", "a-en").await;
        app.insert_output("en_001", "s3", "s3 on en_001").await;
        app.insert_output("en_001", "s4", "s4 on en_001").await;

        let ignored = [
            "es_002-s1", "es_002-s2", "es_002-s3", "es_002-s4", "es_003-s1", "es_003-s2",
        ];
        let mut body = form("es_001", "s1", "s2", "t");
        for id in ignored {
            body.push(("ignored_output_ids[]", id));
        }

        let res = app.post_form(routes::VOTE, &body).await;
        assert_eq!(res.status, 200, "{}", res.text);

        let battle = &res.body;
        let ids = output_ids(battle);
        for id in &ids {
            assert!(!ignored.contains(&id.as_str()), "ignored output {id} served");
            assert!(id != "es_001-s1" && id != "es_001-s2", "voted output {id} served");
        }
        // Only es_001 s3/s4 and es_003 s3/s4 remain.
        assert!(battle["prompt_id"] == "es_001" || battle["prompt_id"] == "es_003");
        assert!(
            battle["prompt"]
                .as_str()
                .unwrap()
                .starts_with("<b>Titular:</b>")
        );
    }

    #[tokio::test]
    async fn skip_is_recorded_but_not_counted() {
        let app = TestApp::spawn().await;
        app.seed_grid("a-en", &["en_001", "en_002"], &["s1", "s2"])
            .await;

        let res = app
            .post_form(routes::VOTE, &form("en_001", "s1", "s2", "n"))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        assert_eq!(vote_rows(&app).await.len(), 1);
        let res = app.get(routes::SESSION_VOTE_COUNT).await;
        assert_eq!(res.body, 0);

        let counts = ledger::system_vote_counts(&app.db, &"a-en".parse::<Task>().unwrap())
            .await
            .unwrap();
        assert!(counts.is_empty());
    }

    #[tokio::test]
    async fn coverage_grows_by_exactly_the_votes_touching_a_system() {
        let app = TestApp::spawn().await;
        let prompts = ["en_001", "en_002", "en_003", "en_004"];
        app.seed_grid("a-en", &prompts, &["s1", "s2", "s3"]).await;
        let task = "a-en".parse::<Task>().unwrap();

        let before = ledger::system_vote_counts(&app.db, &task).await.unwrap();
        assert_eq!(before.get("s1"), None);

        // Three votes touch s1 (on either side), one does not.
        for (prompt, a, b) in [
            ("en_001", "s1", "s2"),
            ("en_002", "s3", "s1"),
            ("en_003", "s1", "s3"),
            ("en_004", "s2", "s3"),
        ] {
            let res = app.post_form(routes::VOTE, &form(prompt, a, b, "a")).await;
            assert_eq!(res.status, 200, "{}", res.text);
        }

        let after = ledger::system_vote_counts(&app.db, &task).await.unwrap();
        assert_eq!(after.get("s1"), Some(&3));
        assert_eq!(after.get("s2"), Some(&2));
        assert_eq!(after.get("s3"), Some(&3));
    }
}

mod rejection {
    use super::*;

    #[tokio::test]
    async fn second_identical_vote_is_a_conflict() {
        let app = TestApp::spawn().await;
        app.seed_grid("a-en", &["en_001"], &["s1", "s2"]).await;
        let body = form("en_001", "s1", "s2", "a");

        let first = app.post_form(routes::VOTE, &body).await;
        assert_eq!(first.status, 200, "{}", first.text);

        let res = app.post_form(routes::VOTE, &body).await;
        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "DUPLICATE_VOTE");

        let count = vote::Entity::find()
            .filter(vote::Column::PromptId.eq("en_001"))
            .count(&app.db)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn mirrored_vote_is_a_conflict() {
        let app = TestApp::spawn().await;
        app.seed_grid("a-en", &["en_001"], &["s1", "s2"]).await;

        let first = app
            .post_form(routes::VOTE, &form("en_001", "s1", "s2", "a"))
            .await;
        assert_eq!(first.status, 200);

        let res = app
            .post_form(routes::VOTE, &form("en_001", "s2", "s1", "b"))
            .await;
        assert_eq!(res.status, 409);
        assert_eq!(vote_rows(&app).await.len(), 1);
    }

    #[tokio::test]
    async fn same_battle_from_another_session_is_accepted() {
        let app = TestApp::spawn().await;
        app.seed_grid("a-en", &["en_001"], &["s1", "s2"]).await;
        let body = form("en_001", "s1", "s2", "a");

        let first = app.post_form(routes::VOTE, &body).await;
        assert_eq!(first.status, 200);

        let other = TestApp::new_client();
        let res = app.post_form_as(&other, routes::VOTE, &body).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(vote_rows(&app).await.len(), 2);
    }

    #[tokio::test]
    async fn invalid_vote_value_is_rejected() {
        let app = TestApp::spawn().await;
        app.seed_grid("a-en", &["en_001"], &["s1", "s2"]).await;

        let res = app
            .post_form(routes::VOTE, &form("en_001", "s1", "s2", "x"))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(vote_rows(&app).await.is_empty());
    }

    #[tokio::test]
    async fn missing_field_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_form(routes::VOTE, &[("prompt_id", "en_001"), ("vote", "a")])
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn malformed_ignored_output_id_is_rejected() {
        let app = TestApp::spawn().await;
        app.seed_grid("a-en", &["en_001"], &["s1", "s2"]).await;

        let mut body = form("en_001", "s1", "s2", "a");
        body.push(("ignored_output_ids[]", "nodash"));
        let res = app.post_form(routes::VOTE, &body).await;

        assert_eq!(res.status, 400);
        assert!(vote_rows(&app).await.is_empty());
    }

    #[tokio::test]
    async fn self_comparison_is_rejected() {
        let app = TestApp::spawn().await;
        app.seed_grid("a-en", &["en_001"], &["s1", "s2"]).await;

        let res = app
            .post_form(routes::VOTE, &form("en_001", "s1", "s1", "a"))
            .await;

        assert_eq!(res.status, 400);
        assert!(vote_rows(&app).await.is_empty());
    }

    #[tokio::test]
    async fn unknown_prompt_is_a_referential_error() {
        let app = TestApp::spawn().await;
        app.seed_grid("a-en", &["en_001"], &["s1", "s2"]).await;

        let res = app
            .post_form(routes::VOTE, &form("en_999", "s1", "s2", "a"))
            .await;

        assert_eq!(res.status, 422);
        assert_eq!(res.body["code"], "UNKNOWN_REFERENCE");
    }

    #[tokio::test]
    async fn output_of_another_prompt_is_a_referential_error() {
        let app = TestApp::spawn().await;
        app.seed_grid("a-en", &["en_001"], &["s1", "s2"]).await;
        app.insert_system("s3").await;
        app.insert_prompt("en_002", "a-en").await;
        app.insert_output("en_002", "s3", "elsewhere").await;

        let res = app
            .post_form(routes::VOTE, &form("en_001", "s1", "s3", "a"))
            .await;

        assert_eq!(res.status, 422);
        assert_eq!(res.body["code"], "UNKNOWN_REFERENCE");
        assert!(vote_rows(&app).await.is_empty());
    }
}

mod verification {
    use super::*;

    fn enabled() -> TestOptions {
        TestOptions {
            verification: Some(VerificationConfig {
                enabled: true,
                secret_key: "test-secret".into(),
                endpoint: "http://127.0.0.1:1/siteverify".into(),
                timeout_secs: 1,
            }),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn missing_token_is_rejected() {
        let app = TestApp::spawn_with(enabled()).await;
        app.seed_grid("a-en", &["en_001"], &["s1", "s2"]).await;

        let res = app
            .post_form(routes::VOTE, &form("en_001", "s1", "s2", "a"))
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "VERIFICATION_FAILED");
        assert!(vote_rows(&app).await.is_empty());
    }

    #[tokio::test]
    async fn unreachable_provider_lets_the_vote_through() {
        let app = TestApp::spawn_with(enabled()).await;
        app.seed_grid("a-en", &["en_001"], &["s1", "s2"]).await;

        let mut body = form("en_001", "s1", "s2", "a");
        body.push(("turnstile_token", "token"));
        let res = app.post_form(routes::VOTE, &body).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(vote_rows(&app).await.len(), 1);
    }
}
