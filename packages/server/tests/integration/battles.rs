use std::collections::HashSet;

use chrono::Utc;
use common::VoteValue;
use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel};
use server::entity::vote;

use crate::common::{TestApp, TestOptions, output_ids, routes};

/// Texts seeded by `seed_grid` follow `{system} on {prompt}`.
fn assert_texts_match_systems(battle: &serde_json::Value) {
    let prompt_id = battle["prompt_id"].as_str().unwrap();
    for side in ["a", "b"] {
        let system_id = battle[format!("system_id_{side}")].as_str().unwrap();
        assert_eq!(
            battle[format!("output_{side}")],
            format!("{system_id} on {prompt_id}"),
            "output and system of side {side} do not belong together"
        );
    }
}

mod round_trip {
    use super::*;

    #[tokio::test]
    async fn single_pair_is_served_voted_and_then_exhausted() {
        let app = TestApp::spawn().await;
        app.insert_system("S1").await;
        app.insert_system("S2").await;
        app.insert_prompt("P", "a-en").await;
        app.insert_output("P", "S1", "foo").await;
        app.insert_output("P", "S2", "bar").await;

        let res = app.get(&routes::battles("a-en")).await;
        assert_eq!(res.status, 200, "{}", res.text);
        let battles = res.array();
        assert_eq!(battles.len(), 1);

        let battle = &battles[0];
        assert_eq!(battle["prompt_id"], "P");
        assert_eq!(battle["prompt"], "<b>News headline:</b> Headline of P");
        assert!(battle["prompt_image_url"].is_null());
        let s1_side = if battle["system_id_a"] == "S1" {
            assert_eq!(battle["output_a"], "foo");
            assert_eq!(battle["system_id_b"], "S2");
            assert_eq!(battle["output_b"], "bar");
            "a"
        } else {
            assert_eq!(battle["system_id_a"], "S2");
            assert_eq!(battle["output_a"], "bar");
            assert_eq!(battle["system_id_b"], "S1");
            assert_eq!(battle["output_b"], "foo");
            "b"
        };

        // Vote for S1, whichever side it was shown on.
        let res = app.vote_on(battle, s1_side).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body.is_null(), "no replacement expected: {}", res.text);

        let rows = vote::Entity::find().all(&app.db).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].prompt_id, "P");
        assert_eq!(rows[0].system_id_a, "S1");
        assert_eq!(rows[0].system_id_b, "S2");
        assert_eq!(rows[0].vote, VoteValue::A);

        let res = app.get(&routes::battles("a-en")).await;
        assert_eq!(res.status, 200);
        assert!(res.array().is_empty());
    }
}

mod empty_state {
    use super::*;

    #[tokio::test]
    async fn task_without_outputs_yields_empty_array() {
        let app = TestApp::spawn().await;
        app.insert_prompt("en_001", "a-en").await;

        let res = app.get(&routes::battles("a-en")).await;

        assert_eq!(res.status, 200);
        assert!(res.array().is_empty());
    }

    #[tokio::test]
    async fn unknown_task_yields_empty_array() {
        let app = TestApp::spawn().await;
        app.seed_grid("a-en", &["en_001"], &["s1", "s2"]).await;

        let res = app.get(&routes::battles("b2")).await;

        assert_eq!(res.status, 200);
        assert!(res.array().is_empty());
    }

    #[tokio::test]
    async fn malformed_task_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::battles("A%20B")).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn identical_outputs_are_never_paired() {
        let app = TestApp::spawn().await;
        app.insert_system("s1").await;
        app.insert_system("s2").await;
        app.insert_prompt("en_001", "a-en").await;
        app.insert_output("en_001", "s1", "same joke").await;
        app.insert_output("en_001", "s2", "same joke").await;

        let res = app.get(&routes::battles("a-en")).await;

        assert_eq!(res.status, 200);
        assert!(res.array().is_empty());
    }
}

mod batches {
    use super::*;

    #[tokio::test]
    async fn default_task_is_used_without_query() {
        let app = TestApp::spawn().await;
        app.seed_grid("a-en", &["en_001"], &["s1", "s2"]).await;

        let res = app.get("/battles").await;

        assert_eq!(res.status, 200);
        assert_eq!(res.array().len(), 1);
    }

    #[tokio::test]
    async fn batch_is_capped_and_uses_each_output_once() {
        let app = TestApp::spawn().await;
        let prompts: Vec<String> = (0..12).map(|i| format!("en_{i:03}")).collect();
        let prompts: Vec<&str> = prompts.iter().map(String::as_str).collect();
        app.seed_grid("a-en", &prompts, &["s1", "s2", "s3", "s4"]).await;

        let res = app.get(&routes::battles("a-en")).await;
        assert_eq!(res.status, 200);
        let battles = res.array();
        assert_eq!(battles.len(), 10);

        let mut seen = HashSet::new();
        for battle in battles {
            assert_ne!(battle["system_id_a"], battle["system_id_b"]);
            assert_texts_match_systems(battle);
            for id in output_ids(battle) {
                assert!(seen.insert(id.clone()), "output {id} served twice");
            }
        }
    }

    #[tokio::test]
    async fn outputs_stay_with_their_systems_without_side_swapping() {
        let app = TestApp::spawn_with(TestOptions {
            randomize_sides: false,
            ..Default::default()
        })
        .await;
        app.seed_grid("a-en", &["en_001"], &["s1", "s2"]).await;

        for _ in 0..5 {
            let client = TestApp::new_client();
            let res = app.get_as(&client, &routes::battles("a-en")).await;
            assert_texts_match_systems(&res.array()[0]);
        }
    }
}

mod exclusion {
    use super::*;

    #[tokio::test]
    async fn voted_outputs_are_never_served_again_to_the_session() {
        let app = TestApp::spawn().await;
        app.seed_grid(
            "a-en",
            &["en_001", "en_002", "en_003"],
            &["s1", "s2", "s3", "s4"],
        )
        .await;

        let mut voted: HashSet<String> = HashSet::new();
        loop {
            let res = app.get(&routes::battles("a-en")).await;
            assert_eq!(res.status, 200);
            let battles = res.array().clone();
            if battles.is_empty() {
                break;
            }
            for battle in &battles {
                for id in output_ids(battle) {
                    assert!(!voted.contains(&id), "output {id} was already voted");
                }
            }

            let battle = &battles[0];
            let res = app.vote_on(battle, "t").await;
            assert_eq!(res.status, 200, "{}", res.text);
            voted.extend(output_ids(battle));
        }

        // Four outputs per prompt pair up twice; every output is used once.
        assert_eq!(voted.len(), 12);
    }

    #[tokio::test]
    async fn another_session_still_sees_everything() {
        let app = TestApp::spawn().await;
        app.seed_grid("a-en", &["en_001"], &["s1", "s2"]).await;

        let first = app.get(&routes::battles("a-en")).await;
        let res = app.vote_on(&first.array()[0], "n").await;
        assert_eq!(res.status, 200);

        let other = TestApp::new_client();
        let res = app.get_as(&other, &routes::battles("a-en")).await;
        assert_eq!(res.array().len(), 1);

        let res = app.get(&routes::battles("a-en")).await;
        assert!(res.array().is_empty());
    }
}

mod least_voted_priority {
    use super::*;

    /// Give `S2` ten prior counted votes by pairing it with a system that only
    /// answers one extra prompt.
    async fn seed_prior_votes(app: &TestApp) {
        app.seed_grid(
            "a-en",
            &["en_001", "en_002", "en_003", "en_004", "en_005", "en_006"],
            &["S1", "S2", "S3"],
        )
        .await;
        app.insert_system("SX").await;
        app.insert_prompt("en_100", "a-en").await;
        app.insert_output("en_100", "S2", "S2 on en_100").await;
        app.insert_output("en_100", "SX", "SX on en_100").await;

        for i in 0..10 {
            vote::Model {
                prompt_id: "en_100".into(),
                system_id_a: "S2".into(),
                system_id_b: "SX".into(),
                session_id: format!("prior-{i}"),
                vote: VoteValue::A,
                date: Utc::now(),
                is_offensive_a: false,
                is_offensive_b: false,
            }
            .into_active_model()
            .insert(&app.db)
            .await
            .expect("Failed to insert prior vote");
        }
    }

    #[tokio::test]
    async fn unvoted_systems_are_served_first() {
        let app = TestApp::spawn().await;
        seed_prior_votes(&app).await;

        for _ in 0..20 {
            let client = TestApp::new_client();
            let res = app.get_as(&client, &routes::battles("a-en")).await;
            let first = &res.array()[0];
            let mut systems = [
                first["system_id_a"].as_str().unwrap(),
                first["system_id_b"].as_str().unwrap(),
            ];
            systems.sort();
            assert_eq!(systems, ["S1", "S3"]);
        }
    }

    #[tokio::test]
    async fn unvoted_systems_appear_more_often_across_batches() {
        let app = TestApp::spawn().await;
        seed_prior_votes(&app).await;

        let (mut with_s2, mut without_s2) = (0, 0);
        for _ in 0..10 {
            let client = TestApp::new_client();
            let res = app.get_as(&client, &routes::battles("a-en")).await;
            for battle in res.array() {
                if battle["system_id_a"] == "S2" || battle["system_id_b"] == "S2" {
                    with_s2 += 1;
                } else {
                    without_s2 += 1;
                }
            }
        }

        assert!(
            without_s2 > with_s2,
            "S1/S3 battles: {without_s2}, S2 battles: {with_s2}"
        );
    }
}
