use server::participants::find_participant;

use crate::common::{TestApp, TestOptions, routes};

const STUDY_LINK: &str = "/vote-count?PROLIFIC_PID=p1&STUDY_ID=st&SESSION_ID=s1";
const SESSION: &str = "prolific-id-p1-s1";

#[tokio::test]
async fn consent_is_recorded_once() {
    let app = TestApp::spawn().await;
    app.get(STUDY_LINK).await;

    let res = app.post_form(routes::PROLIFIC_CONSENT, &[]).await;
    assert_eq!(res.status, 204, "{}", res.text);

    let first = find_participant(&app.db, SESSION)
        .await
        .unwrap()
        .expect("participant row");
    let consented_at = first.consent_date.expect("consent date");
    assert!(first.finish_date.is_none());

    let res = app.post_form(routes::PROLIFIC_CONSENT, &[]).await;
    assert_eq!(res.status, 204);

    let second = find_participant(&app.db, SESSION).await.unwrap().unwrap();
    assert_eq!(second.consent_date, Some(consented_at));
}

#[tokio::test]
async fn finish_redirects_to_the_completion_page() {
    let app = TestApp::spawn_with(TestOptions {
        completion_url: Some("https://app.prolific.com/submissions/complete?cc=ABC".into()),
        ..Default::default()
    })
    .await;
    app.get(STUDY_LINK).await;
    app.post_form(routes::PROLIFIC_CONSENT, &[]).await;

    let res = app
        .post_form(routes::PROLIFIC_FINISH, &[("comments", "Fun study")])
        .await;

    assert_eq!(res.status, 303);
    assert_eq!(
        res.headers["location"],
        "https://app.prolific.com/submissions/complete?cc=ABC"
    );

    let participant = find_participant(&app.db, SESSION).await.unwrap().unwrap();
    assert!(participant.consent_date.is_some());
    assert!(participant.finish_date.is_some());
    assert_eq!(participant.comments.as_deref(), Some("Fun study"));
}

#[tokio::test]
async fn finish_without_completion_page_is_no_content() {
    let app = TestApp::spawn().await;
    app.get(STUDY_LINK).await;

    let res = app.post_form(routes::PROLIFIC_FINISH, &[]).await;

    assert_eq!(res.status, 204);
    let participant = find_participant(&app.db, SESSION).await.unwrap().unwrap();
    assert!(participant.consent_date.is_none());
    assert_eq!(participant.comments.as_deref(), Some(""));
}
