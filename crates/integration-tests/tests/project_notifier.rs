//! Project date notifications posted to a real HTTP webhook endpoint.

use axum::http::StatusCode;
use chrono::NaiveDate;
use secrecy::SecretString;

use people_core::ProjectDates;
use people_integration_tests::WebhookListener;
use people_server::services::{notify_if_dates_changed, notify_project_update};
use people_server::slack::{ChatSink, SlackError, SlackWebhookClient};

fn date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn client(url: &str) -> SlackWebhookClient {
    SlackWebhookClient::new(SecretString::from(url.to_owned()), "PeopleApp".to_owned())
}

fn launch_plan() -> ProjectDates {
    ProjectDates {
        kickoff: None,
        starts_at: date("2026-01-10"),
        end_at: date("2026-12-16"),
    }
}

#[tokio::test]
async fn test_changed_dates_post_exactly_one_message() {
    let hook = WebhookListener::start(StatusCode::OK).await;
    let before = launch_plan();
    let after = ProjectDates {
        kickoff: date("2026-01-05"),
        end_at: None,
        ..before
    };

    assert!(notify_if_dates_changed(&client(&hook.url), "Apollo", &before, &after).await);

    let received = hook.received();
    let [body] = received.as_slice() else {
        panic!("expected one webhook call, got {received:?}");
    };
    assert_eq!(body["username"], "PeopleApp");
    assert_eq!(
        body["text"],
        "Dates in project *Apollo* has been updated.\n\
         *Kickoff* changed to _2026-01-05_.\n\
         *End at* cleared."
    );
}

#[tokio::test]
async fn test_unchanged_dates_post_nothing() {
    let hook = WebhookListener::start(StatusCode::OK).await;
    let dates = launch_plan();

    assert!(!notify_if_dates_changed(&client(&hook.url), "Apollo", &dates, &dates).await);
    assert!(hook.received().is_empty());
}

#[tokio::test]
async fn test_rejected_webhook_is_swallowed() {
    let hook = WebhookListener::start(StatusCode::INTERNAL_SERVER_ERROR).await;
    let before = launch_plan();
    let after = ProjectDates {
        starts_at: date("2026-02-01"),
        ..before
    };

    assert!(!notify_if_dates_changed(&client(&hook.url), "Apollo", &before, &after).await);
    assert_eq!(hook.received().len(), 1);
}

#[tokio::test]
async fn test_client_reports_non_success_status() {
    let hook = WebhookListener::start(StatusCode::NOT_FOUND).await;

    let error = client(&hook.url).ping("hello").await.unwrap_err();
    assert!(matches!(error, SlackError::Response { status: 404, .. }));
}

#[tokio::test]
async fn test_unreachable_webhook_is_a_request_error() {
    let error = client("http://127.0.0.1:1/hook").ping("hello").await.unwrap_err();
    assert!(matches!(error, SlackError::Request(_)));
}

#[tokio::test]
async fn test_missing_slack_config_skips_notification() {
    let before = launch_plan();
    let after = ProjectDates {
        kickoff: date("2026-01-01"),
        ..before
    };

    assert!(!notify_project_update::<SlackWebhookClient>(None, "Apollo", &before, &after).await);
}
