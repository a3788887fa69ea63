// [tests/notify/verbosity.test.rs]
use serde_json::json;
use snapforge_notify::{EventSeverity, VerbosityLevel, WebhookNotifier};
use uuid::Uuid;

#[tokio::test]
async fn errors_only_level_still_delivers_critical_job_lifecycle_events() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/callback")
        .with_status(200)
        .create_async()
        .await;

    let notifier = WebhookNotifier::new(
        format!("{}/callback", server.url()),
        VerbosityLevel::ErrorsOnly,
        Uuid::new_v4(),
        "listing-42",
        Uuid::new_v4(),
        "gateway",
    );
    notifier
        .notify("job_started", EventSeverity::Info, json!({}))
        .await;

    mock.assert_async().await;
}

#[tokio::test]
async fn errors_only_level_suppresses_non_critical_info_events() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/callback")
        .with_status(200)
        .expect(0)
        .create_async()
        .await;

    let notifier = WebhookNotifier::new(
        format!("{}/callback", server.url()),
        VerbosityLevel::ErrorsOnly,
        Uuid::new_v4(),
        "listing-42",
        Uuid::new_v4(),
        "process",
    );
    notifier
        .notify("bracket_processed", EventSeverity::Info, json!({}))
        .await;

    mock.assert_async().await;
}

#[tokio::test]
async fn verbose_only_events_require_verbose_level() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/callback")
        .with_status(200)
        .create_async()
        .await;

    let notifier = WebhookNotifier::new(
        format!("{}/callback", server.url()),
        VerbosityLevel::Verbose,
        Uuid::new_v4(),
        "listing-42",
        Uuid::new_v4(),
        "finalize",
    );
    notifier
        .notify("status_poll", EventSeverity::Info, json!({"ticket": "abc"}))
        .await;

    mock.assert_async().await;
}
