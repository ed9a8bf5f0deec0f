//! Task polling: cadence, retries, terminal failures and cancellation

use crate::mock_server::{
    task_envelope, two_channel_payload, wav_bytes, MockServerFixture, OAUTH_PATH,
};
use mockito::Matcher;
use salute_speech::{CancellationToken, Error, TranscriptionOptions, TranscriptionResponse};
use serde_json::json;
use std::io::Cursor;
use std::time::Duration;
use tokio_test::assert_ok;

fn fast() -> TranscriptionOptions {
    TranscriptionOptions::new().poll_interval(Duration::from_millis(10))
}

/// Run one transcription of a mono WAV, failing instead of hanging.
async fn transcribe(
    fixture: &MockServerFixture,
    options: &TranscriptionOptions,
) -> salute_speech::Result<TranscriptionResponse> {
    let client = fixture.create_test_client();
    tokio::time::timeout(
        Duration::from_secs(10),
        client
            .transcriptions()
            .create(Cursor::new(wav_bytes(16_000, 1)), options),
    )
    .await
    .expect("transcription did not finish within 10s")
}

/// Token, upload and task creation for `task-1`.
async fn submit_mocks(fixture: &MockServerFixture, token_hits: usize) -> Vec<mockito::Mock> {
    vec![
        fixture.mock_token("tok-1", token_hits).await,
        fixture.mock_upload_ok("file-1").await,
        fixture.mock_recognize("task-1", 1).await,
    ]
}

#[tokio::test]
async fn test_polls_until_done_exactly_four_checks() {
    let fixture = MockServerFixture::new().await;
    let _submit = submit_mocks(&fixture, 1).await;
    let status = fixture
        .mock_status_sequence(
            "task-1",
            vec![
                task_envelope("task-1", "NEW", None).to_string(),
                task_envelope("task-1", "RUNNING", None).to_string(),
                task_envelope("task-1", "RUNNING", None).to_string(),
                task_envelope("task-1", "DONE", Some("result-1")).to_string(),
            ],
            4,
        )
        .await;
    let _download = fixture
        .mock_download("result-1", &two_channel_payload(), 1)
        .await;

    let response = assert_ok!(transcribe(&fixture, &fast()).await);

    assert_eq!(response.text, "hello world");
    status.assert_async().await;
}

#[tokio::test]
async fn test_transient_503_is_retried() {
    let fixture = MockServerFixture::new().await;
    let _submit = submit_mocks(&fixture, 1).await;
    let unavailable = fixture.mock_status_failure(503).await;
    let done = fixture
        .mock_status_sequence(
            "task-1",
            vec![task_envelope("task-1", "DONE", Some("result-1")).to_string()],
            1,
        )
        .await;
    let _download = fixture
        .mock_download("result-1", &two_channel_payload(), 1)
        .await;

    let response = transcribe(&fixture, &fast()).await.unwrap();

    assert_eq!(response.segments().len(), 2);
    unavailable.assert_async().await;
    done.assert_async().await;
}

#[tokio::test]
async fn test_unauthorized_poll_refreshes_token() {
    let fixture = MockServerFixture::new().await;
    let submit = submit_mocks(&fixture, 2).await;
    let unauthorized = fixture.mock_status_failure(401).await;
    let _done = fixture
        .mock_status_sequence(
            "task-1",
            vec![task_envelope("task-1", "DONE", Some("result-1")).to_string()],
            1,
        )
        .await;
    let _download = fixture
        .mock_download("result-1", &two_channel_payload(), 1)
        .await;

    assert_ok!(transcribe(&fixture, &fast()).await);

    unauthorized.assert_async().await;
    // initial token plus one refresh after the 401
    submit[0].assert_async().await;
}

#[tokio::test]
async fn test_transient_token_failure_during_polling_is_retried() {
    let fixture = MockServerFixture::new().await;
    let _submit = submit_mocks(&fixture, 1).await;
    let oauth_busy = {
        let mut server = fixture.server.lock().await;
        server
            .mock("POST", OAUTH_PATH)
            .with_status(503)
            .with_body("busy")
            .expect(1)
            .create_async()
            .await
    };
    let refreshed = fixture.mock_token("tok-2", 1).await;
    let unauthorized = fixture.mock_status_failure(401).await;
    let done = fixture
        .mock_status_sequence(
            "task-1",
            vec![task_envelope("task-1", "DONE", Some("result-1")).to_string()],
            1,
        )
        .await;
    let _download = fixture
        .mock_download("result-1", &two_channel_payload(), 1)
        .await;

    let response = assert_ok!(transcribe(&fixture, &fast()).await);

    assert_eq!(response.segments().len(), 2);
    unauthorized.assert_async().await;
    oauth_busy.assert_async().await;
    refreshed.assert_async().await;
    done.assert_async().await;
}

#[tokio::test]
async fn test_rejected_credentials_during_polling_are_fatal() {
    let fixture = MockServerFixture::new().await;
    let _submit = submit_mocks(&fixture, 1).await;
    let oauth_rejected = {
        let mut server = fixture.server.lock().await;
        server
            .mock("POST", OAUTH_PATH)
            .with_status(401)
            .with_body(json!({"code": 6, "message": "credentials doesn't match"}).to_string())
            .expect(1)
            .create_async()
            .await
    };
    let _unauthorized = fixture.mock_status_failure(401).await;

    let err = transcribe(&fixture, &fast()).await.unwrap_err();

    assert!(
        matches!(err, Error::TokenRequest { status: Some(401), .. }),
        "{:?}",
        err
    );
    oauth_rejected.assert_async().await;
}

#[tokio::test]
async fn test_not_found_is_fatal() {
    let fixture = MockServerFixture::new().await;
    let _submit = submit_mocks(&fixture, 1).await;
    let not_found = fixture.mock_status_failure(404).await;

    let err = transcribe(&fixture, &fast()).await.unwrap_err();

    assert!(matches!(err, Error::TaskStatusResponse { .. }), "{:?}", err);
    not_found.assert_async().await;
}

#[tokio::test]
async fn test_task_error_surfaces_service_message() {
    let fixture = MockServerFixture::new().await;
    let _submit = submit_mocks(&fixture, 1).await;
    let mut failed = task_envelope("task-1", "ERROR", None);
    failed["result"]["error"] = serde_json::json!("audio is too short");
    let _status = fixture
        .mock_status_sequence("task-1", vec![failed.to_string()], 1)
        .await;

    let err = transcribe(&fixture, &fast()).await.unwrap_err();

    match err {
        Error::TaskStatusResponse {
            task_id,
            status,
            message,
        } => {
            assert_eq!(task_id.as_deref(), Some("task-1"));
            assert_eq!(status.as_deref(), Some("ERROR"));
            assert_eq!(message, "audio is too short");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_cancellation_aborts_polling() {
    let fixture = MockServerFixture::new().await;
    let _submit = submit_mocks(&fixture, 1).await;
    let _running = {
        let mut server = fixture.server.lock().await;
        server
            .mock("GET", "/rest/v1/task:get")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(task_envelope("task-1", "RUNNING", None).to_string())
            .create_async()
            .await
    };

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let err = transcribe(&fixture, &fast().cancel_token(cancel)).await.unwrap_err();

    assert_eq!(err.kind(), "CancelledError");
}

#[tokio::test]
async fn test_deadline_aborts_polling() {
    let fixture = MockServerFixture::new().await;
    let _submit = submit_mocks(&fixture, 1).await;
    let _running = fixture
        .mock_status_sequence(
            "task-1",
            vec![task_envelope("task-1", "RUNNING", None).to_string()],
            1,
        )
        .await;

    let started = std::time::Instant::now();
    let err = transcribe(&fixture, &fast().timeout(Duration::from_millis(100))).await.unwrap_err();

    assert!(matches!(err, Error::Cancelled { .. }));
    assert!(started.elapsed() < Duration::from_secs(5));
}
