//! End-to-end transcription flow

use crate::mock_server::{task_envelope, two_channel_payload, wav_bytes, MockServerFixture};
use salute_speech::{
    AudioDescriptor, AudioEncoding, Error, OutputFormat, SpeechRecognitionConfig,
    TranscriptionOptions,
};
use std::io::Cursor;
use std::time::Duration;
use tokio_test::assert_err;

fn fast() -> TranscriptionOptions {
    TranscriptionOptions::new().poll_interval(Duration::from_millis(10))
}

#[tokio::test]
async fn test_transcribe_two_channel_wav() {
    let fixture = MockServerFixture::new().await;
    let token = fixture.mock_token("tok-1", 1).await;
    let upload = fixture.mock_upload_ok("file-1").await;
    let recognize = {
        let mut server = fixture.server.lock().await;
        server
            .mock("POST", "/rest/v1/speech:async_recognize")
            .match_header("authorization", "Bearer tok-1")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "request_file_id": "file-1",
                "options": {
                    "language": "en-US",
                    "audio_encoding": "PCM_S16LE",
                    "sample_rate": 16000,
                    "channels_count": 2,
                    "hypotheses_count": 1
                }
            })))
            .with_status(200)
            .with_body(task_envelope("task-1", "NEW", None).to_string())
            .expect(1)
            .create_async()
            .await
    };
    let status = fixture
        .mock_status_sequence(
            "task-1",
            vec![task_envelope("task-1", "DONE", Some("result-1")).to_string()],
            1,
        )
        .await;
    let download = fixture
        .mock_download("result-1", &two_channel_payload(), 1)
        .await;

    let client = fixture.create_test_client();
    let output = client
        .transcriptions()
        .create_with_raw(Cursor::new(wav_bytes(16_000, 2)), &fast().language("en-US"))
        .await
        .unwrap();

    let response = &output.response;
    assert_eq!(response.text, "hello world");
    assert_eq!(response.duration, 2.0);
    assert_eq!(response.language, "en");
    assert_eq!(response.task_id, "task-1");
    assert_eq!(response.status, "DONE");
    let segments = response.segments();
    assert_eq!(segments.len(), 2);
    assert_eq!((segments[0].start, segments[0].end), (0.0, 1.2));
    assert_eq!((segments[1].start, segments[1].end), (0.5, 2.0));
    assert_eq!(output.raw, two_channel_payload());

    let srt = salute_speech::render(response, OutputFormat::Srt).unwrap();
    assert!(srt.starts_with("1\n00:00:00,000 --> 00:00:01,200\nhello\n\n2\n"));

    token.assert_async().await;
    upload.assert_async().await;
    recognize.assert_async().await;
    status.assert_async().await;
    download.assert_async().await;
}

#[tokio::test]
async fn test_upload_failure_stops_the_flow() {
    let fixture = MockServerFixture::new().await;
    let _token = fixture.mock_token("tok-1", 1).await;
    let upload = fixture
        .mock_upload(500, r#"{"status":500,"message":"internal"}"#, 1)
        .await;
    let recognize = fixture.mock_recognize("task-1", 0).await;

    let client = fixture.create_test_client();
    let err = assert_err!(
        client
            .transcriptions()
            .create(Cursor::new(wav_bytes(16_000, 1)), &fast())
            .await
    );

    assert!(matches!(err, Error::FileUpload { status: Some(500), .. }));
    upload.assert_async().await;
    recognize.assert_async().await;
}

#[tokio::test]
async fn test_upload_without_file_id_is_invalid_response() {
    let fixture = MockServerFixture::new().await;
    let _token = fixture.mock_token("tok-1", 1).await;
    let _upload = fixture.mock_upload(200, r#"{"status":200,"result":{}}"#, 1).await;
    let recognize = fixture.mock_recognize("task-1", 0).await;

    let client = fixture.create_test_client();
    let err = client
        .transcriptions()
        .create(Cursor::new(wav_bytes(16_000, 1)), &fast())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "InvalidResponseError");
    recognize.assert_async().await;
}

#[tokio::test]
async fn test_invalid_audio_fails_before_any_request() {
    let fixture = MockServerFixture::new().await;
    let token = fixture.mock_token("tok-1", 0).await;
    let upload = fixture.mock_upload(200, "{}", 0).await;
    let client = fixture.create_test_client();

    // OPUS is mono only
    let opts = fast().audio(AudioDescriptor::new(AudioEncoding::Opus, 48_000, 2));
    let err = client
        .transcriptions()
        .create(Cursor::new(vec![0u8; 64]), &opts)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "ValidationError");

    // PCM above 96 kHz
    let err = client
        .transcriptions()
        .create(Cursor::new(vec![0u8; 64]), &fast().audio(AudioDescriptor::new(AudioEncoding::PcmS16le, 192_000, 1)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "ValidationError");

    // bad recognition config
    let opts = fast().config(SpeechRecognitionConfig::default().with_hypotheses_count(11));
    let err = client
        .transcriptions()
        .create(Cursor::new(wav_bytes(16_000, 1)), &opts)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "ValidationError");

    // nothing to read
    let err = client
        .transcriptions()
        .create(tokio::io::empty(), &fast())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "ValidationError");

    token.assert_async().await;
    upload.assert_async().await;
}

#[tokio::test]
async fn test_recognize_rejection_is_api_error() {
    let fixture = MockServerFixture::new().await;
    let _token = fixture.mock_token("tok-1", 1).await;
    let _upload = fixture.mock_upload_ok("file-1").await;
    let _recognize = {
        let mut server = fixture.server.lock().await;
        server
            .mock("POST", "/rest/v1/speech:async_recognize")
            .with_status(400)
            .with_body(r#"{"status":400,"message":"unsupported language"}"#)
            .create_async()
            .await
    };

    let client = fixture.create_test_client();
    let err = client
        .transcriptions()
        .create(Cursor::new(wav_bytes(16_000, 1)), &fast())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "ApiError");
    assert_eq!(err.http_status(), Some(400));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_done_without_result_file_fails() {
    let fixture = MockServerFixture::new().await;
    let _token = fixture.mock_token("tok-1", 1).await;
    let _upload = fixture.mock_upload_ok("file-1").await;
    let _recognize = fixture.mock_recognize("task-1", 1).await;
    let _status = fixture
        .mock_status_sequence("task-1", vec![task_envelope("task-1", "DONE", None).to_string()], 1)
        .await;

    let client = fixture.create_test_client();
    let err = client
        .transcriptions()
        .create(Cursor::new(wav_bytes(16_000, 1)), &fast())
        .await
        .unwrap_err();

    match err {
        Error::TaskStatusResponse { task_id, status, .. } => {
            assert_eq!(task_id.as_deref(), Some("task-1"));
            assert_eq!(status.as_deref(), Some("DONE"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_result_payload_fails() {
    let fixture = MockServerFixture::new().await;
    let _token = fixture.mock_token("tok-1", 1).await;
    let _upload = fixture.mock_upload_ok("file-1").await;
    let _recognize = fixture.mock_recognize("task-1", 1).await;
    let _status = fixture
        .mock_status_sequence(
            "task-1",
            vec![task_envelope("task-1", "DONE", Some("result-1")).to_string()],
            1,
        )
        .await;
    let _download = fixture.mock_download("result-1", "", 1).await;

    let client = fixture.create_test_client();
    let err = client
        .transcriptions()
        .create(Cursor::new(wav_bytes(16_000, 1)), &fast())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "TaskStatusResponseError");
}
