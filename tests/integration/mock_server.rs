//! Mock SaluteSpeech service for integration tests

use hound::{SampleFormat, WavSpec, WavWriter};
use mockito::{Matcher, Mock, Server, ServerGuard};
use salute_speech::{ClientConfig, ClientCredentials, SaluteSpeechClient};
use serde_json::json;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

pub const API_ROOT: &str = "/rest/v1";
pub const OAUTH_PATH: &str = "/api/v2/oauth";
/// Base64 of `id:secret`.
pub const AUTH_KEY: &str = "aWQ6c2VjcmV0";

/// Test fixture that manages a mock server
pub struct MockServerFixture {
    pub server: Arc<Mutex<ServerGuard>>,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self {
            server: Arc::new(Mutex::new(server)),
            base_url,
        }
    }

    /// Client pointed at the mock server for both the API and OAuth.
    pub fn create_test_client(&self) -> SaluteSpeechClient {
        SaluteSpeechClient::builder()
            .config(ClientConfig::default())
            .credentials(ClientCredentials::from_authorization_key(AUTH_KEY).unwrap())
            .base_url(format!("{}{}/", self.base_url, API_ROOT))
            .auth_url(format!("{}{}", self.base_url, OAUTH_PATH))
            .build()
            .expect("client builds")
    }

    /// OAuth answer with a token valid for an hour.
    pub async fn mock_token(&self, token: &str, hits: usize) -> Mock {
        let expires_at = now_ms() + 3_600_000;
        let mut server = self.server.lock().await;
        server
            .mock("POST", OAUTH_PATH)
            .match_header("authorization", format!("Basic {}", AUTH_KEY).as_str())
            .match_header("rquid", Matcher::Regex(r"^[0-9a-f-]{36}$".to_string()))
            .match_body(Matcher::UrlEncoded(
                "scope".into(),
                "SALUTE_SPEECH_PERS".into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"access_token": token, "expires_at": expires_at}).to_string())
            .expect(hits)
            .create_async()
            .await
    }

    /// Raw OAuth answer, for malformed token responses.
    pub async fn mock_token_body(&self, status: usize, body: &str) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", OAUTH_PATH)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    pub async fn mock_upload(&self, status: usize, body: &str, hits: usize) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", format!("{}/data:upload", API_ROOT).as_str())
            .match_header("authorization", Matcher::Regex("^Bearer .+".to_string()))
            .match_header("x-request-id", Matcher::Any)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .expect(hits)
            .create_async()
            .await
    }

    pub async fn mock_upload_ok(&self, file_id: &str) -> Mock {
        self.mock_upload(
            200,
            &json!({"status": 200, "result": {"request_file_id": file_id}}).to_string(),
            1,
        )
        .await
    }

    pub async fn mock_recognize(&self, task_id: &str, hits: usize) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("POST", format!("{}/speech:async_recognize", API_ROOT).as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(task_envelope(task_id, "NEW", None).to_string())
            .expect(hits)
            .create_async()
            .await
    }

    /// `task:get` answering with `bodies` in order, repeating the last one.
    pub async fn mock_status_sequence(&self, task_id: &str, bodies: Vec<String>, hits: usize) -> Mock {
        let counter = AtomicUsize::new(0);
        let mut server = self.server.lock().await;
        server
            .mock("GET", format!("{}/task:get", API_ROOT).as_str())
            .match_query(Matcher::UrlEncoded("id".into(), task_id.into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body_from_request(move |_| {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                bodies[n.min(bodies.len() - 1)].clone().into_bytes()
            })
            .expect(hits)
            .create_async()
            .await
    }

    /// Plain `task:get` failure, matched once.
    pub async fn mock_status_failure(&self, status: usize) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("GET", format!("{}/task:get", API_ROOT).as_str())
            .match_query(Matcher::Any)
            .with_status(status)
            .with_body(r#"{"status":0,"message":"failure"}"#)
            .expect(1)
            .create_async()
            .await
    }

    pub async fn mock_download(&self, file_id: &str, payload: &str, hits: usize) -> Mock {
        let mut server = self.server.lock().await;
        server
            .mock("GET", format!("{}/data:download", API_ROOT).as_str())
            .match_query(Matcher::UrlEncoded("response_file_id".into(), file_id.into()))
            .with_status(200)
            .with_header("content-type", "application/octet-stream")
            .with_body(payload)
            .expect(hits)
            .create_async()
            .await
    }
}

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}

pub fn task_envelope(task_id: &str, status: &str, response_file_id: Option<&str>) -> serde_json::Value {
    let mut result = json!({
        "id": task_id,
        "status": status,
        "created_at": "2024-05-01T10:00:00.000Z",
        "updated_at": "2024-05-01T10:00:01.000Z",
    });
    if let Some(file_id) = response_file_id {
        result["response_file_id"] = json!(file_id);
    }
    json!({"status": 200, "result": result})
}

/// A tenth of a second of 16-bit PCM.
pub fn wav_bytes(sample_rate: u32, channels: u16) -> Vec<u8> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
        for i in 0..(sample_rate / 10) * channels as u32 {
            writer.write_sample(((i % 100) as i16 - 50) * 200).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

/// Two-channel recognition payload.
pub fn two_channel_payload() -> String {
    json!([
        {"channel": 1, "results": [{"normalized_text": "world", "text": "world", "start": "0.5s", "end": "2s"}]},
        {"channel": 0, "results": [{"normalized_text": "hello", "text": "hello", "start": "0s", "end": "1.200s"}]},
    ])
    .to_string()
}
