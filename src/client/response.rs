//! Service envelope: `{"status": <int>, "result": {...}}`.

use crate::transport::HttpResponse;
use crate::{Error, ErrorContext, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub(crate) struct Envelope {
    #[serde(default)]
    pub status: Option<i64>,
    #[serde(default)]
    pub result: Option<Value>,
}

impl Envelope {
    pub fn parse(response: &HttpResponse, endpoint: &str) -> Result<Self> {
        serde_json::from_str(&response.body).map_err(|e| {
            Error::invalid_response_with_context(
                format!("Failed to parse response as JSON: {}", e),
                ErrorContext::new().with_source(endpoint),
            )
        })
    }

    /// The envelope's own status, when it signals a failure.
    pub fn failure_status(&self) -> Option<u16> {
        match self.status {
            Some(200) => None,
            Some(code) => Some(u16::try_from(code).unwrap_or(0)),
            None => Some(0),
        }
    }

    /// Deserialize `result`, reporting missing fields as an invalid response.
    pub fn into_result<T: DeserializeOwned>(self, endpoint: &str) -> Result<T> {
        let result = self.result.ok_or_else(|| {
            Error::invalid_response_with_context(
                "Response missing 'result' field",
                ErrorContext::new()
                    .with_field_path("result")
                    .with_source(endpoint),
            )
        })?;
        serde_json::from_value(result).map_err(|e| {
            Error::invalid_response_with_context(
                format!("Result is missing required fields: {}", e),
                ErrorContext::new()
                    .with_field_path("result")
                    .with_source(endpoint),
            )
        })
    }
}
