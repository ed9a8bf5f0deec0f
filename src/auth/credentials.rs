use crate::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use keyring::Entry;
use std::env;
use std::fmt;

/// Environment variable holding the Base64 authorization key.
pub const CREDENTIALS_ENV: &str = "SBER_SPEECH_API_KEY";
const KEYRING_SERVICE: &str = "salute-speech";
const KEYRING_USER: &str = "client_credentials";

/// Authorization key sent to the OAuth endpoint as `Basic <key>`.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials(String);

impl ClientCredentials {
    /// Wrap an already encoded authorization key (as shown in the developer console).
    pub fn from_authorization_key(key: impl Into<String>) -> Result<Self> {
        let key = key.into().trim().to_string();
        if key.is_empty() {
            return Err(Error::configuration("Authorization key must not be empty"));
        }
        Ok(Self(key))
    }

    /// Encode `client_id:client_secret`.
    pub fn from_client_secret(client_id: &str, client_secret: &str) -> Result<Self> {
        if client_id.is_empty() || client_secret.is_empty() {
            return Err(Error::configuration(
                "Client id and client secret must not be empty",
            ));
        }
        Ok(Self(STANDARD.encode(format!("{}:{}", client_id, client_secret))))
    }

    /// Look up the key in the OS keyring, then in `SBER_SPEECH_API_KEY`.
    pub fn from_env() -> Result<Self> {
        // 1. Try Keyring
        if let Ok(entry) = Entry::new(KEYRING_SERVICE, KEYRING_USER) {
            if let Ok(key) = entry.get_password() {
                return Self::from_authorization_key(key);
            }
        }

        // 2. Try Environment Variable
        match env::var(CREDENTIALS_ENV) {
            Ok(key) => Self::from_authorization_key(key),
            Err(_) => Err(Error::configuration(format!(
                "Credentials not found: set {} or the '{}/{}' keyring entry",
                CREDENTIALS_ENV, KEYRING_SERVICE, KEYRING_USER
            ))),
        }
    }

    pub(crate) fn basic_header(&self) -> String {
        format!("Basic {}", self.0)
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ClientCredentials(***)")
    }
}
