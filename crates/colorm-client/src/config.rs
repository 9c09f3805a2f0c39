//! Client configuration.

use std::time::Duration;

use crate::error::Error;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Keyspace selected when a session opens.
    pub keyspace: Option<String>,

    /// Per-statement timeout.
    pub request_timeout: Duration,

    /// Client identifier, attached to log events.
    pub client_id: String,
}

impl ClientConfig {
    /// Create a configuration with no keyspace and the default timeout.
    pub fn new() -> Self {
        Self {
            keyspace: None,
            request_timeout: DEFAULT_TIMEOUT,
            client_id: generate_client_id(),
        }
    }

    /// Select a keyspace on connect.
    pub fn with_keyspace(mut self, keyspace: impl Into<String>) -> Self {
        self.keyspace = Some(keyspace.into());
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the client identifier.
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    /// Check the configuration before use.
    pub fn validate(&self) -> Result<(), Error> {
        if self.request_timeout.is_zero() {
            return Err(Error::Config("request timeout must be positive".into()));
        }
        if let Some(keyspace) = &self.keyspace {
            let valid = keyspace
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && keyspace
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !valid {
                return Err(Error::Config(format!("invalid keyspace name '{}'", keyspace)));
            }
        }
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Generate a unique client identifier.
fn generate_client_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();

    format!("client-{:x}", timestamp)
}
