//! Sessions over an execution backend.

use std::sync::Arc;

use async_trait::async_trait;
use colorm_proto::{ExecutionError, Executor, ResultSet, Value};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::Error;

/// A configured handle over a backend [`Executor`].
///
/// Opening a session selects the configured keyspace; every statement is
/// bounded by the request timeout.
#[derive(Clone)]
pub struct Session {
    backend: Arc<dyn Executor>,
    config: ClientConfig,
}

impl Session {
    /// Open a session over `backend`.
    pub async fn connect(backend: Arc<dyn Executor>, config: ClientConfig) -> Result<Self, Error> {
        config.validate()?;
        let session = Self { backend, config };

        if let Some(keyspace) = &session.config.keyspace {
            session.execute(&format!("USE {}", keyspace), &[]).await?;
            debug!(
                client_id = %session.config.client_id,
                keyspace = %keyspace,
                "Session keyspace selected"
            );
        }

        Ok(session)
    }

    /// The session configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

#[async_trait]
impl Executor for Session {
    async fn execute(&self, statement: &str, params: &[Value]) -> Result<ResultSet, ExecutionError> {
        let timeout = self.config.request_timeout;
        match tokio::time::timeout(timeout, self.backend.execute(statement, params)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    client_id = %self.config.client_id,
                    statement,
                    ?timeout,
                    "Statement timed out"
                );
                Err(ExecutionError::Timeout(timeout))
            }
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::memory::MemoryStore;

    struct Stalled;

    #[async_trait]
    impl Executor for Stalled {
        async fn execute(&self, _: &str, _: &[Value]) -> Result<ResultSet, ExecutionError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(ResultSet::empty())
        }
    }

    #[tokio::test]
    async fn test_connect_selects_keyspace() {
        let store = Arc::new(MemoryStore::new());
        let session = Session::connect(store.clone(), ClientConfig::new().with_keyspace("app"))
            .await
            .unwrap();

        assert_eq!(store.keyspace().as_deref(), Some("app"));
        assert_eq!(session.config().keyspace.as_deref(), Some("app"));

        session
            .execute("INSERT INTO users (id) VALUES (?)", &[Value::Int(1)])
            .await
            .unwrap();
        assert_eq!(store.rows("app.users").len(), 1);
    }

    #[tokio::test]
    async fn test_statement_timeout() {
        let config = ClientConfig::new().with_timeout(Duration::from_millis(20));
        let session = Session::connect(Arc::new(Stalled), config).await.unwrap();

        let result = session.execute("SELECT * FROM t", &[]).await;
        assert_eq!(result, Err(ExecutionError::Timeout(Duration::from_millis(20))));
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let config = ClientConfig::new().with_keyspace("bad name");
        let result = Session::connect(Arc::new(MemoryStore::new()), config).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
