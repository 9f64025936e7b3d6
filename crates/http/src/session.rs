//! Session stores
//!
//! Supply the `sessionid` cookie value. [`EnvSession`] re-reads the
//! environment on every call so a rotated session is picked up without a
//! restart.

use async_trait::async_trait;
use mu_core::{Error, Result, SessionStore};

/// Environment variable holding the session id
pub const SESSION_ID_ENV: &str = "MU_SESSION_ID";

/// Fixed session id
#[derive(Debug, Clone)]
pub struct StaticSession {
    session_id: String,
}

impl StaticSession {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
        }
    }
}

#[async_trait]
impl SessionStore for StaticSession {
    async fn session_id(&self) -> Result<String> {
        Ok(self.session_id.clone())
    }
}

/// Session id from `MU_SESSION_ID`, falling back to a configured value
#[derive(Debug, Clone, Default)]
pub struct EnvSession {
    fallback: Option<String>,
}

impl EnvSession {
    pub fn new(fallback: Option<String>) -> Self {
        Self { fallback }
    }

    fn lookup(&self, env_value: Option<String>) -> Result<String> {
        env_value
            .filter(|v| !v.is_empty())
            .or_else(|| self.fallback.clone())
            .ok_or_else(|| {
                Error::Config(format!(
                    "No session id: set {SESSION_ID_ENV} or session_id in the config file"
                ))
            })
    }
}

#[async_trait]
impl SessionStore for EnvSession {
    async fn session_id(&self) -> Result<String> {
        self.lookup(std::env::var(SESSION_ID_ENV).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_session() {
        let session = StaticSession::new("abc");
        assert_eq!(session.session_id().await.unwrap(), "abc");
    }

    #[test]
    fn test_env_takes_precedence() {
        let session = EnvSession::new(Some("configured".to_string()));
        assert_eq!(session.lookup(Some("env".to_string())).unwrap(), "env");
        assert_eq!(session.lookup(Some(String::new())).unwrap(), "configured");
        assert_eq!(session.lookup(None).unwrap(), "configured");
    }

    #[test]
    fn test_missing_session() {
        let session = EnvSession::default();
        assert!(matches!(session.lookup(None), Err(Error::Config(_))));
    }
}
