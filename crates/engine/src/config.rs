//! Relay configuration from the environment.

use std::time::Duration;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_USER_DB: &str = "users.db";
const DEFAULT_PRESENCE_WRITE_TIMEOUT_MS: u64 = 5_000;

/// Configuration for the relay server
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayConfig {
    /// Interface to bind
    pub server_host: String,
    /// Port to bind
    pub server_port: u16,
    /// SQLite file holding durable presence
    pub user_db: String,
    /// Upper bound for one durable status write
    pub presence_write_timeout: Duration,
    /// `*`, a comma separated origin list, or `None` for no CORS layer
    pub cors_allowed_origins: Option<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            server_host: DEFAULT_HOST.into(),
            server_port: DEFAULT_PORT,
            user_db: DEFAULT_USER_DB.into(),
            presence_write_timeout: Duration::from_millis(DEFAULT_PRESENCE_WRITE_TIMEOUT_MS),
            cors_allowed_origins: None,
        }
    }
}

impl RelayConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup. Unparseable numbers fall
    /// back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let server_port = lookup("SERVER_PORT")
            .or_else(|| lookup("PORT"))
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(defaults.server_port);

        let presence_write_timeout = lookup("PRESENCE_WRITE_TIMEOUT_MS")
            .and_then(|s| s.trim().parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.presence_write_timeout);

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Self {
            server_host: lookup("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port,
            user_db: lookup("USER_DB").unwrap_or(defaults.user_db),
            presence_write_timeout,
            cors_allowed_origins,
        }
    }

    /// Socket address string to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
