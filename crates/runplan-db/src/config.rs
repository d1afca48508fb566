use std::env;
use std::time::Duration;

/// Environment variable holding the connection URL.
pub const DATABASE_URL_ENV: &str = "RUNPLAN_DATABASE_URL";

/// Database configuration.
///
/// Reads from `RUNPLAN_DATABASE_URL`, falling back to
/// `postgresql://localhost:5432/runplan` when unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// Full PostgreSQL connection URL.
    pub database_url: String,
    /// Pool size. Each in-flight HTTP generation holds a connection only for
    /// the final insert, so a small pool serves many concurrent requests.
    pub max_connections: u32,
    /// How long to wait for a free connection before failing.
    pub acquire_timeout: Duration,
}

impl DbConfig {
    pub const DEFAULT_URL: &str = "postgresql://localhost:5432/runplan";
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
    pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn from_env() -> Self {
        Self::new(env::var(DATABASE_URL_ENV).unwrap_or_else(|_| Self::DEFAULT_URL.to_owned()))
    }

    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: Self::DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: Self::DEFAULT_ACQUIRE_TIMEOUT,
        }
    }

    /// Override pool sizing. A zero size is raised to one.
    pub fn with_pool_limits(mut self, max_connections: u32, acquire_timeout: Duration) -> Self {
        self.max_connections = max_connections.max(1);
        self.acquire_timeout = acquire_timeout;
        self
    }

    /// Database name: the last path segment, without query parameters.
    pub fn database_name(&self) -> Option<&str> {
        let without_query = self.database_url.split('?').next()?;
        let (prefix, name) = without_query.rsplit_once('/')?;
        // "postgresql://host:5432" has no path; its last segment is the host.
        if prefix.ends_with('/') || name.is_empty() {
            return None;
        }
        Some(name)
    }

    /// URL of the `postgres` maintenance database on the same server, used to
    /// issue `CREATE DATABASE`.
    pub fn maintenance_url(&self) -> String {
        let (base, query) = match self.database_url.split_once('?') {
            Some((base, query)) => (base, Some(query)),
            None => (self.database_url.as_str(), None),
        };
        let mut url = match base.rfind('/') {
            Some(pos) if !base[..pos].ends_with('/') => format!("{}/postgres", &base[..pos]),
            _ => format!("{base}/postgres"),
        };
        if let Some(query) = query {
            url.push('?');
            url.push_str(query);
        }
        url
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
