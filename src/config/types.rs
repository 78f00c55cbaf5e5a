use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Fetchrank
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub pool: PoolConfig,
    pub rescan: RescanConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl ServerConfig {
    /// Returns the `host:port` string the listener binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Ingestion pool configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    /// Number of concurrent ingestion workers
    pub workers: usize,

    /// Capacity of the submission queue before `submit` applies backpressure
    #[serde(rename = "queue-capacity", default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

/// Periodic rescan configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RescanConfig {
    /// Seconds between rescan ticks
    #[serde(rename = "interval-secs")]
    pub interval_secs: u64,
}

impl RescanConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Record store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Table holding the URL records
    #[serde(rename = "table-name")]
    pub table_name: String,
}

/// Outbound HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Whole-request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_queue_capacity() -> usize {
    64
}

fn default_user_agent() -> String {
    format!("fetchrank/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}
