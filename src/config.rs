use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Path prefix under which the NameNode serves the REST API
pub const DEFAULT_PREFIX: &str = "/webhdfs/v1/";

/// Request timeout used when none is configured
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Connection settings for a [`WebHdfsClient`](crate::WebHdfsClient)
///
/// ```
/// use webhdfs_client::ClientConfig;
///
/// let config = ClientConfig::new("http://namenode:9870").with_user("hdfs");
/// assert_eq!(config.prefix, "/webhdfs/v1/");
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Scheme, host and port of the NameNode, e.g. `http://namenode:9870`
    pub base_url: String,
    /// Sent as `user.name` on every request when set
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    concat!("webhdfs-client/", env!("CARGO_PKG_VERSION")).to_string()
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            user: None,
            prefix: default_prefix(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }

    /// Load a configuration from a JSON document
    ///
    /// Only `base_url` is required; everything else falls back to its default.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::InvalidConfig {
            message: e.to_string(),
        })
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        let user = user.into();
        self.user = if user.is_empty() { None } else { Some(user) };
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
