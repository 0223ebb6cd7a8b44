use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Connection policy handed to the transport at construction.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct TransportConfig {
    pub timeout: Duration,
    pub insecure: bool,
    pub max_idle_per_host: usize,
    pub idle_timeout: Duration,
    pub http2: bool,
    pub max_redirects: usize,
    pub user_agent: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            timeout: Duration::from_secs(30),
            insecure: false,
            max_idle_per_host: 100,
            idle_timeout: Duration::from_secs(90),
            http2: true,
            max_redirects: 10,
            user_agent: None,
        }
    }
}
