use std::time::Duration;

use llmeta::{ConfigError, SyncConfig};

pub const DEFAULT_JOIN_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub sync: SyncConfig,
    pub join_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            sync: SyncConfig::default(),
            join_timeout: Duration::from_secs(DEFAULT_JOIN_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self {
            sync: SyncConfig::from_env(),
            ..Default::default()
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.sync.endpoint = endpoint.into();
        self
    }

    pub fn with_room(mut self, room_name: impl Into<String>) -> Self {
        self.sync.room_name = room_name.into();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sync.validate()
    }
}
