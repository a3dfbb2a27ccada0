use std::time::Duration;

pub const DEFAULT_SERVER_ENDPOINT: &str = "http://localhost:2567";
pub const DEFAULT_ROOM_NAME: &str = "my_room";
pub const DEFAULT_SEND_INTERVAL_MS: u64 = 50;
pub const DEFAULT_DAMPING: f32 = 12.0;

pub const ENDPOINT_ENV: &str = "LLMETA_SERVER_ENDPOINT";
pub const ROOM_ENV: &str = "LLMETA_ROOM";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("send interval must be greater than zero")]
    ZeroSendInterval,
    #[error("damping must be finite and positive, got {0}")]
    InvalidDamping(f32),
    #[error("room name must not be empty")]
    EmptyRoomName,
    #[error("server endpoint must not be empty")]
    EmptyEndpoint,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    pub endpoint: String,
    pub room_name: String,
    pub send_interval_ms: u64,
    pub damping: f32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_SERVER_ENDPOINT.to_string(),
            room_name: DEFAULT_ROOM_NAME.to_string(),
            send_interval_ms: DEFAULT_SEND_INTERVAL_MS,
            damping: DEFAULT_DAMPING,
        }
    }
}

impl SyncConfig {
    /// Defaults overridden by `LLMETA_SERVER_ENDPOINT` and `LLMETA_ROOM`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(endpoint) = std::env::var(ENDPOINT_ENV) {
            if !endpoint.trim().is_empty() {
                config.endpoint = endpoint;
            }
        }
        if let Ok(room) = std::env::var(ROOM_ENV) {
            if !room.trim().is_empty() {
                config.room_name = room;
            }
        }
        config
    }

    pub fn send_interval(&self) -> Duration {
        Duration::from_millis(self.send_interval_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::EmptyEndpoint);
        }
        if self.room_name.trim().is_empty() {
            return Err(ConfigError::EmptyRoomName);
        }
        if self.send_interval_ms == 0 {
            return Err(ConfigError::ZeroSendInterval);
        }
        if !self.damping.is_finite() || self.damping <= 0.0 {
            return Err(ConfigError::InvalidDamping(self.damping));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SyncConfig::default();
        assert_eq!(config.send_interval(), Duration::from_millis(50));
        assert_eq!(config.room_name, "my_room");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero_interval = SyncConfig {
            send_interval_ms: 0,
            ..Default::default()
        };
        assert_eq!(zero_interval.validate(), Err(ConfigError::ZeroSendInterval));

        let nan_damping = SyncConfig {
            damping: f32::NAN,
            ..Default::default()
        };
        assert!(matches!(
            nan_damping.validate(),
            Err(ConfigError::InvalidDamping(_))
        ));

        let negative_damping = SyncConfig {
            damping: -1.0,
            ..Default::default()
        };
        assert_eq!(
            negative_damping.validate(),
            Err(ConfigError::InvalidDamping(-1.0))
        );

        let empty_room = SyncConfig {
            room_name: "  ".into(),
            ..Default::default()
        };
        assert_eq!(empty_room.validate(), Err(ConfigError::EmptyRoomName));
    }
}
