use std::{env, str::FromStr, time::Duration};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{key} has unsupported value {value:?}, expected one of {expected}")]
    Unsupported {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
}

pub fn env_or<T: FromStr>(key: &str, default: T) -> T {
    // Parse typed environment values with a fallback.
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<T>().ok())
        .unwrap_or(default)
}

pub fn env_required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigError::Missing(key))
}

pub fn env_duration_ms(key: &str, default_ms: u64) -> Duration {
    Duration::from_millis(env_or(key, default_ms))
}
