use beacon_common::{env_duration_ms, env_or, env_required, ConfigError};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum StoreBackend {
    Postgres { database_url: String },
    Memory,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub port: u16,
    pub store: StoreBackend,
    pub store_timeout: Duration,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend = env_or("EVENT_STORE", "postgres".to_string());
        let store = match backend.trim().to_ascii_lowercase().as_str() {
            // Keeps nothing across restarts; meant for local relay testing.
            "memory" => StoreBackend::Memory,
            "postgres" => StoreBackend::Postgres {
                database_url: env_required("DATABASE_URL")?,
            },
            _ => {
                return Err(ConfigError::Unsupported {
                    key: "EVENT_STORE",
                    value: backend,
                    expected: "postgres, memory",
                })
            }
        };

        Ok(Self {
            port: env_or("PORT", 5000u16),
            store,
            store_timeout: env_duration_ms("STORE_TIMEOUT_MS", 5000),
        })
    }
}
