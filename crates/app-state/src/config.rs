//! Application configuration

use recipe_client::client::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use recipe_client::ApiClientConfig;
use std::{env, fmt::Display, str::FromStr, time::Duration};
use storage::KvConfig;
use tracing::{info, warn};

/// Base URL of the recipe service
pub const ENV_API_URL: &str = "RECIPE_API_URL";

/// Request timeout in whole seconds
pub const ENV_API_TIMEOUT_SECS: &str = "RECIPE_API_TIMEOUT_SECS";

/// Path of the on-disk key-value store
pub const ENV_STORE_PATH: &str = "RECIPE_STORE_PATH";

/// Configuration for [`AppContext`](crate::AppContext)
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// HTTP client settings
    pub api: ApiClientConfig,
    /// Key-value store settings
    pub storage: KvConfig,
}

impl AppConfig {
    /// Create a configuration from its parts
    pub fn new(api: ApiClientConfig, storage: KvConfig) -> Self {
        Self { api, storage }
    }

    /// Read the configuration from the process environment
    ///
    /// Unset or unparsable variables fall back to their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read the configuration through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url: String = try_load(&lookup, ENV_API_URL, DEFAULT_BASE_URL.to_string());
        let timeout_secs: u64 = try_load(&lookup, ENV_API_TIMEOUT_SECS, DEFAULT_TIMEOUT.as_secs());
        let store_path: String = try_load(&lookup, ENV_STORE_PATH, KvConfig::default().path);

        Self {
            api: ApiClientConfig::new(base_url).with_timeout(Duration::from_secs(timeout_secs)),
            storage: KvConfig::new(store_path),
        }
    }
}

fn try_load<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    let Some(raw) = lookup(key).filter(|value| !value.trim().is_empty()) else {
        info!("{key} not set, using default: {default}");
        return default;
    };

    raw.trim().parse().unwrap_or_else(|e| {
        warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
        default
    })
}
