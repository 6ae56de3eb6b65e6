//! Theme preference state
//!
//! One [`ThemeMode`] per process, restored from the store at startup and
//! written back on every toggle. The in-memory value is the source of truth
//! for readers; a failed write only costs persistence across restarts.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storage::{keys, KeyValueStore};

/// Theme mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    /// Light theme
    Light,
    /// Dark theme
    #[default]
    Dark,
}

impl ThemeMode {
    /// Persisted representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }

    /// The other mode
    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }
}

impl std::fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ThemeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(ThemeMode::Light),
            "dark" => Ok(ThemeMode::Dark),
            _ => Err(format!("Unknown theme: {}", s)),
        }
    }
}

/// Process-wide theme preference
#[derive(Clone)]
pub struct ThemeState {
    mode: Arc<RwLock<ThemeMode>>,
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for ThemeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeState").field("mode", &self.mode()).finish()
    }
}

impl ThemeState {
    /// Restore the theme from `store`
    ///
    /// Missing, unreadable or unknown values fall back to [`ThemeMode::Dark`].
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let mode = match store.get(keys::THEME).await {
            Ok(Some(value)) => value.parse().unwrap_or_else(|e| {
                tracing::warn!("Ignoring stored theme: {}", e);
                ThemeMode::default()
            }),
            Ok(None) => ThemeMode::default(),
            Err(e) => {
                tracing::warn!("Failed to read theme preference: {}", e);
                ThemeMode::default()
            }
        };

        tracing::debug!("Theme restored: {}", mode);
        Self { mode: Arc::new(RwLock::new(mode)), store }
    }

    /// Current mode
    pub fn mode(&self) -> ThemeMode {
        *self.mode.read()
    }

    /// Check if the dark theme is active
    pub fn is_dark(&self) -> bool {
        self.mode() == ThemeMode::Dark
    }

    /// Flip the theme and persist it
    ///
    /// The new mode is visible to readers before the write starts. A failed
    /// write is logged and the flip stands.
    pub async fn toggle(&self) -> ThemeMode {
        let mode = {
            let mut current = self.mode.write();
            *current = current.toggled();
            *current
        };

        if let Err(e) = self.store.set(keys::THEME, mode.as_str()).await {
            tracing::warn!("Failed to persist theme preference: {}", e);
        }

        mode
    }
}
