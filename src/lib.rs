//! Recipe Box client core
//!
//! Session, theme and favorites state for the Recipe Box app, backed by an
//! authenticated HTTP client and a persistent key-value store.
//!
//! # Example
//!
//! ```rust,no_run
//! use recipe_box::{AppConfig, AppContext};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     recipe_box::init_tracing()?;
//!
//!     let context = AppContext::init(AppConfig::from_env()).await?;
//!     if context.session().is_logged_in() {
//!         context.favorites().load().await?;
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub use app_state;
pub use recipe_client;
pub use storage;

pub use app_state::{
    AppConfig, AppContext, AppError, FavoritesState, SessionState, SessionStatus, ThemeMode,
    ThemeState, ValidationError,
};
pub use recipe_client::{ApiClient, ApiClientConfig, ApiError, Recipe, RecipeApi, UserProfile};
pub use storage::{KeyValueStore, KvConfig, KvStore, MemoryStore};

use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Install a global `tracing` subscriber
///
/// Reads the filter from `RUST_LOG`, falling back to [`DEFAULT_LOG_FILTER`].
/// Fails if a global subscriber is already set.
pub fn init_tracing() -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))?;

    tracing::debug!("Tracing initialised");
    Ok(())
}
