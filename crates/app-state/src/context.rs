//! Application context
//!
//! Owns the store, the HTTP client and the three pieces of client state.
//! Screens receive the context (or clones of the states inside it) instead
//! of reaching for globals.

use recipe_client::{ApiClient, RecipeApi};
use std::sync::Arc;
use storage::{KeyValueStore, KvStore};

use crate::config::AppConfig;
use crate::error::Result;
use crate::favorites::FavoritesState;
use crate::session::SessionState;
use crate::theme::ThemeState;

/// Wired-up application state
#[derive(Debug, Clone)]
pub struct AppContext {
    config: AppConfig,
    api: RecipeApi,
    theme: ThemeState,
    session: SessionState,
    favorites: FavoritesState,
}

impl AppContext {
    /// Open the on-disk store named by `config` and build the context
    pub async fn init(config: AppConfig) -> Result<Self> {
        let store = KvStore::new(config.storage.clone())?;
        Self::with_store(config, Arc::new(store)).await
    }

    /// Build the context on top of an existing store
    ///
    /// The theme is restored before any network state exists; the session
    /// is restored last, once every expiry hook is registered.
    pub async fn with_store(config: AppConfig, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let theme = ThemeState::load(Arc::clone(&store)).await;

        let client = ApiClient::new(config.api.clone(), Arc::clone(&store))?;
        let api = RecipeApi::new(client);

        let favorites = FavoritesState::new(api.clone());
        let session = SessionState::new(api.clone(), store, favorites.clone());

        let status = session.restore().await;
        tracing::info!("App context ready (api: {}, session: {:?})", config.api.base_url, status);

        Ok(Self { config, api, theme, session, favorites })
    }

    /// Configuration the context was built with
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Typed API access
    pub fn api(&self) -> &RecipeApi {
        &self.api
    }

    /// Theme state
    pub fn theme(&self) -> &ThemeState {
        &self.theme
    }

    /// Session state
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Favorites state
    pub fn favorites(&self) -> &FavoritesState {
        &self.favorites
    }
}
