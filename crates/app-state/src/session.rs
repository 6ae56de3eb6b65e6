//! Session state management
//!
//! Owns the signed-in user's token and profile. The token is persisted under
//! [`keys::TOKEN`] so the HTTP client can attach it; the profile is persisted
//! under [`keys::USER`] as JSON so it can be shown before the first refresh.
//!
//! ```text
//! Anonymous ──login──▶ Authenticating ──ok──▶ Authenticated
//!     ▲                      │                      │
//!     └──────── error ───────┘        logout / 401 ─┘
//! ```

use parking_lot::RwLock;
use recipe_client::{LoginResponse, RecipeApi, UserProfile};
use std::sync::Arc;
use storage::{keys, KeyValueStore};

use crate::error::{AppError, Result, ValidationError, MIN_PASSWORD_LEN};
use crate::favorites::FavoritesState;

/// Signed-in session data
///
/// A profile is only ever held together with a token.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    token: Option<String>,
    user: Option<UserProfile>,
}

impl Session {
    fn new(token: String, user: Option<UserProfile>) -> Self {
        Self { token: Some(token), user }
    }

    /// Bearer token
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Profile of the signed-in user
    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    /// Check if a token is held
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// Session lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// No session
    #[default]
    Anonymous,
    /// Login request in flight
    Authenticating,
    /// Token held
    Authenticated,
}

#[derive(Debug, Default)]
struct SessionInner {
    session: Session,
    status: SessionStatus,
    /// Bumped whenever the session is replaced
    generation: u64,
}

impl SessionInner {
    fn replace(&mut self, session: Session) {
        self.status = if session.is_authenticated() {
            SessionStatus::Authenticated
        } else {
            SessionStatus::Anonymous
        };
        self.session = session;
        self.generation += 1;
    }
}

/// Session state manager
#[derive(Clone)]
pub struct SessionState {
    api: RecipeApi,
    store: Arc<dyn KeyValueStore>,
    favorites: FavoritesState,
    inner: Arc<RwLock<SessionInner>>,
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("SessionState")
            .field("status", &inner.status)
            .field("user", &inner.session.user)
            .finish_non_exhaustive()
    }
}

impl SessionState {
    /// Create an anonymous session state
    ///
    /// The state signs itself out whenever `api`'s client detects an expired
    /// session. Call [`restore`](Self::restore) to pick up a persisted
    /// session.
    pub fn new(api: RecipeApi, store: Arc<dyn KeyValueStore>, favorites: FavoritesState) -> Self {
        let inner = Arc::new(RwLock::new(SessionInner::default()));

        let expired = Arc::downgrade(&inner);
        api.client().on_session_expired(move || {
            if let Some(inner) = expired.upgrade() {
                inner.write().replace(Session::default());
                tracing::info!("Session expired, signed out");
            }
        });

        Self { api, store, favorites, inner }
    }

    /// Hydrate the session from the store
    ///
    /// Unreadable entries are logged and treated as absent.
    pub async fn restore(&self) -> SessionStatus {
        let token = match self.store.get(keys::TOKEN).await {
            Ok(token) => token.filter(|token| !token.is_empty()),
            Err(e) => {
                tracing::warn!("Failed to read stored token: {}", e);
                None
            }
        };

        let Some(token) = token else {
            self.inner.write().replace(Session::default());
            return SessionStatus::Anonymous;
        };

        let user = match self.store.get(keys::USER).await {
            Ok(Some(raw)) => serde_json::from_str::<UserProfile>(&raw)
                .map_err(|e| tracing::warn!("Ignoring unreadable stored profile: {}", e))
                .ok(),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Failed to read stored profile: {}", e);
                None
            }
        };

        tracing::info!("Restored session (profile cached: {})", user.is_some());
        self.inner.write().replace(Session::new(token, user));
        SessionStatus::Authenticated
    }

    /// Sign in with email and password
    ///
    /// Empty fields are rejected without a request. On success the token and
    /// profile are persisted before the session becomes authenticated.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        if email.is_empty() || password.is_empty() {
            tracing::debug!("Login rejected: missing credentials");
            return Err(ValidationError::MissingCredentials.into());
        }

        self.inner.write().status = SessionStatus::Authenticating;

        let result = match self.api.login(email, password).await {
            Ok(response) => self.persist_login(&response).await.map(|()| response),
            Err(e) => {
                tracing::warn!("Login failed: {}", e);
                Err(e.into())
            }
        };

        let mut inner = self.inner.write();
        match result {
            Ok(LoginResponse { token, user }) => {
                inner.replace(Session::new(token, user));
                tracing::info!("Signed in");
                Ok(inner.session.clone())
            }
            Err(e) => {
                inner.status = if inner.session.is_authenticated() {
                    SessionStatus::Authenticated
                } else {
                    SessionStatus::Anonymous
                };
                Err(e)
            }
        }
    }

    async fn persist_login(&self, response: &LoginResponse) -> Result<()> {
        self.store.set(keys::TOKEN, &response.token).await.map_err(|e| {
            tracing::error!("Failed to persist token: {}", e);
            AppError::from(e)
        })?;

        let stored_user = match &response.user {
            Some(user) => self.persist_user(user).await,
            None => self.store.remove(keys::USER).await.map(|_| ()).map_err(AppError::from),
        };

        if let Err(e) = stored_user {
            tracing::error!("Failed to persist profile: {}", e);
            if let Err(e) = self.store.remove(keys::TOKEN).await {
                tracing::error!("Failed to remove token after incomplete login: {}", e);
            }
            return Err(e);
        }

        Ok(())
    }

    async fn persist_user(&self, user: &UserProfile) -> Result<()> {
        let raw = serde_json::to_string(user).map_err(|e| AppError::Decode(e.to_string()))?;
        self.store.set(keys::USER, &raw).await?;
        Ok(())
    }

    /// Create an account
    ///
    /// Does not sign in; the user logs in afterwards.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<()> {
        if let Err(e) = validate_registration(name, email, password) {
            tracing::debug!("Registration rejected: {}", e);
            return Err(e.into());
        }

        self.api.register(name, email, password).await.map_err(|e| {
            tracing::warn!("Registration failed: {}", e);
            AppError::from(e)
        })?;

        tracing::info!("Account registered");
        Ok(())
    }

    /// Sign out
    ///
    /// The in-memory session and favorites are always cleared. The first
    /// storage error, if any, is returned.
    pub async fn logout(&self) -> Result<()> {
        let mut first_error = None;

        for key in [keys::TOKEN, keys::USER] {
            if let Err(e) = self.store.remove(key).await {
                tracing::error!("Failed to remove {} on logout: {}", key, e);
                first_error.get_or_insert(e);
            }
        }

        self.inner.write().replace(Session::default());
        self.favorites.clear();
        tracing::info!("Signed out");

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    /// Refresh the profile from the server
    ///
    /// A fetched profile replaces the current one only if the session it was
    /// requested for is still active. On failure the last known profile is
    /// kept and the session stays as it is, unless the server rejected the
    /// token.
    pub async fn load_profile(&self) -> Result<Option<UserProfile>> {
        let generation = self.inner.read().generation;

        let profile = match self.api.profile().await {
            Ok(profile) => profile,
            Err(e) => {
                if !e.is_auth_expired() {
                    tracing::warn!("Failed to refresh profile: {}", e);
                }
                return Err(e.into());
            }
        };

        let Some(profile) = profile else {
            tracing::debug!("Profile response carried no data");
            return Ok(self.profile());
        };

        let applied = {
            let mut inner = self.inner.write();
            if inner.generation == generation && inner.session.is_authenticated() {
                inner.session.user = Some(profile.clone());
                true
            } else {
                false
            }
        };

        if !applied {
            tracing::debug!("Discarding profile fetched for a previous session");
            return Ok(self.profile());
        }

        if let Err(e) = self.persist_user(&profile).await {
            tracing::warn!("Failed to cache profile: {}", e);
        }

        // The session may have been replaced while the write was in flight.
        let superseded = {
            let inner = self.inner.read();
            (inner.generation != generation).then(|| inner.session.user.clone())
        };

        if let Some(current) = superseded {
            tracing::debug!("Session changed while caching profile, restoring stored profile");
            let restored = match &current {
                Some(user) => self.persist_user(user).await,
                None => self.store.remove(keys::USER).await.map(|_| ()).map_err(AppError::from),
            };
            if let Err(e) = restored {
                tracing::error!("Failed to restore stored profile: {}", e);
            }
            return Ok(current);
        }

        Ok(Some(profile))
    }

    /// Check if a session is active
    pub fn is_logged_in(&self) -> bool {
        self.status() == SessionStatus::Authenticated
    }

    /// Current status
    pub fn status(&self) -> SessionStatus {
        self.inner.read().status
    }

    /// Snapshot of the session
    pub fn session(&self) -> Session {
        self.inner.read().session.clone()
    }

    /// Profile of the signed-in user
    pub fn profile(&self) -> Option<UserProfile> {
        self.inner.read().session.user.clone()
    }

    /// Bearer token of the session
    pub fn token(&self) -> Option<String> {
        self.inner.read().session.token.clone()
    }
}

fn validate_registration(
    name: &str,
    email: &str,
    password: &str,
) -> std::result::Result<(), ValidationError> {
    if name.is_empty() || email.is_empty() || password.is_empty() {
        return Err(ValidationError::MissingFields);
    }

    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort { min: MIN_PASSWORD_LEN });
    }

    if !email.contains('@') {
        return Err(ValidationError::InvalidEmail);
    }

    Ok(())
}
