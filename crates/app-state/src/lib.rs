//! Client-side state for Recipe Box
//!
//! This crate provides the session, theme and favorites state, optimistic
//! update bookkeeping, and the context that wires them to the store and the
//! HTTP client.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod context;
pub mod error;
pub mod favorites;
pub mod mutation;
pub mod session;
pub mod theme;

pub use config::AppConfig;
pub use context::AppContext;
pub use error::{AppError, Result, ValidationError};
pub use favorites::FavoritesState;
pub use mutation::{MutationLedger, MutationState, OptimisticUpdate};
pub use session::{Session, SessionState, SessionStatus};
pub use theme::{ThemeMode, ThemeState};
