//! Storage layer for Recipe Box
//!
//! This crate provides the persistent key-value store that backs the
//! session token, the cached user profile, and the theme preference.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod keys;
pub mod kv;
pub mod memory;
pub mod store;

pub use kv::{KvConfig, KvStore};
pub use memory::MemoryStore;
pub use store::{KeyValueStore, Result, StorageError};
