//! Favorites state
//!
//! The set of favorite recipe ids together with the recipe list the server
//! last reported for them. Both live behind one lock so the list view and
//! membership tests never disagree.
//!
//! Mutations are optimistic: the set changes before the request is sent and
//! is restored if the request fails. Every mutation is tracked by a
//! [`MutationLedger`]; a `load` or `clear` resets the ledger, and a rollback
//! from before the reset is dropped.

use parking_lot::RwLock;
use recipe_client::{Recipe, RecipeApi};
use std::collections::HashSet;
use std::sync::Arc;

use crate::error::Result;
use crate::mutation::{MutationLedger, MutationState, OptimisticUpdate};

/// Membership before an optimistic mutation
#[derive(Debug, Clone)]
struct Previous {
    was_favorite: bool,
    entry: Option<(usize, Recipe)>,
}

#[derive(Debug, Default)]
struct FavoritesInner {
    ids: HashSet<String>,
    recipes: Vec<Recipe>,
    ledger: MutationLedger,
    load_seq: u64,
}

impl FavoritesInner {
    fn replace(&mut self, recipes: Vec<Recipe>) {
        self.ids = recipes.iter().map(|recipe| recipe.id.clone()).collect();
        self.recipes = recipes;
        self.ledger.reset();
    }

    fn clear(&mut self) {
        self.ids.clear();
        self.recipes.clear();
        self.ledger.reset();
        self.load_seq += 1;
    }

    /// Add `recipe` to the set and the end of the list view
    fn insert(&mut self, recipe: &Recipe) -> Previous {
        let was_favorite = !self.ids.insert(recipe.id.clone());

        if !self.recipes.iter().any(|existing| existing.id == recipe.id) {
            self.recipes.push(recipe.clone());
        }

        Previous { was_favorite, entry: None }
    }

    /// Drop `recipe_id`, remembering where it sat in the list view
    fn take(&mut self, recipe_id: &str) -> Previous {
        let was_favorite = self.ids.remove(recipe_id);
        let entry = self
            .recipes
            .iter()
            .position(|recipe| recipe.id == recipe_id)
            .map(|index| (index, self.recipes.remove(index)));

        Previous { was_favorite, entry }
    }

    fn restore(&mut self, recipe_id: &str, previous: Previous) {
        if !previous.was_favorite {
            self.ids.remove(recipe_id);
            self.recipes.retain(|recipe| recipe.id != recipe_id);
            return;
        }

        self.ids.insert(recipe_id.to_string());
        if let Some((index, recipe)) = previous.entry {
            if !self.recipes.iter().any(|existing| existing.id == recipe_id) {
                let index = index.min(self.recipes.len());
                self.recipes.insert(index, recipe);
            }
        }
    }
}

/// Session-scoped favorites
#[derive(Debug, Clone)]
pub struct FavoritesState {
    api: RecipeApi,
    inner: Arc<RwLock<FavoritesInner>>,
}

impl FavoritesState {
    /// Create an empty favorites state
    ///
    /// The state empties itself whenever `api`'s client detects an expired
    /// session.
    pub fn new(api: RecipeApi) -> Self {
        let inner = Arc::new(RwLock::new(FavoritesInner::default()));

        let expired = Arc::downgrade(&inner);
        api.client().on_session_expired(move || {
            if let Some(inner) = expired.upgrade() {
                inner.write().clear();
            }
        });

        Self { api, inner }
    }

    /// Replace the set with the server's list
    ///
    /// On failure the set becomes empty and the error is returned. When loads
    /// overlap, only the most recently started one is applied.
    pub async fn load(&self) -> Result<()> {
        let seq = {
            let mut inner = self.inner.write();
            inner.load_seq += 1;
            inner.load_seq
        };

        let result = self.api.favorites().await;

        let mut inner = self.inner.write();
        if inner.load_seq != seq {
            tracing::debug!("Discarding superseded favorites load");
            return result.map(|_| ()).map_err(Into::into);
        }

        match result {
            Ok(recipes) => {
                tracing::debug!("Loaded {} favorites", recipes.len());
                inner.replace(recipes);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to load favorites: {}", e);
                inner.replace(Vec::new());
                Err(e.into())
            }
        }
    }

    /// Flip membership of `recipe` and sync it to the server
    ///
    /// Adding also appends `recipe` to the list view. Returns the new
    /// membership. On failure the previous membership is restored, unless a
    /// newer mutation or a reload superseded this one.
    pub async fn toggle(&self, recipe: &Recipe) -> Result<bool> {
        let recipe_id = recipe.id.as_str();
        let (update, favorite) = {
            let mut inner = self.inner.write();
            let favorite = !inner.ids.contains(recipe_id);
            let previous = if favorite { inner.insert(recipe) } else { inner.take(recipe_id) };
            (inner.ledger.begin(recipe_id, previous), favorite)
        };

        let result = if favorite {
            self.api.add_favorite(recipe_id).await
        } else {
            self.api.remove_favorite(recipe_id).await
        };

        self.settle(update, result)?;
        Ok(favorite)
    }

    /// Remove `recipe_id` and sync it to the server
    ///
    /// Rolls back on failure exactly like [`toggle`](Self::toggle).
    pub async fn remove(&self, recipe_id: &str) -> Result<()> {
        let update = {
            let mut inner = self.inner.write();
            let previous = inner.take(recipe_id);
            inner.ledger.begin(recipe_id, previous)
        };

        let result = self.api.remove_favorite(recipe_id).await;
        self.settle(update, result)
    }

    fn settle(
        &self,
        update: OptimisticUpdate<Previous>,
        result: recipe_client::Result<()>,
    ) -> Result<()> {
        let mut inner = self.inner.write();

        match result {
            Ok(()) => {
                inner.ledger.confirm(&update);
                Ok(())
            }
            Err(e) => {
                if inner.ledger.fail(&update) {
                    tracing::warn!("Favorite update for {} failed, rolling back: {}", update.key(), e);
                    let recipe_id = update.key().to_string();
                    inner.restore(&recipe_id, update.into_previous());
                } else {
                    tracing::debug!("Dropping stale rollback for {}", update.key());
                }
                Err(e.into())
            }
        }
    }

    /// Check membership without any I/O
    pub fn is_favorite(&self, recipe_id: &str) -> bool {
        self.inner.read().ids.contains(recipe_id)
    }

    /// Snapshot of the favorite ids
    pub fn ids(&self) -> HashSet<String> {
        self.inner.read().ids.clone()
    }

    /// Recipes for the favorites list view
    pub fn recipes(&self) -> Vec<Recipe> {
        self.inner.read().recipes.clone()
    }

    /// Number of favorites
    pub fn len(&self) -> usize {
        self.inner.read().ids.len()
    }

    /// Check if there are no favorites
    pub fn is_empty(&self) -> bool {
        self.inner.read().ids.is_empty()
    }

    /// Check if a mutation of `recipe_id` is in flight
    pub fn is_pending(&self, recipe_id: &str) -> bool {
        self.inner.read().ledger.is_pending(recipe_id)
    }

    /// Latest mutation state of `recipe_id`
    pub fn mutation_state(&self, recipe_id: &str) -> MutationState {
        self.inner.read().ledger.state(recipe_id)
    }

    /// Forget every favorite; in-flight results are ignored
    pub fn clear(&self) {
        self.inner.write().clear();
    }
}
