//! RecipeApi - typed endpoints of the recipe service
//!
//! Thin wrappers over [`ApiClient::send`] and [`ApiClient::send_unit`] that
//! build the request for each endpoint and unwrap the `{ "data": ... }`
//! envelope.
//!
//! # Example
//!
//! ```rust,no_run
//! use recipe_client::{ApiClient, ApiClientConfig, RecipeApi};
//! use std::sync::Arc;
//! use storage::MemoryStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ApiClient::new(ApiClientConfig::default(), Arc::new(MemoryStore::new()))?;
//!     let api = RecipeApi::new(client);
//!
//!     for recipe in api.recipes().await? {
//!         println!("{}", recipe.name);
//!     }
//!     Ok(())
//! }
//! ```

use crate::client::{ApiClient, ApiRequest};
use crate::types::{
    DataEnvelope, LoginRequest, LoginResponse, Recipe, RecipeList, RegisterRequest, UserProfile,
};
use crate::Result;

/// Typed access to the recipe service endpoints
#[derive(Debug, Clone)]
pub struct RecipeApi {
    client: ApiClient,
}

impl RecipeApi {
    /// Wrap an authenticated client
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Underlying HTTP client
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// `POST /auth/login`
    pub async fn login(
        &self,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<LoginResponse> {
        let body = LoginRequest { email: email.into(), password: password.into() };
        let request = ApiRequest::post("/auth/login").json_body(&body)?;

        Ok(self.client.send::<LoginResponse>(request).await?.data)
    }

    /// `POST /auth/register`
    ///
    /// The response body is ignored; success means the account exists and the
    /// user still has to log in.
    pub async fn register(
        &self,
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<()> {
        let body = RegisterRequest { name: name.into(), email: email.into(), password: password.into() };
        let request = ApiRequest::post("/auth/register").json_body(&body)?;

        self.client.send_unit(request).await?;
        Ok(())
    }

    /// `GET /recipes`
    pub async fn recipes(&self) -> Result<Vec<Recipe>> {
        self.recipe_list(ApiRequest::get("/recipes")).await
    }

    /// `GET /users/profile`
    pub async fn profile(&self) -> Result<Option<UserProfile>> {
        let response = self
            .client
            .send::<Option<DataEnvelope<UserProfile>>>(ApiRequest::get("/users/profile"))
            .await?;

        Ok(response.data.and_then(|envelope| envelope.data))
    }

    /// `GET /users/favorites`
    pub async fn favorites(&self) -> Result<Vec<Recipe>> {
        self.recipe_list(ApiRequest::get("/users/favorites")).await
    }

    /// `POST /users/favorites/{recipe_id}`
    pub async fn add_favorite(&self, recipe_id: &str) -> Result<()> {
        self.client.send_unit(ApiRequest::post(favorite_path(recipe_id))).await?;
        Ok(())
    }

    /// `DELETE /users/favorites/{recipe_id}`
    pub async fn remove_favorite(&self, recipe_id: &str) -> Result<()> {
        self.client.send_unit(ApiRequest::delete(favorite_path(recipe_id))).await?;
        Ok(())
    }

    async fn recipe_list(&self, request: ApiRequest) -> Result<Vec<Recipe>> {
        let response = self.client.send::<Option<DataEnvelope<RecipeList>>>(request).await?;

        Ok(response
            .data
            .and_then(|envelope| envelope.data)
            .map(|list| list.recipes)
            .unwrap_or_default())
    }
}

fn favorite_path(recipe_id: &str) -> String {
    format!("/users/favorites/{}", urlencoding::encode(recipe_id))
}
