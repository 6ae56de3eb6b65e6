//! Wire types of the recipe service

use serde::{Deserialize, Deserializer, Serialize};

/// Treat an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Recipe as returned by the list endpoints
///
/// The core never edits recipes; it only tracks which ones are favorites.
/// Everything except the id is display data, so those fields accept `null`
/// and fractional numbers rather than rejecting the whole list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    /// Recipe identifier
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    /// Display name
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Cuisine label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<String>,
    /// Average rating
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    /// Cooking time in minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cook_time_minutes: Option<f64>,
    /// Difficulty label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    /// Calories per serving
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories_per_serving: Option<f64>,
    /// Free-form tags
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Recipe {
    /// Recipe with only an id and a name
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into(), ..Default::default() }
    }
}

/// Profile of the signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// User identifier
    #[serde(default, alias = "_id")]
    pub id: String,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Username
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Email address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Avatar URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Number of recipes the user published
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipes_count: Option<u32>,
    /// Number of followers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followers_count: Option<u32>,
    /// Number of saved recipes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_count: Option<u32>,
}

/// Aggregate counters shown on the profile screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProfileStats {
    /// Published recipes
    pub recipes: u32,
    /// Followers
    pub followers: u32,
    /// Saved recipes
    pub saved: u32,
}

impl UserProfile {
    /// Counters reported by the server, or `None` if it reported none of them
    pub fn stats(&self) -> Option<ProfileStats> {
        if self.recipes_count.is_none() && self.followers_count.is_none() && self.saved_count.is_none()
        {
            return None;
        }

        Some(ProfileStats {
            recipes: self.recipes_count.unwrap_or_default(),
            followers: self.followers_count.unwrap_or_default(),
            saved: self.saved_count.unwrap_or_default(),
        })
    }

    /// Best label for the user
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.username.as_deref())
            .or(self.email.as_deref())
            .unwrap_or(self.id.as_str())
    }
}

/// Login request body
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    /// Email address
    pub email: String,
    /// Password
    pub password: String,
}

/// Registration request body
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Password
    pub password: String,
}

/// Login response
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoginResponse {
    /// Bearer token for subsequent requests
    pub token: String,
    /// Profile, when the server includes it
    #[serde(default)]
    pub user: Option<UserProfile>,
}

/// `{ "data": ... }` wrapper used by the read endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct DataEnvelope<T> {
    /// Payload
    pub data: Option<T>,
}

/// Payload of the recipe list endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeList {
    /// Recipes
    #[serde(default, deserialize_with = "null_as_default")]
    pub recipes: Vec<Recipe>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipe_deserialization() {
        let json = r#"{
            "_id": "r1",
            "name": "Butter Chicken",
            "cuisine": "Indian",
            "rating": 4.9,
            "cookTimeMinutes": 40,
            "tags": ["curry"]
        }"#;

        let recipe: Recipe = serde_json::from_str(json).unwrap();
        assert_eq!(recipe.id, "r1");
        assert_eq!(recipe.cuisine.as_deref(), Some("Indian"));
        assert_eq!(recipe.cook_time_minutes, Some(40.0));
        assert_eq!(recipe.tags, vec!["curry".to_string()]);
        assert!(recipe.image.is_none());
    }

    #[test]
    fn test_recipe_tolerates_loose_display_fields() {
        let json = r#"{
            "_id": "r3",
            "name": null,
            "rating": 4,
            "cookTimeMinutes": 12.5,
            "caloriesPerServing": 310.75,
            "tags": null,
            "difficulty": null
        }"#;

        let recipe: Recipe = serde_json::from_str(json).unwrap();
        assert_eq!(recipe.id, "r3");
        assert_eq!(recipe.name, "");
        assert_eq!(recipe.rating, Some(4.0));
        assert_eq!(recipe.cook_time_minutes, Some(12.5));
        assert_eq!(recipe.calories_per_serving, Some(310.75));
        assert!(recipe.tags.is_empty());
        assert!(recipe.difficulty.is_none());

        let list: RecipeList = serde_json::from_str(
            r#"{"recipes":[{"_id":"a","tags":null},{"_id":"b","cookTimeMinutes":7.5}]}"#,
        )
        .unwrap();
        assert_eq!(list.recipes.len(), 2);
    }

    #[test]
    fn test_recipe_accepts_plain_id() {
        let recipe: Recipe = serde_json::from_str(r#"{"id":"r2","name":"Pizza"}"#).unwrap();
        assert_eq!(recipe.id, "r2");
    }

    #[test]
    fn test_login_response_without_user() {
        let response: LoginResponse = serde_json::from_str(r#"{"token":"t1"}"#).unwrap();
        assert_eq!(response.token, "t1");
        assert!(response.user.is_none());
    }

    #[test]
    fn test_profile_stats_absent() {
        let profile = UserProfile { id: "u1".to_string(), ..Default::default() };
        assert_eq!(profile.stats(), None);
        assert_eq!(profile.display_name(), "u1");
    }

    #[test]
    fn test_profile_stats_partial() {
        let profile: UserProfile =
            serde_json::from_str(r#"{"_id":"u1","name":"Sam","savedCount":7}"#).unwrap();

        assert_eq!(profile.id, "u1");
        assert_eq!(profile.display_name(), "Sam");
        assert_eq!(profile.stats(), Some(ProfileStats { recipes: 0, followers: 0, saved: 7 }));
    }

    #[test]
    fn test_profile_serialization_skips_missing_fields() {
        let profile = UserProfile {
            id: "u1".to_string(),
            email: Some("a@b.com".to_string()),
            ..Default::default()
        };

        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json, serde_json::json!({"id": "u1", "email": "a@b.com"}));
    }

    #[test]
    fn test_envelope_without_data() {
        let envelope: DataEnvelope<RecipeList> = serde_json::from_str("{}").unwrap();
        assert!(envelope.data.is_none());
    }
}
