//! # Domain Models
//!
//! These structs represent the core entities of recipe-board.
//! Integer ids come from the store; local recipe ids live in the reserved
//! range described in [`crate::classify`].

use crate::classify::RecipeRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Image shown for a local recipe when the author did not supply one.
pub const DEFAULT_RECIPE_IMAGE: &str = "https://spoonacular.com/recipeImages/621204-556x370.jpg";

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string, never the raw password
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for [`User`]. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
}

/// The identity a request acts on behalf of.
///
/// Passed explicitly into every user-scoped operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: i64,
    pub username: String,
}

impl From<&User> for Caller {
    fn from(user: &User) -> Self {
        Caller {
            user_id: user.id,
            username: user.username.clone(),
        }
    }
}

/// A named collection of recipe references owned by one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A recipe authored inside recipe-board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    /// Always at or above [`crate::classify::LOCAL_ID_FLOOR`]
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub image: String,
    /// Ordered ingredient lines, 2 to 20 of them
    pub ingredients: Vec<String>,
    pub instructions: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for [`Recipe`], already validated.
#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub title: String,
    pub image: Option<String>,
    pub ingredients: Vec<String>,
    pub instructions: String,
}

impl NewRecipe {
    /// The stored image, falling back to [`DEFAULT_RECIPE_IMAGE`].
    pub fn image_or_default(&self) -> &str {
        self.image
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_RECIPE_IMAGE)
    }
}

/// Association between a board and a recipe.
///
/// `id` is a surrogate key so the same external recipe can sit in many boards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardLink {
    pub id: i64,
    pub board_id: i64,
    pub recipe: RecipeRef,
    pub created_at: DateTime<Utc>,
}

/// A recipe document as returned by the external recipe API.
///
/// Only the fields the application reads are typed; the rest of the document
/// is kept in `extra` so nothing the API sent is dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalRecipe {
    pub id: i64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Outcome of resolving a [`RecipeRef`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source", content = "recipe", rename_all = "lowercase")]
pub enum ResolvedRecipe {
    Local(Recipe),
    External(ExternalRecipe),
}

impl ResolvedRecipe {
    pub fn id(&self) -> i64 {
        match self {
            ResolvedRecipe::Local(r) => r.id,
            ResolvedRecipe::External(r) => r.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            ResolvedRecipe::Local(r) => &r.title,
            ResolvedRecipe::External(r) => &r.title,
        }
    }

    pub fn image(&self) -> &str {
        match self {
            ResolvedRecipe::Local(r) => &r.image,
            ResolvedRecipe::External(r) => r.image.as_deref().unwrap_or(DEFAULT_RECIPE_IMAGE),
        }
    }
}
