//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use crate::classify::RecipeRef;
use crate::error::Result;
use crate::models::{Board, BoardLink, ExternalRecipe, NewRecipe, NewUser, Recipe, User};
use async_trait::async_trait;

/// Account persistence.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Fails with `DuplicateIdentity` when the username or email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User>;
    async fn get_user(&self, id: i64) -> Result<User>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
    /// Removes the account together with its boards, links and recipes.
    async fn delete_user(&self, id: i64) -> Result<()>;
}

/// Locally authored recipes.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait RecipeRepo: Send + Sync {
    /// Assigns the next id from the reserved local range.
    async fn create_recipe(&self, owner_id: i64, recipe: NewRecipe) -> Result<Recipe>;
    async fn get_recipe(&self, id: i64) -> Result<Recipe>;
    async fn list_recipes_by_owner(&self, owner_id: i64) -> Result<Vec<Recipe>>;
    /// Case-insensitive title match across every user's recipes.
    async fn search_recipes(&self, query: &str) -> Result<Vec<Recipe>>;
}

/// Board persistence.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait BoardRepo: Send + Sync {
    async fn create_board(&self, owner_id: i64, name: &str) -> Result<Board>;
    async fn get_board(&self, id: i64) -> Result<Board>;
    async fn list_boards_by_owner(&self, owner_id: i64) -> Result<Vec<Board>>;
    /// Removes the board and every link on it.
    async fn delete_board(&self, id: i64) -> Result<()>;
}

/// Board-recipe association.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait LinkRepo: Send + Sync {
    /// Fails with `AlreadyLinked` when the board already holds the recipe.
    async fn add_link(&self, board_id: i64, recipe: RecipeRef) -> Result<BoardLink>;
    async fn list_links_by_board(&self, board_id: i64) -> Result<Vec<BoardLink>>;
}

/// The third-party recipe API.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait RecipeGateway: Send + Sync {
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<ExternalRecipe>>;
    /// `NotFound` when the API does not know the id.
    async fn get_by_id(&self, id: i64) -> Result<ExternalRecipe>;
    async fn random(&self, limit: u32) -> Result<Vec<ExternalRecipe>>;
}

/// Password hashing contract.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait AuthProvider: Send + Sync {
    /// Produces a self-describing hash string with a fresh salt.
    fn hash_password(&self, password: &str) -> Result<String>;

    /// Verifies a password against a stored hash.
    fn verify_password(&self, password: &str, hash: &str) -> bool;
}
