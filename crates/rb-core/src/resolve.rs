//! Recipe resolution: turn a [`RecipeRef`] into the recipe it points at.

use crate::classify::RecipeRef;
use crate::error::Result;
use crate::models::ResolvedRecipe;
use crate::traits::{RecipeGateway, RecipeRepo};

/// Local references read the recipe store, external ones go to the gateway.
///
/// A local id that is gone (for instance a link whose recipe was removed with
/// its author) yields `NotFound`. Gateway failures are passed through as they
/// are; nothing is retried.
pub async fn resolve(
    recipe: RecipeRef,
    recipes: &dyn RecipeRepo,
    gateway: &dyn RecipeGateway,
) -> Result<ResolvedRecipe> {
    match recipe {
        RecipeRef::Local(id) => recipes.get_recipe(id).await.map(ResolvedRecipe::Local),
        RecipeRef::External(id) => gateway.get_by_id(id).await.map(ResolvedRecipe::External),
    }
}
