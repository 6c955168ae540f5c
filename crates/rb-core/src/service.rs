//! # Kitchen
//!
//! The application layer. It composes the ports and is the only thing the
//! web layer talks to. Every user-scoped operation takes the [`Caller`]
//! explicitly; there is no ambient "current user".

use crate::classify::RecipeRef;
use crate::error::{AppError, Result};
use crate::models::{Board, BoardLink, Caller, ExternalRecipe, NewUser, Recipe, ResolvedRecipe, User};
use crate::resolve::resolve;
use crate::traits::{AuthProvider, BoardRepo, LinkRepo, RecipeGateway, RecipeRepo, UserRepo};
use crate::validation::{BoardForm, LoginForm, RecipeForm, RegisterForm};
use std::sync::Arc;
use tracing::{info, warn};

/// Number of results requested from the external API for a search.
pub const SEARCH_LIMIT: u32 = 100;
/// Number of random recipes shown on the home page.
pub const FEATURED_LIMIT: u32 = 100;

/// The plugins a [`Kitchen`] is assembled from.
pub struct Ports {
    pub users: Arc<dyn UserRepo>,
    pub recipes: Arc<dyn RecipeRepo>,
    pub boards: Arc<dyn BoardRepo>,
    pub links: Arc<dyn LinkRepo>,
    pub gateway: Arc<dyn RecipeGateway>,
    pub auth: Arc<dyn AuthProvider>,
}

pub struct Kitchen {
    users: Arc<dyn UserRepo>,
    recipes: Arc<dyn RecipeRepo>,
    boards: Arc<dyn BoardRepo>,
    links: Arc<dyn LinkRepo>,
    gateway: Arc<dyn RecipeGateway>,
    auth: Arc<dyn AuthProvider>,
}

impl Kitchen {
    pub fn new(ports: Ports) -> Self {
        Self {
            users: ports.users,
            recipes: ports.recipes,
            boards: ports.boards,
            links: ports.links,
            gateway: ports.gateway,
            auth: ports.auth,
        }
    }

    // ── Accounts ────────────────────────────────────────────────────────────

    pub async fn register(&self, form: &RegisterForm) -> Result<Caller> {
        let form = form.validate()?;
        let password_hash = self.auth.hash_password(&form.password)?;

        let user = self
            .users
            .create_user(NewUser {
                username: form.username,
                email: form.email,
                password_hash,
                first_name: form.first_name,
                last_name: form.last_name,
            })
            .await?;

        info!(user_id = user.id, username = %user.username, "user registered");
        Ok(Caller::from(&user))
    }

    pub async fn authenticate(&self, form: &LoginForm) -> Result<Caller> {
        let form = form.validate()?;
        let invalid = || AppError::Unauthorized("invalid credentials".into());

        let user = self
            .users
            .find_by_username(&form.username)
            .await?
            .ok_or_else(invalid)?;

        if !self.auth.verify_password(&form.password, &user.password_hash) {
            warn!(username = %form.username, "failed login");
            return Err(invalid());
        }
        Ok(Caller::from(&user))
    }

    /// Rebuilds the caller from a verified session user id.
    pub async fn identify(&self, user_id: i64) -> Result<Caller> {
        match self.users.get_user(user_id).await {
            Ok(user) => Ok(Caller::from(&user)),
            Err(AppError::NotFound(..)) => {
                Err(AppError::Unauthorized("session user no longer exists".into()))
            }
            Err(e) => Err(e),
        }
    }

    pub async fn profile(&self, caller: &Caller, user_id: i64) -> Result<(User, Vec<Board>)> {
        let user = self.users.get_user(user_id).await?;
        let boards = self.boards.list_boards_by_owner(user.id).await?;
        tracing::debug!(caller = caller.user_id, user_id, boards = boards.len(), "profile");
        Ok((user, boards))
    }

    pub async fn delete_account(&self, caller: &Caller) -> Result<()> {
        self.users.delete_user(caller.user_id).await?;
        info!(user_id = caller.user_id, "user deleted");
        Ok(())
    }

    // ── Boards ──────────────────────────────────────────────────────────────

    pub async fn create_board(&self, caller: &Caller, form: &BoardForm) -> Result<Board> {
        let name = form.validate()?;
        let board = self.boards.create_board(caller.user_id, &name).await?;
        info!(board_id = board.id, user_id = caller.user_id, "board created");
        Ok(board)
    }

    pub async fn delete_board(&self, caller: &Caller, board_id: i64) -> Result<()> {
        let board = self.owned_board(caller, board_id).await?;
        self.boards.delete_board(board.id).await?;
        info!(board_id, user_id = caller.user_id, "board deleted");
        Ok(())
    }

    /// Puts a recipe on one of the caller's boards.
    pub async fn add_to_board(
        &self,
        caller: &Caller,
        board_id: i64,
        recipe_id: i64,
    ) -> Result<BoardLink> {
        let board = self.owned_board(caller, board_id).await?;
        let recipe = RecipeRef::from_raw(recipe_id);

        let link = self.links.add_link(board.id, recipe).await?;
        info!(board_id, %recipe, link_id = link.id, "recipe added to board");
        Ok(link)
    }

    /// The board and every recipe on it that can still be resolved.
    ///
    /// Links whose local recipe no longer exists are skipped.
    pub async fn board_recipes(
        &self,
        caller: &Caller,
        board_id: i64,
    ) -> Result<(Board, Vec<ResolvedRecipe>)> {
        let board = self.boards.get_board(board_id).await?;
        let links = self.links.list_links_by_board(board.id).await?;

        let mut recipes = Vec::with_capacity(links.len());
        for link in links {
            match resolve(link.recipe, self.recipes.as_ref(), self.gateway.as_ref()).await {
                Ok(recipe) => recipes.push(recipe),
                Err(AppError::NotFound(..)) => {
                    warn!(link_id = link.id, board_id, recipe = %link.recipe, "orphaned board link");
                }
                Err(e) => return Err(e),
            }
        }
        tracing::debug!(caller = caller.user_id, board_id, count = recipes.len(), "board view");
        Ok((board, recipes))
    }

    /// The recipe being added plus the caller's boards to choose from.
    pub async fn add_to_board_options(
        &self,
        caller: &Caller,
        recipe_id: i64,
    ) -> Result<(ResolvedRecipe, Vec<Board>)> {
        let recipe = self.recipe(recipe_id).await?;
        let boards = self.boards.list_boards_by_owner(caller.user_id).await?;
        Ok((recipe, boards))
    }

    async fn owned_board(&self, caller: &Caller, board_id: i64) -> Result<Board> {
        let board = self.boards.get_board(board_id).await?;
        if board.user_id != caller.user_id {
            warn!(board_id, user_id = caller.user_id, "board owned by another user");
            return Err(AppError::Forbidden(format!("board {board_id} belongs to another user")));
        }
        Ok(board)
    }

    // ── Recipes ─────────────────────────────────────────────────────────────

    pub async fn create_recipe(&self, caller: &Caller, form: &RecipeForm) -> Result<Recipe> {
        let recipe = form.validate()?;
        let recipe = self.recipes.create_recipe(caller.user_id, recipe).await?;
        info!(recipe_id = recipe.id, user_id = caller.user_id, "recipe created");
        Ok(recipe)
    }

    pub async fn my_recipes(&self, caller: &Caller) -> Result<Vec<Recipe>> {
        self.recipes.list_recipes_by_owner(caller.user_id).await
    }

    /// Any recipe by raw id, local or external.
    pub async fn recipe(&self, recipe_id: i64) -> Result<ResolvedRecipe> {
        resolve(
            RecipeRef::from_raw(recipe_id),
            self.recipes.as_ref(),
            self.gateway.as_ref(),
        )
        .await
    }

    /// External results first, then local recipes whose title matches.
    pub async fn search(&self, caller: &Caller, query: &str) -> Result<Vec<ResolvedRecipe>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::ValidationError("search query is required".into()));
        }

        let external = self.gateway.search(query, SEARCH_LIMIT).await?;
        let local = self.recipes.search_recipes(query).await?;
        tracing::debug!(
            caller = caller.user_id,
            query,
            external = external.len(),
            local = local.len(),
            "search"
        );

        Ok(external
            .into_iter()
            .map(ResolvedRecipe::External)
            .chain(local.into_iter().map(ResolvedRecipe::Local))
            .collect())
    }

    pub async fn featured(&self) -> Result<Vec<ExternalRecipe>> {
        self.gateway.random(FEATURED_LIMIT).await
    }
}
