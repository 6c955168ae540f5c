//! # rb-api
//!
//! The web routing and orchestration layer for recipe-board.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod session;

use axum::routing::{get, post};
use axum::Router;
use rb_auth_simple::SessionSigner;
use rb_core::Kitchen;
use std::sync::Arc;

/// State shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub kitchen: Arc<Kitchen>,
    pub signer: SessionSigner,
    /// Adds `Secure` to the session cookie; set when served over TLS.
    pub secure_cookies: bool,
}

/// Builds the application router with its middleware stack.
pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/", get(handlers::home))
        .route("/signup", get(handlers::signup_form).post(handlers::signup))
        .route("/login", get(handlers::login_form).post(handlers::login))
        .route("/logout", get(handlers::logout))
        // Users
        .route("/users/{user_id}", get(handlers::profile))
        .route("/users/delete", post(handlers::delete_user))
        .route("/users/created-recipes", get(handlers::created_recipes))
        // Search
        .route("/results", get(handlers::results))
        // Boards
        .route(
            "/users/boards/new",
            get(handlers::board_new_form).post(handlers::board_new),
        )
        .route("/boards/{board_id}", get(handlers::board_show))
        .route("/boards/{board_id}/delete", post(handlers::board_delete))
        .route("/boards/{board_id}/add/{recipe_id}", post(handlers::add_to_board))
        // Recipes
        .route(
            "/recipe/new",
            get(handlers::recipe_new_form).post(handlers::recipe_new),
        )
        .route("/recipe/{recipe_id}", get(handlers::recipe_show))
        .route(
            "/recipe/{recipe_id}/add_to_board",
            get(handlers::add_to_board_index),
        )
        .route("/recipe/created/{recipe_id}", get(handlers::recipe_created))
        .with_state(state);

    middleware::apply(routes)
}
