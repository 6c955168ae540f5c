//! # rb-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the `Kitchen`.
//! Handlers extract the caller, call one service operation and render.

use crate::error::{render, ApiError, ApiResult};
use crate::session::{login_cookie, logout_cookie, CurrentUser, MaybeUser};
use crate::AppState;
use axum::extract::{Form, Path, Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use rb_core::classify::{classify, RecipeSource};
use rb_core::error::AppError;
use rb_core::models::{ExternalRecipe, ResolvedRecipe};
use rb_core::validation::{BoardForm, LoginForm, RecipeForm, RegisterForm};
use rb_ui::*;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
    pub notice: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
}

/// User-facing text for the `?notice=` codes used on redirects.
fn notice_text(code: Option<&str>) -> Option<&'static str> {
    match code? {
        "signed-up" => Some("Successfully signed up!"),
        "logged-in" => Some("You are successfully logged in!"),
        "logged-out" => Some("Successfully logged out."),
        "board-created" => Some("New board created!"),
        "board-deleted" => Some("Board deleted."),
        "added" => Some("Recipe added to board."),
        "already-linked" => Some("Recipe already in this board."),
        _ => None,
    }
}

fn profile_redirect(user_id: i64, notice: &str) -> Redirect {
    Redirect::to(&format!("/users/{user_id}?notice={notice}"))
}

/// Ingredient lines from an external recipe document, when it has them.
fn external_ingredients(recipe: &ExternalRecipe) -> Vec<String> {
    recipe
        .extra
        .get("extendedIngredients")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("original").and_then(|o| o.as_str()))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

// ── Home & accounts ─────────────────────────────────────────────────────────

pub async fn home(
    State(state): State<AppState>,
    MaybeUser(caller): MaybeUser,
    Query(query): Query<NoticeQuery>,
) -> ApiResult<Response> {
    let (cards, notice) = match state.kitchen.featured().await {
        Ok(recipes) => (
            recipes.iter().map(RecipeCard::from).collect::<Vec<_>>(),
            notice_text(query.notice.as_deref()),
        ),
        Err(AppError::ExternalLookupFailure(msg)) => {
            tracing::warn!("featured recipes unavailable: {}", msg);
            (Vec::new(), Some("Featured recipes are unavailable right now."))
        }
        Err(e) => return Err(e.into()),
    };

    Ok(render(HomeTemplate {
        nav: Nav { caller: caller.as_ref(), notice },
        cards: &cards,
    })?
    .into_response())
}

pub async fn signup_form(MaybeUser(caller): MaybeUser) -> ApiResult<Response> {
    Ok(render(RegisterTemplate {
        nav: Nav { caller: caller.as_ref(), notice: None },
        error: None,
        username: "",
        email: "",
        first_name: "",
        last_name: "",
    })?
    .into_response())
}

pub async fn signup(State(state): State<AppState>, Form(form): Form<RegisterForm>) -> ApiResult<Response> {
    match state.kitchen.register(&form).await {
        Ok(caller) => {
            let cookie = login_cookie(&state, caller.user_id)?;
            Ok(([(SET_COOKIE, cookie)], Redirect::to("/?notice=signed-up")).into_response())
        }
        Err(e @ (AppError::DuplicateIdentity(_) | AppError::ValidationError(_))) => {
            let message = e.to_string();
            let page = render(RegisterTemplate {
                nav: Nav::default(),
                error: Some(&message),
                username: &form.username,
                email: &form.email,
                first_name: &form.first_name,
                last_name: &form.last_name,
            })?;
            Ok((StatusCode::BAD_REQUEST, page).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn login_form(
    MaybeUser(caller): MaybeUser,
    Query(query): Query<NoticeQuery>,
) -> ApiResult<Response> {
    if let Some(caller) = caller {
        return Ok(Redirect::to(&format!("/users/{}", caller.user_id)).into_response());
    }
    Ok(render(LoginTemplate {
        nav: Nav { caller: None, notice: notice_text(query.notice.as_deref()) },
        error: None,
        username: "",
    })?
    .into_response())
}

pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> ApiResult<Response> {
    match state.kitchen.authenticate(&form).await {
        Ok(caller) => {
            let cookie = login_cookie(&state, caller.user_id)?;
            Ok(([(SET_COOKIE, cookie)], profile_redirect(caller.user_id, "logged-in")).into_response())
        }
        Err(AppError::Unauthorized(_) | AppError::ValidationError(_)) => {
            let page = render(LoginTemplate {
                nav: Nav::default(),
                error: Some("Invalid credentials"),
                username: &form.username,
            })?;
            Ok((StatusCode::UNAUTHORIZED, page).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn logout(State(state): State<AppState>) -> Response {
    ([logout_cookie(&state)], Redirect::to("/login?notice=logged-out")).into_response()
}

pub async fn profile(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(user_id): Path<i64>,
    Query(query): Query<NoticeQuery>,
) -> ApiResult<Response> {
    let (user, boards) = state.kitchen.profile(&caller, user_id).await?;
    Ok(render(ProfileTemplate {
        nav: Nav { caller: Some(&caller), notice: notice_text(query.notice.as_deref()) },
        user: &user,
        boards: &boards,
        is_self: user.id == caller.user_id,
    })?
    .into_response())
}

pub async fn delete_user(State(state): State<AppState>, CurrentUser(caller): CurrentUser) -> ApiResult<Response> {
    state.kitchen.delete_account(&caller).await?;
    Ok(([logout_cookie(&state)], Redirect::to("/signup")).into_response())
}

// ── Search ──────────────────────────────────────────────────────────────────

pub async fn results(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Response> {
    let query = query.query.unwrap_or_default();
    let hits = state.kitchen.search(&caller, &query).await?;
    let cards: Vec<RecipeCard> = hits.iter().map(RecipeCard::from).collect();

    Ok(render(ResultsTemplate {
        nav: Nav { caller: Some(&caller), notice: None },
        query: query.trim(),
        cards: &cards,
    })?
    .into_response())
}

// ── Boards ──────────────────────────────────────────────────────────────────

pub async fn board_new_form(CurrentUser(caller): CurrentUser) -> ApiResult<Response> {
    Ok(render(BoardNewTemplate {
        nav: Nav { caller: Some(&caller), notice: None },
        error: None,
        name: "",
    })?
    .into_response())
}

pub async fn board_new(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Form(form): Form<BoardForm>,
) -> ApiResult<Response> {
    match state.kitchen.create_board(&caller, &form).await {
        Ok(_) => Ok(profile_redirect(caller.user_id, "board-created").into_response()),
        Err(AppError::ValidationError(message)) => {
            let page = render(BoardNewTemplate {
                nav: Nav { caller: Some(&caller), notice: None },
                error: Some(&message),
                name: &form.name,
            })?;
            Ok((StatusCode::BAD_REQUEST, page).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn board_show(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(board_id): Path<i64>,
) -> ApiResult<Response> {
    let (board, recipes) = state.kitchen.board_recipes(&caller, board_id).await?;
    let cards: Vec<RecipeCard> = recipes.iter().map(RecipeCard::from).collect();

    Ok(render(RecipesTemplate {
        nav: Nav { caller: Some(&caller), notice: None },
        heading: &board.name,
        board_id: (board.user_id == caller.user_id).then_some(board.id),
        cards: &cards,
    })?
    .into_response())
}

pub async fn board_delete(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(board_id): Path<i64>,
) -> ApiResult<Response> {
    state.kitchen.delete_board(&caller, board_id).await?;
    Ok(profile_redirect(caller.user_id, "board-deleted").into_response())
}

pub async fn add_to_board_index(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path(recipe_id): Path<i64>,
) -> ApiResult<Response> {
    let (recipe, boards) = state.kitchen.add_to_board_options(&caller, recipe_id).await?;
    let card = RecipeCard::from(&recipe);

    Ok(render(AddToBoardTemplate {
        nav: Nav { caller: Some(&caller), notice: None },
        recipe: &card,
        boards: &boards,
    })?
    .into_response())
}

pub async fn add_to_board(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Path((board_id, recipe_id)): Path<(i64, i64)>,
) -> ApiResult<Response> {
    match state.kitchen.add_to_board(&caller, board_id, recipe_id).await {
        Ok(_) => Ok(profile_redirect(caller.user_id, "added").into_response()),
        Err(AppError::AlreadyLinked { .. }) => {
            Ok(profile_redirect(caller.user_id, "already-linked").into_response())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn created_recipes(State(state): State<AppState>, CurrentUser(caller): CurrentUser) -> ApiResult<Response> {
    let recipes = state.kitchen.my_recipes(&caller).await?;
    let cards: Vec<RecipeCard> = recipes.iter().map(RecipeCard::from).collect();

    Ok(render(RecipesTemplate {
        nav: Nav { caller: Some(&caller), notice: None },
        heading: "Your recipes",
        board_id: None,
        cards: &cards,
    })?
    .into_response())
}

// ── Recipes ─────────────────────────────────────────────────────────────────

fn recipe_page(caller: Option<&rb_core::Caller>, recipe: &ResolvedRecipe) -> ApiResult<Response> {
    let card = RecipeCard::from(recipe);
    let nav = Nav { caller, notice: None };

    let page = match recipe {
        ResolvedRecipe::Local(local) => render(RecipeTemplate {
            nav,
            recipe: &card,
            ingredients: &local.ingredients,
            instructions: Some(&local.instructions),
        })?,
        ResolvedRecipe::External(external) => {
            let ingredients = external_ingredients(external);
            render(RecipeTemplate {
                nav,
                recipe: &card,
                ingredients: &ingredients,
                instructions: external.instructions.as_deref(),
            })?
        }
    };
    Ok(page.into_response())
}

pub async fn recipe_show(
    State(state): State<AppState>,
    MaybeUser(caller): MaybeUser,
    Path(recipe_id): Path<i64>,
) -> ApiResult<Response> {
    let recipe = state.kitchen.recipe(recipe_id).await?;
    recipe_page(caller.as_ref(), &recipe)
}

/// Landing page right after creating a recipe. Only local ids are valid here.
pub async fn recipe_created(
    State(state): State<AppState>,
    MaybeUser(caller): MaybeUser,
    Path(recipe_id): Path<i64>,
) -> ApiResult<Response> {
    if classify(recipe_id) != RecipeSource::Local {
        return Err(ApiError(AppError::not_found("Recipe", recipe_id)));
    }
    let recipe = state.kitchen.recipe(recipe_id).await?;
    recipe_page(caller.as_ref(), &recipe)
}

pub async fn recipe_new_form(CurrentUser(caller): CurrentUser) -> ApiResult<Response> {
    Ok(render(RecipeNewTemplate {
        nav: Nav { caller: Some(&caller), notice: None },
        error: None,
        title: "",
        image: "",
        ingredients: "",
        instructions: "",
    })?
    .into_response())
}

pub async fn recipe_new(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    Form(form): Form<RecipeForm>,
) -> ApiResult<Response> {
    match state.kitchen.create_recipe(&caller, &form).await {
        Ok(recipe) => Ok(Redirect::to(&format!("/recipe/created/{}", recipe.id)).into_response()),
        Err(AppError::ValidationError(message)) => {
            let page = render(RecipeNewTemplate {
                nav: Nav { caller: Some(&caller), notice: None },
                error: Some(&message),
                title: &form.title,
                image: &form.image,
                ingredients: &form.ingredients,
                instructions: &form.instructions,
            })?;
            Ok((StatusCode::BAD_REQUEST, page).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_notice_codes_only() {
        assert_eq!(notice_text(Some("already-linked")), Some("Recipe already in this board."));
        assert_eq!(notice_text(Some("<script>")), None);
        assert_eq!(notice_text(None), None);
    }

    #[test]
    fn external_ingredients_read_original_lines() {
        let recipe: ExternalRecipe = serde_json::from_value(serde_json::json!({
            "id": 118854,
            "title": "Curry",
            "extendedIngredients": [
                { "original": "1 onion" },
                { "name": "no original field" },
                { "original": "2 tbsp curry paste" }
            ]
        }))
        .unwrap();
        assert_eq!(external_ingredients(&recipe), vec!["1 onion", "2 tbsp curry paste"]);
    }
}
