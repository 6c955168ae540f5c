use askama::Template;
use rb_core::models::{Board, Caller, ExternalRecipe, Recipe, ResolvedRecipe, User};

/// Shared page chrome: who is logged in and a one-off notice.
#[derive(Clone, Copy, Default)]
pub struct Nav<'a> {
    pub caller: Option<&'a Caller>,
    pub notice: Option<&'a str>,
}

/// What a recipe list needs to show, whatever the recipe's source.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeCard {
    pub id: i64,
    pub title: String,
    pub image: String,
}

impl From<&ResolvedRecipe> for RecipeCard {
    fn from(recipe: &ResolvedRecipe) -> Self {
        RecipeCard {
            id: recipe.id(),
            title: recipe.title().to_string(),
            image: recipe.image().to_string(),
        }
    }
}

impl From<&Recipe> for RecipeCard {
    fn from(recipe: &Recipe) -> Self {
        RecipeCard {
            id: recipe.id,
            title: recipe.title.clone(),
            image: recipe.image.clone(),
        }
    }
}

impl From<&ExternalRecipe> for RecipeCard {
    fn from(recipe: &ExternalRecipe) -> Self {
        RecipeCard::from(&ResolvedRecipe::External(recipe.clone()))
    }
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate<'a> {
    pub nav: Nav<'a>,
    pub cards: &'a [RecipeCard],
}

#[derive(Template)]
#[template(path = "results.html")]
pub struct ResultsTemplate<'a> {
    pub nav: Nav<'a>,
    pub query: &'a str,
    pub cards: &'a [RecipeCard],
}

/// A board's contents, or the caller's own recipes when `board_id` is `None`.
#[derive(Template)]
#[template(path = "recipes.html")]
pub struct RecipesTemplate<'a> {
    pub nav: Nav<'a>,
    pub heading: &'a str,
    pub board_id: Option<i64>,
    pub cards: &'a [RecipeCard],
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate<'a> {
    pub nav: Nav<'a>,
    pub error: Option<&'a str>,
    pub username: &'a str,
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate<'a> {
    pub nav: Nav<'a>,
    pub error: Option<&'a str>,
    pub username: &'a str,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfileTemplate<'a> {
    pub nav: Nav<'a>,
    pub user: &'a User,
    pub boards: &'a [Board],
    pub is_self: bool,
}

#[derive(Template)]
#[template(path = "board_new.html")]
pub struct BoardNewTemplate<'a> {
    pub nav: Nav<'a>,
    pub error: Option<&'a str>,
    pub name: &'a str,
}

#[derive(Template)]
#[template(path = "add_to_board.html")]
pub struct AddToBoardTemplate<'a> {
    pub nav: Nav<'a>,
    pub recipe: &'a RecipeCard,
    pub boards: &'a [Board],
}

#[derive(Template)]
#[template(path = "recipe.html")]
pub struct RecipeTemplate<'a> {
    pub nav: Nav<'a>,
    pub recipe: &'a RecipeCard,
    pub ingredients: &'a [String],
    pub instructions: Option<&'a str>,
}

#[derive(Template)]
#[template(path = "recipe_new.html")]
pub struct RecipeNewTemplate<'a> {
    pub nav: Nav<'a>,
    pub error: Option<&'a str>,
    pub title: &'a str,
    pub image: &'a str,
    pub ingredients: &'a str,
    pub instructions: &'a str,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate<'a> {
    pub nav: Nav<'a>,
    pub status: u16,
    pub message: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cards_link_to_recipe_and_escape_titles() {
        let cards = vec![RecipeCard {
            id: 10_000_000,
            title: "Mac & <Cheese>".into(),
            image: "https://img/x.jpg".into(),
        }];
        let caller = Caller { user_id: 1, username: "alice".into() };
        let html = HomeTemplate {
            nav: Nav { caller: Some(&caller), notice: None },
            cards: &cards,
        }
        .render()
        .unwrap();

        assert!(html.contains("/recipe/10000000"));
        assert!(html.contains("/recipe/10000000/add_to_board"));
        assert!(html.contains("Mac "));
        assert!(!html.contains("<Cheese>"));
    }

    #[test]
    fn logged_in_nav_links_to_profile() {
        let caller = Caller { user_id: 42, username: "alice".into() };
        let html = ErrorTemplate {
            nav: Nav { caller: Some(&caller), notice: Some("Board deleted.") },
            status: 404,
            message: "Board not found",
        }
        .render()
        .unwrap();

        assert!(html.contains(r#"<a href="/users/42">alice</a>"#));
        assert!(html.contains("/logout"));
        assert!(!html.contains(r#"href="/login""#));
        assert!(html.contains("Board deleted."));
    }

    #[test]
    fn anonymous_nav_offers_login() {
        let html = ErrorTemplate { nav: Nav::default(), status: 404, message: "Board not found" }
            .render()
            .unwrap();
        assert!(html.contains("/login"));
        assert!(!html.contains("/logout"));
        assert!(html.contains("Board not found"));
    }

    #[test]
    fn board_page_offers_delete() {
        let html = RecipesTemplate {
            nav: Nav::default(),
            heading: "Dinner",
            board_id: Some(7),
            cards: &[],
        }
        .render()
        .unwrap();
        assert!(html.contains("/boards/7/delete"));
        assert!(html.contains("No recipes yet."));
    }
}
