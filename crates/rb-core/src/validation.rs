//! # Form Validation
//!
//! Submitted forms are checked here before anything reaches a store.
//! The stores trust what they are given.

use crate::error::{AppError, Result};
use crate::models::NewRecipe;
use serde::Deserialize;

pub const MAX_USERNAME_LEN: usize = 20;
pub const MAX_EMAIL_LEN: usize = 50;
pub const MAX_PERSON_NAME_LEN: usize = 30;
pub const MAX_BOARD_NAME_LEN: usize = 20;
pub const MIN_INGREDIENTS: usize = 2;
pub const MAX_INGREDIENTS: usize = 20;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BoardForm {
    pub name: String,
}

/// New recipe form. Ingredients are entered one per line.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeForm {
    pub title: String,
    #[serde(default)]
    pub image: String,
    pub ingredients: String,
    pub instructions: String,
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::ValidationError(format!("{field} is required")));
    }
    Ok(trimmed)
}

fn at_most<'a>(field: &str, value: &'a str, max: usize) -> Result<&'a str> {
    let value = required(field, value)?;
    if value.chars().count() > max {
        return Err(AppError::ValidationError(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(value)
}

fn email(value: &str) -> Result<&str> {
    let value = at_most("email", value, MAX_EMAIL_LEN)?;
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(AppError::ValidationError("invalid email address".into()));
    }
    Ok(value)
}

impl RegisterForm {
    /// Returns the form with surrounding whitespace trimmed. The password is
    /// left untouched.
    pub fn validate(&self) -> Result<RegisterForm> {
        Ok(RegisterForm {
            username: at_most("username", &self.username, MAX_USERNAME_LEN)?.to_string(),
            password: {
                required("password", &self.password)?;
                self.password.clone()
            },
            email: email(&self.email)?.to_string(),
            first_name: at_most("first name", &self.first_name, MAX_PERSON_NAME_LEN)?.to_string(),
            last_name: at_most("last name", &self.last_name, MAX_PERSON_NAME_LEN)?.to_string(),
        })
    }
}

impl LoginForm {
    pub fn validate(&self) -> Result<LoginForm> {
        Ok(LoginForm {
            username: at_most("username", &self.username, MAX_USERNAME_LEN)?.to_string(),
            password: {
                required("password", &self.password)?;
                self.password.clone()
            },
        })
    }
}

impl BoardForm {
    /// Returns the trimmed board name.
    pub fn validate(&self) -> Result<String> {
        Ok(at_most("board name", &self.name, MAX_BOARD_NAME_LEN)?.to_string())
    }
}

impl RecipeForm {
    pub fn validate(&self) -> Result<NewRecipe> {
        let title = required("title", &self.title)?.to_string();
        let instructions = required("instructions", &self.instructions)?.to_string();
        let ingredients = parse_ingredients(&self.ingredients)?;
        let image = Some(self.image.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(NewRecipe {
            title,
            image,
            ingredients,
            instructions,
        })
    }
}

/// Splits the ingredient text area into ordered, non-blank lines.
pub fn parse_ingredients(raw: &str) -> Result<Vec<String>> {
    let ingredients: Vec<String> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if ingredients.len() < MIN_INGREDIENTS {
        return Err(AppError::ValidationError(format!(
            "at least {MIN_INGREDIENTS} ingredients are required"
        )));
    }
    if ingredients.len() > MAX_INGREDIENTS {
        return Err(AppError::ValidationError(format!(
            "at most {MAX_INGREDIENTS} ingredients are allowed"
        )));
    }
    Ok(ingredients)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register_form() -> RegisterForm {
        RegisterForm {
            username: " alice ".into(),
            password: "hunter2".into(),
            email: "alice@example.com".into(),
            first_name: "Alice".into(),
            last_name: "Liddell".into(),
        }
    }

    #[test]
    fn register_form_trims_fields() {
        let form = register_form().validate().unwrap();
        assert_eq!(form.username, "alice");
        assert_eq!(form.password, "hunter2");
    }

    #[test]
    fn register_form_rejects_long_username_and_bad_email() {
        let mut form = register_form();
        form.username = "a".repeat(21);
        assert!(matches!(form.validate(), Err(AppError::ValidationError(_))));

        let mut form = register_form();
        form.email = "not-an-email".into();
        assert!(matches!(form.validate(), Err(AppError::ValidationError(_))));

        let mut form = register_form();
        form.email = "alice@localhost".into();
        assert!(form.validate().is_err());
    }

    #[test]
    fn board_name_is_limited_to_twenty_chars() {
        let ok = BoardForm { name: "a".repeat(20) };
        assert_eq!(ok.validate().unwrap().len(), 20);

        let too_long = BoardForm { name: "a".repeat(21) };
        assert!(matches!(too_long.validate(), Err(AppError::ValidationError(_))));

        let blank = BoardForm { name: "   ".into() };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn recipe_form_keeps_ingredient_order_and_defaults_image() {
        let form = RecipeForm {
            title: "Milkshake".into(),
            image: "  ".into(),
            ingredients: "2 Cups Ice Cream\r\n\r\n1 Cup Milk\n".into(),
            instructions: "Blend together and enjoy!".into(),
        };
        let recipe = form.validate().unwrap();
        assert_eq!(recipe.ingredients, vec!["2 Cups Ice Cream", "1 Cup Milk"]);
        assert_eq!(recipe.image, None);
        assert_eq!(recipe.image_or_default(), crate::models::DEFAULT_RECIPE_IMAGE);
    }

    #[test]
    fn ingredient_count_bounds() {
        assert!(parse_ingredients("just one").is_err());

        let twenty = (1..=20).map(|i| format!("item {i}")).collect::<Vec<_>>().join("\n");
        assert_eq!(parse_ingredients(&twenty).unwrap().len(), 20);

        let twenty_one = (1..=21).map(|i| format!("item {i}")).collect::<Vec<_>>().join("\n");
        assert!(parse_ingredients(&twenty_one).is_err());
    }
}
