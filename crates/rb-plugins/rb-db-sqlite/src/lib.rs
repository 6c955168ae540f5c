//! # rb-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `rb-core` domain models. Cascading deletes are left to the schema's
//! foreign keys, which sqlx switches on for every connection.

use async_trait::async_trait;
use chrono::Utc;
use rb_core::classify::{RecipeRef, RecipeSource};
use rb_core::error::{AppError, Result};
use rb_core::models::{Board, BoardLink, NewRecipe, NewUser, Recipe, User};
use rb_core::traits::{BoardRepo, LinkRepo, RecipeRepo, UserRepo};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;

pub struct SqliteRepo {
    pool: SqlitePool,
}

impl SqliteRepo {
    /// Opens (or creates) the database at `url` and applies migrations.
    ///
    /// In-memory databases are pinned to a single, never-recycled connection;
    /// otherwise every pooled connection would see its own empty database.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new().connect_with(options).await?
        };

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!(url, "sqlite store ready");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

// Helpers for error mapping

fn db_err(e: sqlx::Error) -> AppError {
    tracing::error!(error = %e, "database error");
    AppError::Internal(e.to_string())
}

/// The constraint message for a UNIQUE violation, if that is what `e` is.
fn unique_violation(e: &sqlx::Error) -> Option<String> {
    match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => Some(db.message().to_string()),
        _ => None,
    }
}

fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

// Row mapping

fn row_to_user(row: &SqliteRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        created_at: row.get("created_at"),
    }
}

fn row_to_board(row: &SqliteRow) -> Board {
    Board {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        created_at: row.get("created_at"),
    }
}

fn row_to_recipe(row: &SqliteRow) -> Result<Recipe> {
    let id: i64 = row.get("id");
    let ingredients = serde_json::from_str(&row.get::<String, _>("ingredients"))
        .map_err(|e| AppError::Internal(format!("recipe {id} has unreadable ingredients: {e}")))?;

    Ok(Recipe {
        id,
        user_id: row.get("user_id"),
        title: row.get("title"),
        image: row.get("image"),
        ingredients,
        instructions: row.get("instructions"),
        created_at: row.get("created_at"),
    })
}

fn row_to_link(row: &SqliteRow) -> Result<BoardLink> {
    let id: i64 = row.get("id");
    let recipe_id: i64 = row.get("recipe_id");
    let source = match row.get::<String, _>("source").as_str() {
        "local" => RecipeSource::Local,
        "external" => RecipeSource::External,
        other => return Err(AppError::Internal(format!("link {id} has unknown source {other}"))),
    };
    let recipe = RecipeRef::from_parts(source, recipe_id).ok_or_else(|| {
        AppError::Internal(format!("link {id} tags recipe {recipe_id} as {}", source.as_str()))
    })?;

    Ok(BoardLink {
        id,
        board_id: row.get("board_id"),
        recipe,
        created_at: row.get("created_at"),
    })
}

#[async_trait]
impl UserRepo for SqliteRepo {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO users (username, email, password, first_name, last_name, created_at) VALUES (?, ?, ?, ?, ?, ?)"
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match unique_violation(&e) {
            Some(msg) if msg.contains("users.email") => AppError::DuplicateIdentity("email".into()),
            Some(_) => AppError::DuplicateIdentity("username".into()),
            None => db_err(e),
        })?;

        Ok(User {
            id: result.last_insert_rowid(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            first_name: user.first_name,
            last_name: user.last_name,
            created_at,
        })
    }

    async fn get_user(&self, id: i64) -> Result<User> {
        sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(|row| row_to_user(&row))
            .ok_or_else(|| AppError::not_found("User", id))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(|row| row_to_user(&row)))
    }

    async fn delete_user(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("User", id));
        }
        Ok(())
    }
}

#[async_trait]
impl RecipeRepo for SqliteRepo {
    async fn create_recipe(&self, owner_id: i64, recipe: NewRecipe) -> Result<Recipe> {
        let created_at = Utc::now();
        let image = recipe.image_or_default().to_string();
        let ingredients =
            serde_json::to_string(&recipe.ingredients).map_err(|e| AppError::Internal(e.to_string()))?;

        let result = sqlx::query(
            "INSERT INTO recipes (user_id, title, image, ingredients, instructions, created_at) VALUES (?, ?, ?, ?, ?, ?)"
        )
        .bind(owner_id)
        .bind(&recipe.title)
        .bind(&image)
        .bind(ingredients)
        .bind(&recipe.instructions)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::not_found("User", owner_id)
            } else {
                db_err(e)
            }
        })?;

        Ok(Recipe {
            id: result.last_insert_rowid(),
            user_id: owner_id,
            title: recipe.title,
            image,
            ingredients: recipe.ingredients,
            instructions: recipe.instructions,
            created_at,
        })
    }

    async fn get_recipe(&self, id: i64) -> Result<Recipe> {
        let row = sqlx::query("SELECT * FROM recipes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        match row {
            Some(row) => row_to_recipe(&row),
            None => Err(AppError::not_found("Recipe", id)),
        }
    }

    async fn list_recipes_by_owner(&self, owner_id: i64) -> Result<Vec<Recipe>> {
        sqlx::query("SELECT * FROM recipes WHERE user_id = ? ORDER BY id")
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?
            .iter()
            .map(row_to_recipe)
            .collect()
    }

    async fn search_recipes(&self, query: &str) -> Result<Vec<Recipe>> {
        sqlx::query("SELECT * FROM recipes WHERE instr(lower(title), lower(?)) > 0 ORDER BY id")
            .bind(query)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?
            .iter()
            .map(row_to_recipe)
            .collect()
    }
}

#[async_trait]
impl BoardRepo for SqliteRepo {
    async fn create_board(&self, owner_id: i64, name: &str) -> Result<Board> {
        let created_at = Utc::now();
        let result = sqlx::query("INSERT INTO boards (user_id, name, created_at) VALUES (?, ?, ?)")
            .bind(owner_id)
            .bind(name)
            .bind(created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    AppError::not_found("User", owner_id)
                } else {
                    db_err(e)
                }
            })?;

        Ok(Board {
            id: result.last_insert_rowid(),
            user_id: owner_id,
            name: name.to_string(),
            created_at,
        })
    }

    async fn get_board(&self, id: i64) -> Result<Board> {
        sqlx::query("SELECT * FROM boards WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(|row| row_to_board(&row))
            .ok_or_else(|| AppError::not_found("Board", id))
    }

    async fn list_boards_by_owner(&self, owner_id: i64) -> Result<Vec<Board>> {
        let rows = sqlx::query("SELECT * FROM boards WHERE user_id = ? ORDER BY id")
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(rows.iter().map(row_to_board).collect())
    }

    async fn delete_board(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM boards WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Board", id));
        }
        Ok(())
    }
}

#[async_trait]
impl LinkRepo for SqliteRepo {
    /// Single insert; the UNIQUE (board_id, recipe_id) constraint decides
    /// duplicates, so two racing adds cannot both succeed.
    async fn add_link(&self, board_id: i64, recipe: RecipeRef) -> Result<BoardLink> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO board_recipes (board_id, source, recipe_id, created_at) VALUES (?, ?, ?, ?)"
        )
        .bind(board_id)
        .bind(recipe.source().as_str())
        .bind(recipe.id())
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if unique_violation(&e).is_some() {
                AppError::AlreadyLinked { board_id, recipe_id: recipe.id() }
            } else if is_foreign_key_violation(&e) {
                AppError::not_found("Board", board_id)
            } else {
                db_err(e)
            }
        })?;

        Ok(BoardLink {
            id: result.last_insert_rowid(),
            board_id,
            recipe,
            created_at,
        })
    }

    async fn list_links_by_board(&self, board_id: i64) -> Result<Vec<BoardLink>> {
        sqlx::query("SELECT * FROM board_recipes WHERE board_id = ? ORDER BY id")
            .bind(board_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?
            .iter()
            .map(row_to_link)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rb_core::classify::{classify, LOCAL_ID_FLOOR};

    async fn repo() -> SqliteRepo {
        SqliteRepo::new("sqlite::memory:").await.expect("in-memory sqlite")
    }

    async fn user(repo: &SqliteRepo, username: &str) -> User {
        repo.create_user(NewUser {
            username: username.into(),
            email: format!("{username}@example.com"),
            password_hash: "$argon2id$stub".into(),
            first_name: "First".into(),
            last_name: "Last".into(),
        })
        .await
        .expect("create user")
    }

    fn milkshake() -> NewRecipe {
        NewRecipe {
            title: "Milkshake".into(),
            image: None,
            ingredients: vec!["2 Cups Ice Cream".into(), "1 Cup Milk".into()],
            instructions: "Blend together and enjoy!".into(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_external_link_is_rejected() {
        let repo = repo().await;
        let alice = user(&repo, "alice").await;
        let dinner = repo.create_board(alice.id, "Dinner").await.unwrap();

        let link = repo.add_link(dinner.id, RecipeRef::External(118_854)).await.unwrap();
        assert_eq!(link.recipe.id(), 118_854);

        let again = repo.add_link(dinner.id, RecipeRef::External(118_854)).await;
        assert!(matches!(
            again,
            Err(AppError::AlreadyLinked { recipe_id: 118_854, .. })
        ));

        let links = repo.list_links_by_board(dinner.id).await.unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].recipe, RecipeRef::External(118_854));
    }

    #[tokio::test]
    async fn test_same_recipe_on_two_boards() {
        let repo = repo().await;
        let alice = user(&repo, "alice").await;
        let dinner = repo.create_board(alice.id, "Dinner").await.unwrap();
        let lunch = repo.create_board(alice.id, "Lunch").await.unwrap();

        let a = repo.add_link(dinner.id, RecipeRef::External(118_854)).await.unwrap();
        let b = repo.add_link(lunch.id, RecipeRef::External(118_854)).await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_local_ids_start_at_floor_and_increase() {
        let repo = repo().await;
        let bob = user(&repo, "bob").await;

        let first = repo.create_recipe(bob.id, milkshake()).await.unwrap();
        let second = repo.create_recipe(bob.id, milkshake()).await.unwrap();
        assert_eq!(first.id, LOCAL_ID_FLOOR);
        assert!(second.id > first.id);
        assert_eq!(classify(first.id), RecipeSource::Local);

        let stored = repo.get_recipe(first.id).await.unwrap();
        assert_eq!(stored.title, "Milkshake");
        assert_eq!(stored.ingredients, vec!["2 Cups Ice Cream", "1 Cup Milk"]);
        assert_eq!(stored.instructions, "Blend together and enjoy!");
        assert_eq!(stored.user_id, bob.id);
        assert_eq!(stored.image, rb_core::models::DEFAULT_RECIPE_IMAGE);
    }

    #[tokio::test]
    async fn test_local_ids_are_not_reused_after_cascade() {
        let repo = repo().await;
        let bob = user(&repo, "bob").await;
        let gone = repo.create_recipe(bob.id, milkshake()).await.unwrap();
        repo.delete_user(bob.id).await.unwrap();

        let carol = user(&repo, "carol").await;
        let next = repo.create_recipe(carol.id, milkshake()).await.unwrap();
        assert!(next.id > gone.id);
        assert!(matches!(repo.get_recipe(gone.id).await, Err(AppError::NotFound(..))));
    }

    #[tokio::test]
    async fn test_delete_user_cascades() {
        let repo = repo().await;
        let alice = user(&repo, "alice").await;
        let board = repo.create_board(alice.id, "Dinner").await.unwrap();
        let recipe = repo.create_recipe(alice.id, milkshake()).await.unwrap();
        repo.add_link(board.id, RecipeRef::Local(recipe.id)).await.unwrap();
        repo.add_link(board.id, RecipeRef::External(118_854)).await.unwrap();

        repo.delete_user(alice.id).await.unwrap();

        assert!(repo.list_boards_by_owner(alice.id).await.unwrap().is_empty());
        assert!(repo.list_recipes_by_owner(alice.id).await.unwrap().is_empty());
        assert!(repo.list_links_by_board(board.id).await.unwrap().is_empty());
        assert!(matches!(repo.get_board(board.id).await, Err(AppError::NotFound(..))));
    }

    #[tokio::test]
    async fn test_delete_board_removes_links_only() {
        let repo = repo().await;
        let alice = user(&repo, "alice").await;
        let board = repo.create_board(alice.id, "Dinner").await.unwrap();
        repo.add_link(board.id, RecipeRef::External(1)).await.unwrap();

        repo.delete_board(board.id).await.unwrap();
        assert!(repo.list_links_by_board(board.id).await.unwrap().is_empty());
        assert!(repo.get_user(alice.id).await.is_ok());
        assert!(matches!(repo.delete_board(board.id).await, Err(AppError::NotFound(..))));
    }

    #[tokio::test]
    async fn test_orphaned_link_points_at_missing_recipe() {
        let repo = repo().await;
        let alice = user(&repo, "alice").await;
        let bob = user(&repo, "bob").await;
        let board = repo.create_board(alice.id, "Dinner").await.unwrap();
        let shake = repo.create_recipe(bob.id, milkshake()).await.unwrap();
        repo.add_link(board.id, RecipeRef::Local(shake.id)).await.unwrap();

        repo.delete_user(bob.id).await.unwrap();

        let links = repo.list_links_by_board(board.id).await.unwrap();
        assert_eq!(links.len(), 1);
        assert!(matches!(repo.get_recipe(shake.id).await, Err(AppError::NotFound(..))));
    }

    #[tokio::test]
    async fn test_duplicate_username_and_email() {
        let repo = repo().await;
        user(&repo, "alice").await;

        let same_name = repo
            .create_user(NewUser {
                username: "alice".into(),
                email: "other@example.com".into(),
                password_hash: "x".into(),
                first_name: "A".into(),
                last_name: "B".into(),
            })
            .await;
        assert!(matches!(same_name, Err(AppError::DuplicateIdentity(ref f)) if f == "username"));

        let same_email = repo
            .create_user(NewUser {
                username: "alice2".into(),
                email: "alice@example.com".into(),
                password_hash: "x".into(),
                first_name: "A".into(),
                last_name: "B".into(),
            })
            .await;
        assert!(matches!(same_email, Err(AppError::DuplicateIdentity(ref f)) if f == "email"));
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let repo = repo().await;
        let bob = user(&repo, "bob").await;
        repo.create_recipe(bob.id, milkshake()).await.unwrap();

        assert_eq!(repo.search_recipes("SHAKE").await.unwrap().len(), 1);
        assert!(repo.search_recipes("pasta").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_link_to_missing_board() {
        let repo = repo().await;
        let err = repo.add_link(404, RecipeRef::External(1)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(..)));
    }
}
