//! Shared fixtures for the rb-api integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use rb_api::AppState;
use rb_auth_simple::{SessionSigner, SimpleAuthProvider};
use rb_core::error::{AppError, Result};
use rb_core::models::ExternalRecipe;
use rb_core::traits::RecipeGateway;
use rb_core::{Kitchen, Ports};
use rb_db_sqlite::SqliteRepo;
use std::collections::HashMap;
use std::sync::Arc;

/// In-process stand-in for the external recipe API.
#[derive(Default)]
pub struct FakeGateway {
    pub recipes: HashMap<i64, ExternalRecipe>,
    pub failing: bool,
}

pub fn external(id: i64, title: &str) -> ExternalRecipe {
    ExternalRecipe {
        id,
        title: title.to_string(),
        image: Some(format!("https://img.example/{id}.jpg")),
        instructions: Some(format!("Cook the {title}.")),
        extra: Default::default(),
    }
}

impl FakeGateway {
    pub fn with(recipes: &[ExternalRecipe]) -> Self {
        Self {
            recipes: recipes.iter().map(|r| (r.id, r.clone())).collect(),
            failing: false,
        }
    }

    fn check(&self) -> Result<()> {
        if self.failing {
            return Err(AppError::ExternalLookupFailure("HTTP 503".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RecipeGateway for FakeGateway {
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<ExternalRecipe>> {
        self.check()?;
        let query = query.to_lowercase();
        let mut hits: Vec<ExternalRecipe> = self
            .recipes
            .values()
            .filter(|r| r.title.to_lowercase().contains(&query))
            .cloned()
            .collect();
        hits.sort_by_key(|r| r.id);
        hits.truncate(limit as usize);
        Ok(hits)
    }

    async fn get_by_id(&self, id: i64) -> Result<ExternalRecipe> {
        self.check()?;
        self.recipes
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found("Recipe", id))
    }

    async fn random(&self, limit: u32) -> Result<Vec<ExternalRecipe>> {
        self.check()?;
        let mut all: Vec<ExternalRecipe> = self.recipes.values().cloned().collect();
        all.sort_by_key(|r| r.id);
        all.truncate(limit as usize);
        Ok(all)
    }
}

pub async fn kitchen_with(gateway: FakeGateway) -> Kitchen {
    let store = Arc::new(SqliteRepo::new("sqlite::memory:").await.expect("in-memory sqlite"));
    Kitchen::new(Ports {
        users: store.clone(),
        recipes: store.clone(),
        boards: store.clone(),
        links: store,
        gateway: Arc::new(gateway),
        auth: Arc::new(SimpleAuthProvider::new()),
    })
}

pub async fn state_with(gateway: FakeGateway) -> AppState {
    AppState {
        kitchen: Arc::new(kitchen_with(gateway).await),
        signer: SessionSigner::new(b"integration-test-secret"),
        secure_cookies: false,
    }
}
