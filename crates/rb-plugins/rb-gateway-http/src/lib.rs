//! # rb-gateway-http
//!
//! `RecipeGateway` backed by a Spoonacular-compatible HTTP API.
//!
//! Every call is a single request with a bounded timeout. Nothing is cached
//! and nothing is retried; failures go straight back to the caller.

use async_trait::async_trait;
use rb_core::error::{AppError, Result};
use rb_core::models::ExternalRecipe;
use rb_core::traits::RecipeGateway;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

/// Default base URL of the recipe API.
pub const DEFAULT_BASE_URL: &str = "https://api.spoonacular.com";

#[derive(Clone)]
pub struct GatewayConfig {
    /// Base URL without a trailing slash
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// `complexSearch` envelope
#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<ExternalRecipe>,
}

/// `random` envelope
#[derive(Debug, Deserialize)]
struct RandomResponse {
    recipes: Vec<ExternalRecipe>,
}

pub struct HttpRecipeGateway {
    config: GatewayConfig,
    http_client: reqwest::Client,
}

impl HttpRecipeGateway {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("http client: {e}")))?;

        Ok(Self {
            config: GatewayConfig {
                base_url: config.base_url.trim_end_matches('/').to_string(),
                ..config
            },
            http_client,
        })
    }

    /// Issues one GET and decodes the body.
    ///
    /// `missing` names the resource reported when the API answers 404.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        missing: Option<(&str, i64)>,
    ) -> Result<T> {
        let url = format!("{}{path}", self.config.base_url);
        let response = self
            .http_client
            .get(&url)
            .query(query)
            .query(&[("apiKey", self.config.api_key.as_str())])
            .send()
            .await
            .map_err(|e| {
                // the URL carries the API key
                let e = e.without_url();
                tracing::warn!(path, error = %e, "recipe API unreachable");
                AppError::ExternalLookupFailure(e.to_string())
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            if let Some((kind, id)) = missing {
                return Err(AppError::not_found(kind, id));
            }
        }
        if !status.is_success() {
            tracing::warn!(path, %status, "recipe API returned an error");
            return Err(AppError::ExternalLookupFailure(format!("HTTP {status}")));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AppError::ExternalLookupFailure(format!("JSON parse error: {}", e.without_url())))
    }
}

#[async_trait]
impl RecipeGateway for HttpRecipeGateway {
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<ExternalRecipe>> {
        let response: SearchResponse = self
            .get_json(
                "/recipes/complexSearch",
                &[("query", query.to_string()), ("number", limit.to_string())],
                None,
            )
            .await?;
        Ok(response.results)
    }

    async fn get_by_id(&self, id: i64) -> Result<ExternalRecipe> {
        self.get_json(&format!("/recipes/{id}/information"), &[], Some(("Recipe", id)))
            .await
    }

    async fn random(&self, limit: u32) -> Result<Vec<ExternalRecipe>> {
        let response: RandomResponse = self
            .get_json("/recipes/random", &[("number", limit.to_string())], None)
            .await?;
        Ok(response.recipes)
    }
}
