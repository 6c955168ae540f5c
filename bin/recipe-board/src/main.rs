//! # recipe-board
//!
//! Loads settings, builds the plugins behind the core ports and serves the
//! router.

use anyhow::Context;
use rb_api::{router, AppState};
use rb_auth_simple::{SessionSigner, SimpleAuthProvider};
use rb_config::Settings;
use rb_core::{Kitchen, Ports};
use rb_db_sqlite::SqliteRepo;
use rb_gateway_http::{GatewayConfig, HttpRecipeGateway};
use secrecy::ExposeSecret;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    init_tracing(settings.log.json);
    settings.warn_on_insecure_defaults();

    // 1. Storage
    let store = Arc::new(
        SqliteRepo::new(&settings.database.url)
            .await
            .with_context(|| format!("opening database {}", settings.database.url))?,
    );

    // 2. External recipe API
    let gateway = HttpRecipeGateway::new(GatewayConfig {
        base_url: settings.gateway.base_url.clone(),
        api_key: settings.gateway.api_key.expose_secret().to_string(),
        timeout: Duration::from_secs(settings.gateway.timeout_secs),
    })?;

    let kitchen = Kitchen::new(Ports {
        users: store.clone(),
        recipes: store.clone(),
        boards: store.clone(),
        links: store,
        gateway: Arc::new(gateway),
        auth: Arc::new(SimpleAuthProvider::new()),
    });

    let state = AppState {
        kitchen: Arc::new(kitchen),
        signer: SessionSigner::new(settings.session.secret.expose_secret().as_bytes())
            .with_max_age(Duration::from_secs(settings.session.max_age_secs)),
        secure_cookies: settings.session.secure,
    };

    let addr = settings.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!("recipe-board listening on http://{}", addr);

    axum::serve(listener, router(state)).await?;
    Ok(())
}
