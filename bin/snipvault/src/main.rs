//! # snipvault Binary
//!
//! Loads settings, wires the SQLite repositories and the JWT identity
//! provider into the engines, and serves the API.

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use sv_api::envelope::ResponseOptions;
use sv_api::handlers::AppState;
use sv_api::middleware::{access_log, cors};
use sv_auth_jwt::{AccountService, TokenConfig, TokenIssuer};
use sv_config::{LogSettings, Settings};
use sv_core::SnippetService;
use sv_db_sqlite::{SqliteSnippetRepo, SqliteUserRepo};
use tracing_subscriber::EnvFilter;

fn init_tracing(log: &LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    // The actix `Logger` emits `log` records; `init` bridges them into this subscriber.
    if log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    init_tracing(&settings.log);

    // 1. Database
    let pool = sv_db_sqlite::connect(&settings.database.url, settings.database.max_connections)
        .await
        .context("failed to init SQLite")?;
    let snippet_repo = Arc::new(SqliteSnippetRepo::new(pool.clone()));
    let user_repo = Arc::new(SqliteUserRepo::new(pool.clone()));

    // 2. Identity
    let tokens = TokenIssuer::new(&TokenConfig {
        access_secret: settings.auth.access_secret.clone(),
        refresh_secret: settings.auth.refresh_secret.clone(),
        access_ttl: chrono::Duration::seconds(settings.auth.access_ttl_secs),
        refresh_ttl: chrono::Duration::seconds(settings.auth.refresh_ttl_secs),
    });
    let accounts = Arc::new(AccountService::new(user_repo.clone(), tokens));

    // 3. Shared state
    let state = web::Data::new(AppState {
        snippets: SnippetService::new(snippet_repo, user_repo),
        accounts: accounts.clone(),
        identity: accounts,
        responses: ResponseOptions { expose_debug: !settings.is_production() },
    });

    let addr = (settings.server.host.clone(), settings.server.port);
    tracing::info!(
        host = %addr.0,
        port = addr.1,
        environment = ?settings.server.environment,
        "snipvault starting"
    );

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(cors())
            .wrap(access_log())
            .configure(sv_api::configure_routes)
    })
    .bind(addr)
    .context("failed to bind server address")?
    .run()
    .await?;

    pool.close().await;
    tracing::info!("snipvault stopped");
    Ok(())
}
