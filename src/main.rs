mod catalog;
mod clock;
mod config;
mod credits;
mod db;
mod eligibility;
mod entities;
mod error;
mod identity;
mod models;
mod nominations;
mod routes;
mod store;
#[cfg(test)]
mod test_support;
mod tmdb;

use std::{sync::Arc, time::Duration};

use sea_orm::DatabaseConnection;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    clock::SystemClock, config::Config, nominations::NominationService, store::NominationStore,
    tmdb::TmdbClient,
};

pub struct AppState {
    pub config: Arc<Config>,
    pub db: DatabaseConnection,
    pub nominations: NominationService,
    pub tmdb: Arc<TmdbClient>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,movie_awards=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Arc::new(Config::from_env()?);

    let http = reqwest::Client::builder()
        .user_agent("movie-awards/0.1")
        .timeout(Duration::from_secs(30))
        .build()?;

    let db = db::connect_and_migrate(&config.database_url).await?;

    let nominations = NominationService::new(
        NominationStore::new(db.clone()),
        Arc::new(SystemClock),
        config.nominations_deadline,
    );
    if nominations.is_locked() {
        tracing::warn!(deadline = %config.nominations_deadline.0, "nominations period is closed");
    }

    let tmdb = TmdbClient::new(
        http,
        config.tmdb_access_token.clone(),
        config.tmdb_base_url.clone(),
        config.tmdb_rps,
    );

    let state = Arc::new(AppState { config: config.clone(), db, nominations, tmdb: Arc::new(tmdb) });

    let app = routes::router(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any).allow_methods(Any))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
