/*
 * Responsibility
 * - Config読み込み → 依存生成 → Router 組み立て
 * - Middleware の適用 (CORS/Bearer など)
 * - axum::serve() で起動
 */
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use crate::{api, config::Config, middleware, services::auth::AuthService, state::AppState};

pub async fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    let db = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;

    let auth = Arc::new(AuthService::new(
        &config.jwt_secret,
        config.access_token_leeway_seconds,
    ));

    let state = AppState::new(db, auth);
    let app = build_router(state, &config);

    tracing::info!(addr = %config.addr, "starting server");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: AppState, config: &Config) -> Router {
    // 認可は nest 後の相対パス (/tasks, /admin, ...) で判定する
    let v1 = api::v1::routes();
    let v1 = middleware::auth::access::apply(v1, state.clone());

    let app = Router::new()
        .nest("/api/v1", v1)
        .with_state(state);

    let app = middleware::cors::apply(app, config);
    middleware::http::apply(app)
}
