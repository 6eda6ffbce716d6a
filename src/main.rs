mod config;
mod db;
mod entities;
mod handler;
mod openapi;
mod repo;
mod schema;
mod service;
mod state;
#[cfg(test)]
mod testing;

use axum::Router;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{openapi::ApiDoc, service::fixtures::seed_accounts_from_file, state::AppState};

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "storefront_api=debug,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|value| value.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing();

    let state = AppState::new().await?;

    if let Some(path) = state.config().values().fixtures_path.clone() {
        seed_accounts_from_file(&path, state.accounts()).await?;
    }

    let app = Router::new()
        .merge(handler::health::routes())
        .merge(handler::auth::routes(state.clone()))
        .merge(handler::me::routes(state.clone()))
        .merge(handler::admin::routes(state.clone()))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http());

    let bind_addr = format!("0.0.0.0:{}", state.config().port());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(%bind_addr, "storefront-api listening");

    axum::serve(listener, app).await?;
    Ok(())
}
