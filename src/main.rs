use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use northwind_llm_backend::{
    api,
    config::AppConfig,
    health_check,
    llm::LlmClient,
    odata::OdataClient,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize config; missing credentials are a startup error, not a
    // surprise on the first request
    let config = Arc::new(AppConfig::from_env()?);

    let providers: Vec<&str> = config
        .configured_providers()
        .iter()
        .map(|p| p.name())
        .collect();
    println!("Configured LLM providers: {}", providers.join(", "));

    // One HTTP client shared by the LLM and OData sides
    let http = reqwest::Client::new();
    let llm = LlmClient::new(http.clone());
    let odata = OdataClient::new(http, config.northwind_base_url.clone());

    let app_state = AppState { config, llm, odata };

    // Build router
    let app = Router::new()
        .route("/api/health", get(health_check))
        .route("/api/query", post(api::query::query_northwind))
        .route("/api/entities", get(api::entities::get_entities))
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
    println!("Backend server running on http://127.0.0.1:8080");

    axum::serve(listener, app).await?;

    Ok(())
}
