pub mod api;
pub mod config;
pub mod error;
pub mod llm;
pub mod odata;
pub mod sanitize;

use axum::{
    http::StatusCode,
    response::Json,
};
use std::sync::Arc;

pub use crate::config::{AppConfig, OutputShape, Provider};
use crate::llm::LlmClient;
use crate::odata::OdataClient;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub llm: LlmClient,
    pub odata: OdataClient,
}

pub async fn health_check() -> Result<Json<serde_json::Value>, StatusCode> {
    Ok(Json(serde_json::json!({
        "status": "ok",
        "service": "northwind-llm-backend"
    })))
}
