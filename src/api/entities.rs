use axum::{
    extract::State,
    response::Json,
};
use serde::Serialize;

use crate::error::QueryError;
use crate::AppState;

#[derive(Serialize)]
pub struct MetadataResponse {
    pub metadata: String,
}

/// Expose the Northwind `$metadata` document so clients can discover which
/// entity sets exist before phrasing a question.
pub async fn get_entities(
    State(state): State<AppState>,
) -> Result<Json<MetadataResponse>, QueryError> {
    let metadata = state.odata.fetch_metadata().await?;

    Ok(Json(MetadataResponse { metadata }))
}
