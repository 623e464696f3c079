use axum::{
    extract::State,
    response::Json,
};
use serde::Deserialize;

use crate::config::{OutputShape, Provider};
use crate::error::QueryError;
use crate::llm::format_prompt;
use crate::sanitize::{extract_query_object, sanitize_suffix};
use crate::AppState;

#[derive(Deserialize)]
pub struct QueryRequest {
    pub query: String,
    pub model: String, // "openai", "gemini", "claude"
}

/// The whole pipeline for one request: resolve provider, format prompt,
/// call the LLM, sanitize its output, query Northwind, pass the JSON through.
/// Any stage failing short-circuits into an error response.
pub async fn query_northwind(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<serde_json::Value>, QueryError> {
    // Reject unknown providers before doing any work
    let provider = Provider::parse(&request.model)
        .ok_or_else(|| QueryError::UnsupportedModel(request.model.clone()))?;

    let prompt = format_prompt(&request.query, state.config.output_shape);
    let raw_output = state.llm.generate(&state.config, provider, &prompt).await?;

    eprintln!("[query] raw {} output: {:?}", provider.name(), raw_output);

    let result = match state.config.output_shape {
        OutputShape::Suffix => {
            let sanitized = sanitize_suffix(&raw_output);
            eprintln!("[query] sanitized OData query: {}", sanitized);
            state.odata.query_suffix(&sanitized).await?
        }
        OutputShape::Structured => {
            let extracted = extract_query_object(&raw_output)?;
            eprintln!(
                "[query] extracted entity={} filter={}",
                extracted.entity, extracted.filter
            );
            state.odata.query_entity(&extracted).await?
        }
    };

    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::llm::LlmClient;
    use crate::odata::OdataClient;
    use std::sync::Arc;

    fn test_state() -> AppState {
        let http = reqwest::Client::new();
        AppState {
            config: Arc::new(AppConfig::default()),
            llm: LlmClient::new(http.clone()),
            odata: OdataClient::new(http, "http://localhost:1".to_string()),
        }
    }

    #[tokio::test]
    async fn test_unknown_model_rejected_before_any_call() {
        let request = QueryRequest {
            query: "customers in Germany".to_string(),
            model: "llama".to_string(),
        };

        let err = query_northwind(State(test_state()), Json(request))
            .await
            .unwrap_err();

        match err {
            QueryError::UnsupportedModel(model) => assert_eq!(model, "llama"),
            other => panic!("expected UnsupportedModel, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unconfigured_provider_rejected() {
        // Default config carries no credentials, so a valid provider name
        // still fails before any network call
        let request = QueryRequest {
            query: "customers in Germany".to_string(),
            model: "openai".to_string(),
        };

        let err = query_northwind(State(test_state()), Json(request))
            .await
            .unwrap_err();

        match err {
            QueryError::MissingCredential(provider) => assert_eq!(provider, "openai"),
            other => panic!("expected MissingCredential, got {:?}", other),
        }
    }
}
