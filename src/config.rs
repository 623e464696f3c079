use serde::{Deserialize, Serialize};
use std::env;
use anyhow::{bail, Result};

pub const DEFAULT_NORTHWIND_BASE_URL: &str = "https://services.odata.org/V4/Northwind/Northwind.svc";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub northwind_base_url: String,
    pub output_shape: OutputShape,
    pub openai_model: String,
    pub gemini_model: String,
    pub claude_model: String,
    #[serde(skip_serializing)]
    pub openai_api_key: Option<String>,
    #[serde(skip_serializing)]
    pub gemini_api_key: Option<String>,
    #[serde(skip_serializing)]
    pub claude_api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Gemini,
    Claude,
}

impl Provider {
    /// Parse the `model` field of an incoming request. Unknown identifiers
    /// are rejected here, before any prompt is formatted or network call made.
    pub fn parse(s: &str) -> Option<Provider> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Some(Provider::OpenAi),
            "gemini" => Some(Provider::Gemini),
            "claude" => Some(Provider::Claude),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Gemini => "gemini",
            Provider::Claude => "claude",
        }
    }
}

/// Which shape the LLM is asked to produce: a bare OData path+query suffix,
/// or a JSON object with `entity` and `filter` fields.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputShape {
    Suffix,
    Structured,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            northwind_base_url: DEFAULT_NORTHWIND_BASE_URL.to_string(),
            output_shape: OutputShape::Structured,
            openai_model: "gpt-4".to_string(),
            gemini_model: "gemini-1.5-flash".to_string(),
            claude_model: "claude-3-sonnet-20240229".to_string(),
            openai_api_key: None,
            gemini_api_key: None,
            claude_api_key: None,
        }
    }
}

impl AppConfig {
    /// Build the configuration from process environment variables.
    /// Fails at startup if no provider credential is configured at all,
    /// so an unusable deployment is caught before serving traffic.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(url) = env::var("NORTHWIND_BASE_URL") {
            config.northwind_base_url = url.trim_end_matches('/').to_string();
        }

        if let Ok(shape) = env::var("OUTPUT_SHAPE") {
            config.output_shape = match shape.trim().to_lowercase().as_str() {
                "suffix" => OutputShape::Suffix,
                "structured" => OutputShape::Structured,
                other => bail!("Invalid OUTPUT_SHAPE '{}' (expected 'suffix' or 'structured')", other),
            };
        }

        if let Ok(model) = env::var("OPENAI_MODEL") {
            config.openai_model = model;
        }
        if let Ok(model) = env::var("GEMINI_MODEL") {
            config.gemini_model = model;
        }
        if let Ok(model) = env::var("CLAUDE_MODEL") {
            config.claude_model = model;
        }

        config.openai_api_key = env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());
        config.gemini_api_key = env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty());
        config.claude_api_key = env::var("CLAUDE_API_KEY").ok().filter(|k| !k.is_empty());

        if config.configured_providers().is_empty() {
            bail!(
                "No LLM provider credentials configured; set at least one of \
                 OPENAI_API_KEY, GEMINI_API_KEY, CLAUDE_API_KEY"
            );
        }

        Ok(config)
    }

    pub fn api_key(&self, provider: Provider) -> Option<&str> {
        match provider {
            Provider::OpenAi => self.openai_api_key.as_deref(),
            Provider::Gemini => self.gemini_api_key.as_deref(),
            Provider::Claude => self.claude_api_key.as_deref(),
        }
    }

    pub fn model_for(&self, provider: Provider) -> &str {
        match provider {
            Provider::OpenAi => &self.openai_model,
            Provider::Gemini => &self.gemini_model,
            Provider::Claude => &self.claude_model,
        }
    }

    pub fn configured_providers(&self) -> Vec<Provider> {
        [Provider::OpenAi, Provider::Gemini, Provider::Claude]
            .into_iter()
            .filter(|p| self.api_key(*p).is_some())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parse_known() {
        assert_eq!(Provider::parse("openai"), Some(Provider::OpenAi));
        assert_eq!(Provider::parse("gemini"), Some(Provider::Gemini));
        assert_eq!(Provider::parse("claude"), Some(Provider::Claude));
        // Tolerate case and surrounding whitespace from clients
        assert_eq!(Provider::parse(" Gemini "), Some(Provider::Gemini));
    }

    #[test]
    fn test_provider_parse_unknown() {
        assert_eq!(Provider::parse("mistral"), None);
        assert_eq!(Provider::parse(""), None);
        assert_eq!(Provider::parse("gpt-4"), None);
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.northwind_base_url, DEFAULT_NORTHWIND_BASE_URL);
        assert_eq!(config.output_shape, OutputShape::Structured);
        assert!(config.configured_providers().is_empty());
    }

    #[test]
    fn test_api_key_lookup() {
        let mut config = AppConfig::default();
        config.gemini_api_key = Some("test-key".to_string());

        assert_eq!(config.api_key(Provider::Gemini), Some("test-key"));
        assert_eq!(config.api_key(Provider::OpenAi), None);
        assert_eq!(config.configured_providers(), vec![Provider::Gemini]);
    }

    #[test]
    fn test_model_for_provider() {
        let config = AppConfig::default();
        assert_eq!(config.model_for(Provider::OpenAi), "gpt-4");
        assert_eq!(config.model_for(Provider::Gemini), "gemini-1.5-flash");
        assert_eq!(config.model_for(Provider::Claude), "claude-3-sonnet-20240229");
    }
}
