use serde::{Deserialize, Serialize};

use crate::config::{AppConfig, OutputShape, Provider};
use crate::error::QueryError;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const CLAUDE_BASE_URL: &str = "https://api.anthropic.com/v1";

/// Build the instruction prompt for the selected output shape. The user text
/// is embedded verbatim; the surrounding instructions pin down the response
/// format so the sanitizer has something predictable to work with.
pub fn format_prompt(user_query: &str, shape: OutputShape) -> String {
    match shape {
        OutputShape::Suffix => format!(
            "You are connected to the Northwind OData service.\n\
             Translate the user's natural language query into a valid OData URL query.\n\
             \n\
             Return only the part after the base URL:\n\
             Example: If the full URL is https://services.odata.org/V4/Northwind/Northwind.svc/Customers?$filter=Country eq 'Germany',\n\
             just return: Customers?$filter=Country eq 'Germany'\n\
             \n\
             Do not return explanation or markdown.\n\
             \n\
             User query: \"{}\"",
            user_query
        ),
        OutputShape::Structured => format!(
            "You are an expert in constructing OData queries. Convert the user's question to a valid OData query for the Northwind service.\n\
             Response format:\n\
             {{\n\
               \"entity\": \"<entity>\",\n\
               \"filter\": \"<odata_filter_expression>\"\n\
             }}\n\
             User query: {}",
            user_query
        ),
    }
}

/// One client per process; all provider calls go through the shared
/// `reqwest::Client` constructed at startup.
#[derive(Clone)]
pub struct LlmClient {
    http: reqwest::Client,
}

impl LlmClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Send the prompt to the selected provider and return its raw text
    /// output. A single round-trip: no retry, no timeout beyond whatever
    /// the runtime imposes. Credential absence fails before any request.
    pub async fn generate(
        &self,
        config: &AppConfig,
        provider: Provider,
        prompt: &str,
    ) -> Result<String, QueryError> {
        let api_key = config
            .api_key(provider)
            .ok_or(QueryError::MissingCredential(provider.name()))?;
        let model = config.model_for(provider);

        let result = match provider {
            Provider::OpenAi => self.call_openai(api_key, model, prompt).await,
            Provider::Gemini => self.call_gemini(api_key, model, prompt).await,
            Provider::Claude => self.call_claude(api_key, model, prompt).await,
        };

        result.map_err(|message| QueryError::LlmFailed {
            provider: provider.name(),
            message,
        })
    }

    async fn call_openai(&self, api_key: &str, model: &str, prompt: &str) -> Result<String, String> {
        #[derive(Serialize)]
        struct Message {
            role: String,
            content: String,
        }

        #[derive(Serialize)]
        struct ChatRequest {
            model: String,
            messages: Vec<Message>,
        }

        #[derive(Deserialize)]
        struct ChoiceMessage {
            content: String,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMessage,
        }

        #[derive(Deserialize)]
        struct ChatResponse {
            choices: Vec<Choice>,
        }

        let url = format!("{}/chat/completions", OPENAI_BASE_URL);
        let request_body = ChatRequest {
            model: model.to_string(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&request_body)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(format!("OpenAI API error: {} - {}", status, error_text));
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| e.to_string())?;
        match chat_response.choices.first() {
            Some(choice) => Ok(choice.message.content.clone()),
            None => Err("No response from OpenAI API".to_string()),
        }
    }

    async fn call_gemini(&self, api_key: &str, model: &str, prompt: &str) -> Result<String, String> {
        #[derive(Serialize, Deserialize)]
        struct Part {
            text: String,
        }

        #[derive(Serialize, Deserialize)]
        struct Content {
            parts: Vec<Part>,
        }

        #[derive(Serialize)]
        struct GenerateRequest {
            contents: Vec<Content>,
        }

        #[derive(Deserialize)]
        struct Candidate {
            content: Content,
        }

        #[derive(Deserialize)]
        struct GenerateResponse {
            candidates: Vec<Candidate>,
        }

        // Gemini authenticates with the key as a query parameter
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            GEMINI_BASE_URL, model, api_key
        );
        let request_body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .http
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(format!("Gemini API error: {} - {}", status, error_text));
        }

        let generate_response: GenerateResponse =
            response.json().await.map_err(|e| e.to_string())?;
        let text = generate_response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.clone());

        match text {
            Some(text) => Ok(text),
            None => Err("No response from Gemini API".to_string()),
        }
    }

    async fn call_claude(&self, api_key: &str, model: &str, prompt: &str) -> Result<String, String> {
        #[derive(Serialize)]
        struct Message {
            role: String,
            content: String,
        }

        #[derive(Serialize)]
        struct MessagesRequest {
            model: String,
            max_tokens: u32,
            messages: Vec<Message>,
        }

        #[derive(Deserialize)]
        struct ContentBlock {
            text: String,
        }

        #[derive(Deserialize)]
        struct MessagesResponse {
            content: Vec<ContentBlock>,
        }

        let url = format!("{}/messages", CLAUDE_BASE_URL);
        let request_body = MessagesRequest {
            model: model.to_string(),
            max_tokens: 1000,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .http
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(format!("Claude API error: {} - {}", status, error_text));
        }

        let messages_response: MessagesResponse =
            response.json().await.map_err(|e| e.to_string())?;
        match messages_response.content.first() {
            Some(block) => Ok(block.text.clone()),
            None => Err("No response from Claude API".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suffix_prompt_embeds_user_query() {
        let prompt = format_prompt("customers in Germany", OutputShape::Suffix);

        assert!(prompt.contains("User query: \"customers in Germany\""));
        assert!(prompt.contains("Do not return explanation or markdown."));
    }

    #[test]
    fn test_structured_prompt_embeds_user_query() {
        let prompt = format_prompt("products over 20 dollars", OutputShape::Structured);

        assert!(prompt.contains("User query: products over 20 dollars"));
        assert!(prompt.contains("\"entity\""));
        assert!(prompt.contains("\"filter\""));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let a = format_prompt("cheap products", OutputShape::Structured);
        let b = format_prompt("cheap products", OutputShape::Structured);
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_generate_without_credential_fails_before_network() {
        let config = crate::config::AppConfig::default();
        let client = LlmClient::new(reqwest::Client::new());

        let err = client
            .generate(&config, crate::config::Provider::Gemini, "prompt")
            .await
            .unwrap_err();

        match err {
            crate::error::QueryError::MissingCredential(provider) => {
                assert_eq!(provider, "gemini");
            }
            other => panic!("expected MissingCredential, got {:?}", other),
        }
    }
}
