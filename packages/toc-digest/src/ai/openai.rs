//! OpenAI implementation of the summary model.
//!
//! Talks to any chat-completions compatible endpoint.
//!
//! # Example
//!
//! ```rust,ignore
//! use toc_digest::ai::OpenAI;
//!
//! let model = OpenAI::from_env()?.with_model("gpt-4o-mini");
//! let summarizer = Summarizer::new(model);
//! ```

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result, SummarizationError, SummarizeResult};
use crate::traits::model::SummaryModel;

const SYSTEM_PROMPT: &str = "You are a summarization assistant. Summarize the user's text \
in three to five plain sentences. Only state what the text says. \
Do not add headings, lists or commentary.";

/// OpenAI-based summary model.
#[derive(Clone)]
pub struct OpenAI {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    max_input_chars: usize,
    max_tokens: u32,
}

impl OpenAI {
    /// Create a new OpenAI client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            max_input_chars: 12_000,
            max_tokens: 300,
        }
    }

    /// Create from environment variable `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| PipelineError::Config("OPENAI_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Set the chat model (default: gpt-4o-mini).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a custom base URL (for Azure, proxies, local servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the input limit reported to the summarizer (default: 12000).
    pub fn with_max_input_chars(mut self, max: usize) -> Self {
        self.max_input_chars = max.max(1);
        self
    }

    /// Set the completion token limit (default: 300).
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Get the current model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn request(&self, input: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: input.to_string(),
                },
            ],
            temperature: Some(0.0),
            max_tokens: Some(self.max_tokens),
        }
    }
}

#[async_trait]
impl SummaryModel for OpenAI {
    async fn summarize(&self, input: &str) -> SummarizeResult<String> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&self.request(input))
            .send()
            .await
            .map_err(|e| SummarizationError::Model(Box::new(e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(SummarizationError::model(format!(
                "OpenAI API error ({}): {}",
                status, error_text
            )));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| SummarizationError::Model(Box::new(e)))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| SummarizationError::model("No response from OpenAI"))
    }

    fn max_input_chars(&self) -> usize {
        self.max_input_chars
    }

    fn name(&self) -> &str {
        &self.model
    }
}

// Request/Response types

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_builder() {
        let ai = OpenAI::new("sk-test")
            .with_model("gpt-4o")
            .with_base_url("https://custom.api.com/v1/")
            .with_max_input_chars(4000);

        assert_eq!(ai.model(), "gpt-4o");
        assert_eq!(ai.base_url, "https://custom.api.com/v1");
        assert_eq!(ai.max_input_chars(), 4000);
        assert_eq!(ai.name(), "gpt-4o");
    }

    #[test]
    fn test_request_body() {
        let body = serde_json::to_value(OpenAI::new("sk-test").request("some text")).unwrap();

        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "some text");
        assert_eq!(body["max_tokens"], 300);
    }

    #[test]
    fn test_response_parsing() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"  Short summary. "}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("  Short summary. ")
        );
    }
}
