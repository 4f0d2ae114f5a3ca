use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

use crate::config::{AiProvider, Config};

#[derive(Error, Debug)]
pub enum AiError {
    #[error("HTTP error talking to the AI provider: {0}")]
    Http(reqwest::Error),
    #[error("AI provider returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("AI provider response contained no text")]
    EmptyResponse,
    #[error("AI provider does not accept {0} attachments")]
    UnsupportedAttachment(String),
}

// Request URLs can carry credentials, so they never reach an error message.
impl From<reqwest::Error> for AiError {
    fn from(e: reqwest::Error) -> Self {
        AiError::Http(e.without_url())
    }
}

/// One piece of a message: text, or a binary blob sent inline.
#[derive(Debug, Clone, PartialEq)]
pub enum AiPart {
    Text(String),
    InlineData { mime_type: String, data: Vec<u8> },
}

/// One user turn. Generation is single-turn, so there is no other role.
#[derive(Debug, Clone, PartialEq)]
pub struct AiMessage {
    pub parts: Vec<AiPart>,
}

impl AiMessage {
    pub fn user(parts: Vec<AiPart>) -> Self {
        AiMessage { parts }
    }
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Sends the conversation and returns the first text the model produced.
    async fn generate_text(&self, messages: &[AiMessage]) -> Result<String, AiError>;
}

/// Picks the provider named in the configuration.
pub fn build_text_generator(config: &Config) -> Result<Box<dyn TextGenerator>, AiError> {
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.ai_request_timeout_secs))
        .build()?;
    let generator: Box<dyn TextGenerator> = match config.ai_provider {
        AiProvider::Gemini => Box::new(GeminiClient {
            http,
            api_base: config.gemini_api_base.clone(),
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
        }),
        AiProvider::Groq => Box::new(GroqClient {
            http,
            api_base: config.groq_api_base.clone(),
            api_key: config.groq_api_key.clone(),
            model: config.groq_model.clone(),
        }),
    };
    Ok(generator)
}

pub struct GeminiClient {
    pub http: reqwest::Client,
    pub api_base: String,
    pub api_key: String,
    pub model: String,
}

impl GeminiClient {
    fn endpoint(&self) -> String {
        let model = self.model.trim();
        let model_path = if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{}", model)
        };
        format!("{}/{}:generateContent", self.api_base.trim_end_matches('/'), model_path)
    }

    pub fn build_contents(messages: &[AiMessage]) -> Value {
        let contents: Vec<Value> = messages
            .iter()
            .map(|message| {
                let parts: Vec<Value> = message
                    .parts
                    .iter()
                    .map(|part| match part {
                        AiPart::Text(text) => json!({ "text": text }),
                        AiPart::InlineData { mime_type, data } => json!({
                            "inlineData": {
                                "mimeType": mime_type,
                                "data": BASE64.encode(data),
                            }
                        }),
                    })
                    .collect();
                json!({ "role": "user", "parts": parts })
            })
            .collect();
        json!({ "contents": contents })
    }

    pub fn extract_text(payload: &Value) -> Option<String> {
        payload
            .get("candidates")
            .and_then(Value::as_array)?
            .iter()
            .filter_map(|candidate| candidate.pointer("/content/parts").and_then(Value::as_array))
            .flatten()
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .find(|text| !text.trim().is_empty())
            .map(str::to_string)
    }

    /// The key travels in a header, never in the URL.
    fn request(&self, messages: &[AiMessage]) -> reqwest::RequestBuilder {
        self.http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::build_contents(messages))
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate_text(&self, messages: &[AiMessage]) -> Result<String, AiError> {
        let response = self.request(messages).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Status { status: status.as_u16(), body });
        }
        let payload: Value = response.json().await?;
        Self::extract_text(&payload).ok_or(AiError::EmptyResponse)
    }
}

/// Groq speaks the OpenAI chat-completions dialect.
pub struct GroqClient {
    pub http: reqwest::Client,
    pub api_base: String,
    pub api_key: String,
    pub model: String,
}

impl GroqClient {
    pub fn build_payload(model: &str, messages: &[AiMessage]) -> Result<Value, AiError> {
        let mut out = Vec::with_capacity(messages.len());
        for message in messages {
            let mut content = Vec::with_capacity(message.parts.len());
            for part in &message.parts {
                match part {
                    AiPart::Text(text) => content.push(json!({ "type": "text", "text": text })),
                    AiPart::InlineData { mime_type, data } if mime_type.starts_with("image/") => {
                        content.push(json!({
                            "type": "image_url",
                            "image_url": {
                                "url": format!("data:{};base64,{}", mime_type, BASE64.encode(data)),
                            }
                        }))
                    }
                    AiPart::InlineData { mime_type, .. } => {
                        return Err(AiError::UnsupportedAttachment(mime_type.clone()))
                    }
                }
            }
            out.push(json!({ "role": "user", "content": content }));
        }
        Ok(json!({ "model": model, "messages": out }))
    }

    pub fn extract_text(payload: &Value) -> Option<String> {
        payload
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .filter(|text| !text.trim().is_empty())
            .map(str::to_string)
    }
}

#[async_trait]
impl TextGenerator for GroqClient {
    async fn generate_text(&self, messages: &[AiMessage]) -> Result<String, AiError> {
        let payload = Self::build_payload(&self.model, messages)?;
        let response = self
            .http
            .post(format!("{}/chat/completions", self.api_base.trim_end_matches('/')))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Status { status: status.as_u16(), body });
        }
        let payload: Value = response.json().await?;
        Self::extract_text(&payload).ok_or(AiError::EmptyResponse)
    }
}
