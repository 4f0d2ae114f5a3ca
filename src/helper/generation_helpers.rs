use std::sync::Arc;
use thiserror::Error;

use crate::clients::ai_client::{AiError, AiMessage, AiPart, TextGenerator};
use crate::clients::backend_client::BackendApi;
use crate::helper::prompt_builder::{build_prompt, build_voice_prompt};
use crate::models::generation::{GenerationRequest, OutputLanguage};
use crate::models::UserRecord;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("AI provider error: {0}")]
    Ai(#[from] AiError),
    #[error("Voice generation needs an audio clip.")]
    MissingAudio,
}

/// An uploaded file, already read into memory.
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attachments {
    pub images: Vec<Attachment>,
    pub audio: Option<Attachment>,
}

#[derive(Debug, Clone)]
pub enum GenerationInput {
    Form(GenerationRequest),
    Voice(OutputLanguage),
}

/// Who is generating: their backend token and their loaded identity.
pub struct Caller<'a> {
    pub token: &'a str,
    pub identity: &'a UserRecord,
}

pub struct GenerationService {
    ai: Arc<dyn TextGenerator>,
    backend: Arc<dyn BackendApi>,
}

impl GenerationService {
    pub fn new(ai: Arc<dyn TextGenerator>, backend: Arc<dyn BackendApi>) -> Self {
        GenerationService { ai, backend }
    }

    /// The single user message sent to the provider: prompt text, then images, then audio.
    pub fn compose(input: &GenerationInput, attachments: &Attachments) -> Result<Vec<AiMessage>, GenerationError> {
        let prompt = match input {
            GenerationInput::Form(request) => build_prompt(request),
            GenerationInput::Voice(language) => {
                if attachments.audio.is_none() {
                    return Err(GenerationError::MissingAudio);
                }
                build_voice_prompt(*language)
            }
        };

        let mut parts = vec![AiPart::Text(prompt)];
        parts.extend(attachments.images.iter().map(|image| AiPart::InlineData {
            mime_type: image.mime_type.clone(),
            data: image.data.clone(),
        }));
        if let Some(audio) = &attachments.audio {
            parts.push(AiPart::InlineData {
                mime_type: audio.mime_type.clone(),
                data: audio.data.clone(),
            });
        }
        Ok(vec![AiMessage::user(parts)])
    }

    /// Generates copy. Provider failures are returned as-is, with no retry.
    /// For trial callers the backend usage counter is bumped afterwards; a failed
    /// bump is logged and does not affect the result.
    pub async fn generate(
        &self,
        input: &GenerationInput,
        attachments: &Attachments,
        caller: &Caller<'_>,
    ) -> Result<String, GenerationError> {
        let messages = Self::compose(input, attachments)?;
        let content = self.ai.generate_text(&messages).await?;

        if caller.identity.is_trial() {
            if let Err(e) = self
                .backend
                .increment_trial_usage(caller.token, caller.identity.id)
                .await
            {
                log::error!(
                    "Failed to record trial usage for user '{}': {}",
                    caller.identity.username,
                    e
                );
            }
        }
        Ok(content)
    }
}
