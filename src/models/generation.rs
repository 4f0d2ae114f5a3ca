use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_WORD_COUNT: u32 = 50;
pub const MAX_WORD_COUNT: u32 = 2000;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum OutputLanguage {
    English,
    Myanmar,
}

impl OutputLanguage {
    pub fn parse(value: &str) -> Option<OutputLanguage> {
        match value.trim() {
            "English" => Some(OutputLanguage::English),
            "Myanmar" => Some(OutputLanguage::Myanmar),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputLanguage::English => "English",
            OutputLanguage::Myanmar => "Myanmar",
        }
    }
}

/// Tone of the copy: one free-text tone (simple form) or three (extended form).
#[derive(Debug, Clone, PartialEq)]
pub enum WritingStyle {
    Single(String),
    Triple([String; 3]),
}

/// Per-image notes supplied with the request.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageDescriptions {
    Single(String),
    PerImage(Vec<Option<String>>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum GenerationMode {
    Simple {
        word_count: u32,
    },
    Extended {
        content_length: Option<String>,
        copy_writing_model: Option<String>,
    },
}

/// A validated generation request. Built only through [`GenerationForm::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub topic: String,
    pub purpose: String,
    pub audience: String,
    pub writing_style: WritingStyle,
    pub output_language: OutputLanguage,
    pub mode: GenerationMode,
    pub image_descriptions: Option<ImageDescriptions>,
    pub keywords: Option<String>,
    pub cta: Option<String>,
    pub negative_constraints: Option<String>,
    pub hashtags: Option<String>,
    pub emoji: bool,
}

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Field '{0}' is required.")]
    Missing(&'static str),
    #[error("Unsupported output language '{0}'. Use 'English' or 'Myanmar'.")]
    Language(String),
    #[error("Word count must be between 50 and 2000, got {0}.")]
    WordCount(u32),
    #[error("A request cannot carry both 'wordCount' and extended-mode fields.")]
    MixedModes,
    #[error("Writing style must be one tone or exactly three tones, got {0}.")]
    WritingStyle(usize),
}

#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum WritingStyleInput {
    Single(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum ImageDescriptionsInput {
    Single(String),
    Many(Vec<Option<String>>),
}

/// The loosely-typed payload posted by the generation forms.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerationForm {
    pub topic: Option<String>,
    pub purpose: Option<String>,
    pub audience: Option<String>,
    pub writing_style: Option<WritingStyleInput>,
    pub output_language: Option<String>,
    pub word_count: Option<u32>,
    pub content_length: Option<String>,
    pub copy_writing_model: Option<String>,
    pub image_descriptions: Option<ImageDescriptionsInput>,
    pub keywords: Option<String>,
    pub cta: Option<String>,
    pub negative_constraints: Option<String>,
    pub hashtags: Option<String>,
    pub emoji: Option<bool>,
}

impl GenerationForm {
    pub fn validate(self) -> Result<GenerationRequest, ValidationError> {
        let topic = self.topic.unwrap_or_default();
        if topic.trim().is_empty() {
            return Err(ValidationError::Missing("topic"));
        }

        let language_raw = self
            .output_language
            .ok_or(ValidationError::Missing("outputLanguage"))?;
        let output_language = OutputLanguage::parse(&language_raw)
            .ok_or(ValidationError::Language(language_raw))?;

        let writing_style = match self.writing_style {
            Some(WritingStyleInput::Single(tone)) => WritingStyle::Single(tone),
            Some(WritingStyleInput::Many(tones)) => match <[String; 3]>::try_from(tones) {
                Ok(triple) => WritingStyle::Triple(triple),
                Err(tones) if tones.len() == 1 => {
                    WritingStyle::Single(tones.into_iter().next().unwrap_or_default())
                }
                Err(tones) => return Err(ValidationError::WritingStyle(tones.len())),
            },
            None => WritingStyle::Single(String::new()),
        };

        let mode = match self.word_count {
            Some(_) if self.content_length.is_some() || self.copy_writing_model.is_some() => {
                return Err(ValidationError::MixedModes)
            }
            Some(count) if !(MIN_WORD_COUNT..=MAX_WORD_COUNT).contains(&count) => {
                return Err(ValidationError::WordCount(count))
            }
            Some(count) => GenerationMode::Simple { word_count: count },
            None => GenerationMode::Extended {
                content_length: self.content_length,
                copy_writing_model: self.copy_writing_model,
            },
        };

        let image_descriptions = self.image_descriptions.map(|input| match input {
            ImageDescriptionsInput::Single(text) => ImageDescriptions::Single(text),
            ImageDescriptionsInput::Many(items) => ImageDescriptions::PerImage(items),
        });

        Ok(GenerationRequest {
            topic,
            purpose: self.purpose.unwrap_or_default(),
            audience: self.audience.unwrap_or_default(),
            writing_style,
            output_language,
            mode,
            image_descriptions,
            keywords: self.keywords,
            cta: self.cta,
            negative_constraints: self.negative_constraints,
            hashtags: self.hashtags,
            emoji: self.emoji.unwrap_or(false),
        })
    }
}
