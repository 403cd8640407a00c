//! Model selection per request.

use crate::OpenAiConfig;
use parley_core::Attachment;

/// Picks the model a request is completed with.
///
/// # Examples
///
/// ```
/// use parley_core::Attachment;
/// use parley_models::ModelSelector;
///
/// let selector = ModelSelector::new("gpt-3.5-turbo", "gpt-4-vision-preview");
/// assert_eq!(selector.select(None), "gpt-3.5-turbo");
///
/// let image = Attachment { image_url: "https://example.com/cat.png".to_string() };
/// assert_eq!(selector.select(Some(&image)), "gpt-4-vision-preview");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelector {
    default_model: String,
    vision_model: String,
}

impl ModelSelector {
    /// Selector choosing between a text model and a vision model.
    pub fn new(default_model: impl Into<String>, vision_model: impl Into<String>) -> Self {
        Self {
            default_model: default_model.into(),
            vision_model: vision_model.into(),
        }
    }

    /// Selector using the models named in provider configuration.
    pub fn from_config(config: &OpenAiConfig) -> Self {
        Self::new(config.default_model.clone(), config.vision_model.clone())
    }

    /// Model for a request with or without an attachment.
    pub fn select(&self, attachment: Option<&Attachment>) -> &str {
        match attachment {
            Some(_) => &self.vision_model,
            None => &self.default_model,
        }
    }
}
