//! Completion client — the single path every prompt takes to the model.
//!
//! Each call sends exactly two messages (system, then user) at a fixed
//! temperature and returns the reply with surrounding whitespace trimmed.

use std::sync::Arc;

use ragloop_core::error::ProviderError;
use ragloop_core::message::Message;
use ragloop_core::provider::{Provider, ProviderRequest};
use tracing::debug;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// One model call's inputs. Built fresh for every call.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system_text: String,
    pub user_text: String,
    pub temperature: f32,
}

/// Wraps a [`Provider`] with the model name and sampling settings.
pub struct CompletionClient {
    provider: Arc<dyn Provider>,
    model: String,
    system_text: String,
    temperature: f32,
}

impl CompletionClient {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            system_text: DEFAULT_SYSTEM_PROMPT.into(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Replace the system message sent with every prompt.
    pub fn with_system_prompt(mut self, system_text: impl Into<String>) -> Self {
        self.system_text = system_text.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Build a prompt with this client's system message and temperature.
    pub fn prompt(&self, user_text: impl Into<String>) -> Prompt {
        Prompt {
            system_text: self.system_text.clone(),
            user_text: user_text.into(),
            temperature: self.temperature,
        }
    }

    /// Send a prompt and return the trimmed reply.
    pub async fn send(&self, prompt: Prompt) -> Result<String, ProviderError> {
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: vec![
                Message::system(prompt.system_text),
                Message::user(prompt.user_text),
            ],
            temperature: prompt.temperature,
            max_tokens: None,
        };

        let response = self.provider.complete(request).await?;
        debug!(
            provider = self.provider.name(),
            model = %response.model,
            reply_len = response.message.content.len(),
            "Completion received"
        );
        Ok(response.message.content.trim().to_string())
    }

    /// Shorthand for `send(prompt(user_text))`.
    pub async fn ask(&self, user_text: impl Into<String>) -> Result<String, ProviderError> {
        self.send(self.prompt(user_text)).await
    }
}
