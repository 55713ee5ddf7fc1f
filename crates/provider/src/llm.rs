//! Conversation client with an append-only message history

use async_trait::async_trait;
use tracing::{debug, trace};

use crate::{ChatParams, Message, Provider, ProviderError, Result};

/// Sends messages to a model and remembers the conversation
#[async_trait]
pub trait LlmClient: Send {
    /// Append `messages` to the history, request a completion over the whole
    /// history, append the reply and return its text.
    async fn complete(&mut self, messages: Vec<Message>) -> Result<String>;

    /// Every message exchanged so far, oldest first
    fn messages(&self) -> &[Message];
}

/// [`LlmClient`] backed by a chat [`Provider`]
pub struct ChatCompletion<P: Provider> {
    provider: P,
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
}

impl<P: Provider> ChatCompletion<P> {
    pub fn new(provider: P) -> Self {
        let model = provider.default_model();
        let defaults = ChatParams::default();
        Self {
            provider,
            model,
            max_tokens: defaults.max_tokens,
            temperature: defaults.temperature,
            messages: Vec::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

#[async_trait]
impl<P: Provider> LlmClient for ChatCompletion<P> {
    async fn complete(&mut self, messages: Vec<Message>) -> Result<String> {
        let mut request = self.messages.clone();
        request.extend(messages.iter().cloned());

        trace!("sending {} messages to {}", request.len(), self.model);

        let params = ChatParams {
            model: self.model.clone(),
            messages: request,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };
        let response = self.provider.chat(params).await?;

        let content = match response.content() {
            Some(content) if !content.is_empty() => content.to_string(),
            _ => return Err(ProviderError::EmptyCompletion),
        };

        debug!("completion: {} chars", content.len());

        self.messages.extend(messages);
        self.messages.push(response.message);

        Ok(content)
    }

    fn messages(&self) -> &[Message] {
        &self.messages
    }
}
