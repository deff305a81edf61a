//! Seam between the coach and whatever produces text.

use std::time::Duration;

use async_trait::async_trait;
use futures::{
    future::BoxFuture,
    stream::{self, BoxStream},
    FutureExt, StreamExt,
};

use crate::errors::InferenceError;

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    pub max_tokens: u32,
    pub temperature: f32,
    pub system_prompt: Option<String>,
}

impl GenerationOptions {
    pub fn new(max_tokens: u32, temperature: f32) -> Self {
        Self {
            max_tokens,
            temperature,
            system_prompt: None,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }
}

/// Reported once generation finishes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationStats {
    pub token_count: usize,
    pub elapsed: Duration,
    pub finish_reason: Option<String>,
}

/// A running generation: text fragments as they are produced, plus a handle
/// that resolves once the producer is done.
///
/// Drain `tokens` before awaiting `completion`.
pub struct GenerationStream {
    pub tokens: BoxStream<'static, String>,
    pub completion: BoxFuture<'static, Result<GenerationStats, InferenceError>>,
}

impl GenerationStream {
    pub fn new(
        tokens: BoxStream<'static, String>,
        completion: BoxFuture<'static, Result<GenerationStats, InferenceError>>,
    ) -> Self {
        Self { tokens, completion }
    }

    /// Stream over fragments that are already known. Completes successfully.
    pub fn ready<I>(fragments: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let fragments: Vec<String> = fragments.into_iter().collect();
        let stats = GenerationStats {
            token_count: fragments.len(),
            elapsed: Duration::ZERO,
            finish_reason: Some("stop".into()),
        };
        Self::new(
            stream::iter(fragments).boxed(),
            async move { Ok(stats) }.boxed(),
        )
    }

    /// Drains the stream, calling `sink` on each fragment, then awaits completion.
    pub async fn collect_with<F>(self, mut sink: F) -> Result<(String, GenerationStats), InferenceError>
    where
        F: FnMut(&str),
    {
        let GenerationStream {
            mut tokens,
            completion,
        } = self;
        let mut text = String::new();
        while let Some(fragment) = tokens.next().await {
            sink(&fragment);
            text.push_str(&fragment);
        }
        let stats = completion.await?;
        Ok((text, stats))
    }
}

#[async_trait]
pub trait InferenceService: Send + Sync {
    fn is_model_loaded(&self) -> bool;

    async fn load_model(&self, name: &str) -> Result<(), InferenceError>;

    async fn generate_stream(
        &self,
        prompt: &str,
        options: GenerationOptions,
    ) -> Result<GenerationStream, InferenceError>;
}
