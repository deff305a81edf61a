//! `InferenceService` backed by a local OpenAI-compatible server
//! (llama.cpp `llama-server`, Ollama, LM Studio).

use std::{
    sync::RwLock,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use futures::{
    channel::{mpsc, oneshot},
    FutureExt, Stream, StreamExt,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::inference::{GenerationOptions, GenerationStats, GenerationStream, InferenceService};
use crate::errors::InferenceError;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8080";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct ChatCompletionsClient {
    client: reqwest::Client,
    endpoint: String,
    model: RwLock<Option<String>>,
}

impl ChatCompletionsClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: RwLock::new(None),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn model_name(&self) -> Option<String> {
        self.model.read().ok().and_then(|guard| guard.clone())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    async fn available_models(&self) -> Result<Vec<String>, InferenceError> {
        let response = self.client.get(self.url("/v1/models")).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Api { status, body });
        }
        let listing: ModelListing = response.json().await?;
        Ok(listing.data.into_iter().map(|entry| entry.id).collect())
    }
}

#[async_trait]
impl InferenceService for ChatCompletionsClient {
    fn is_model_loaded(&self) -> bool {
        self.model
            .read()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    async fn load_model(&self, name: &str) -> Result<(), InferenceError> {
        let models = self.available_models().await?;
        if !models.iter().any(|id| id == name) {
            warn!(model = name, available = ?models, "model not offered by inference server");
            return Err(InferenceError::UnknownModel(name.to_string()));
        }
        if let Ok(mut guard) = self.model.write() {
            *guard = Some(name.to_string());
        }
        info!(model = name, endpoint = %self.endpoint, "model loaded");
        Ok(())
    }

    async fn generate_stream(
        &self,
        prompt: &str,
        options: GenerationOptions,
    ) -> Result<GenerationStream, InferenceError> {
        let model = self.model_name().ok_or(InferenceError::ModelNotLoaded)?;

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = options.system_prompt.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt.to_string(),
        });

        let request = ChatRequest {
            model,
            messages,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            stream: true,
        };

        let response = self
            .client
            .post(self.url("/v1/chat/completions"))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Api { status, body });
        }

        let (token_tx, token_rx) = mpsc::unbounded::<String>();
        let (done_tx, done_rx) = oneshot::channel();

        tokio::spawn(async move {
            let started = Instant::now();
            let outcome = pump_events(response.bytes_stream(), token_tx).await;
            let result = outcome.map(|(token_count, finish_reason)| GenerationStats {
                token_count,
                elapsed: started.elapsed(),
                finish_reason,
            });
            if let Ok(stats) = &result {
                debug!(tokens = stats.token_count, elapsed = ?stats.elapsed, "generation finished");
            }
            let _ = done_tx.send(result);
        });

        let completion = async move { done_rx.await.map_err(|_| InferenceError::Closed)? }.boxed();
        Ok(GenerationStream::new(token_rx.boxed(), completion))
    }
}

/// Reads the SSE body, forwarding content deltas until `[DONE]` or end of body.
///
/// Bytes are buffered until an event is complete, so a multibyte character
/// split across network chunks is decoded intact.
async fn pump_events<S, B, E>(
    body: S,
    tokens: mpsc::UnboundedSender<String>,
) -> Result<(usize, Option<String>), InferenceError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    InferenceError: From<E>,
{
    let mut body = std::pin::pin!(body);
    let mut buffer: Vec<u8> = Vec::new();
    let mut count = 0usize;
    let mut finish_reason = None;

    while let Some(chunk) = body.next().await {
        buffer.extend_from_slice(chunk?.as_ref());

        for event in drain_events(&mut buffer)? {
            for data in event_data(&event) {
                match parse_chunk(data)? {
                    StreamEvent::Token(text) => {
                        count += 1;
                        // Receiver may have been dropped; keep draining for the stats.
                        let _ = tokens.unbounded_send(text);
                    }
                    StreamEvent::Finished(reason) => finish_reason = Some(reason),
                    StreamEvent::Done => return Ok((count, finish_reason)),
                    StreamEvent::Ignored => {}
                }
            }
        }
    }
    Ok((count, finish_reason))
}

/// Splits off every complete (blank-line terminated) event from `buffer`.
fn drain_events(buffer: &mut Vec<u8>) -> Result<Vec<String>, InferenceError> {
    let mut events = Vec::new();
    while let Some((idx, len)) = event_boundary(buffer) {
        let raw: Vec<u8> = buffer.drain(..idx + len).take(idx).collect();
        let event = String::from_utf8(raw)
            .map_err(|err| InferenceError::Stream(format!("invalid UTF-8 in event: {err}")))?;
        events.push(event.replace("\r\n", "\n"));
    }
    Ok(events)
}

fn event_boundary(buffer: &[u8]) -> Option<(usize, usize)> {
    let lf = buffer.windows(2).position(|w| w == b"\n\n").map(|idx| (idx, 2));
    let crlf = buffer
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|idx| (idx, 4));
    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if b.0 < a.0 { b } else { a }),
        (a, b) => a.or(b),
    }
}

fn event_data(event: &str) -> impl Iterator<Item = &str> {
    event
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(str::trim)
}

#[derive(Debug, PartialEq)]
enum StreamEvent {
    Token(String),
    Finished(String),
    Done,
    Ignored,
}

fn parse_chunk(data: &str) -> Result<StreamEvent, InferenceError> {
    if data == "[DONE]" {
        return Ok(StreamEvent::Done);
    }
    if data.is_empty() {
        return Ok(StreamEvent::Ignored);
    }
    let chunk: ChatChunk = serde_json::from_str(data)
        .map_err(|err| InferenceError::Stream(format!("malformed chunk: {err}")))?;
    if let Some(message) = chunk.error.and_then(|error| error.message) {
        return Err(InferenceError::Stream(message));
    }
    let Some(choice) = chunk.choices.into_iter().next() else {
        return Ok(StreamEvent::Ignored);
    };
    match (choice.delta.and_then(|delta| delta.content), choice.finish_reason) {
        (Some(text), _) if !text.is_empty() => Ok(StreamEvent::Token(text)),
        (_, Some(reason)) => Ok(StreamEvent::Finished(reason)),
        _ => Ok(StreamEvent::Ignored),
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    error: Option<ChunkError>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Option<ChunkDelta>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkError {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelListing {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}
