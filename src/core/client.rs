//! Streaming HTTP client for the Messages API, exposed as a [`Generator`]

use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::future;
use futures::stream::BoxStream;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::core::config::TranslatorConfig;
use crate::core::errors::{Result, TranslationError};
use crate::core::generator::{
    ContentBlock, EventStream, GenerationEvent, GenerationOptions, Generator,
};
use crate::core::models::ModelHint;

/// Messages API client with streaming responses
#[derive(Debug, Clone)]
pub struct MessagesClient {
    client: reqwest::Client,
    config: Arc<TranslatorConfig>,
}

impl MessagesClient {
    /// Create a new client
    pub fn new(config: TranslatorConfig) -> Result<Self> {
        config.validate().map_err(TranslationError::config)?;

        // Per-attempt timeouts are enforced by the invoker; only bound the connect phase here
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Some(Duration::from_secs(30)))
            .pool_max_idle_per_host(10)
            .build()?;

        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    /// Create from environment
    pub fn from_env() -> Result<Self> {
        let config = TranslatorConfig::from_env().map_err(TranslationError::config)?;
        Self::new(config)
    }

    /// Model id for a hint
    pub fn model_for(&self, hint: ModelHint) -> &str {
        match hint {
            ModelHint::Default => &self.config.default_model,
            ModelHint::Fast => &self.config.fast_model,
        }
    }

    fn request_body(&self, prompt: &str, options: &GenerationOptions) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.model_for(options.model),
            "max_tokens": self.config.max_tokens,
            "stream": true,
            "messages": [{
                "role": "user",
                "content": prompt
            }]
        });

        if !options.system_prompt.is_empty() {
            if let Some(obj) = body.as_object_mut() {
                obj.insert(
                    "system".to_string(),
                    serde_json::json!(options.system_prompt),
                );
            }
        }

        body
    }
}

#[async_trait]
impl Generator for MessagesClient {
    async fn exchange(&self, prompt: &str, options: &GenerationOptions) -> Result<EventStream> {
        let body = self.request_body(prompt, options);
        debug!("Opening exchange with model {}", self.model_for(options.model));

        let response = self
            .client
            .post(&self.config.api_endpoint)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", &self.config.api_version)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| TranslationError::NetworkError {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();

            // Handle rate limiting
            if status_code == 429 {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok());
                return Err(TranslationError::RateLimitError { retry_after });
            }

            let error_text = response.text().await.unwrap_or_default();
            return Err(TranslationError::ApiError {
                status: status_code,
                message: error_text,
            });
        }

        let body: BoxStream<'static, reqwest::Result<Vec<u8>>> = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
            .boxed();

        Ok(sse_events(body))
    }

    fn name(&self) -> &str {
        "messages-api"
    }
}

/// Text accumulated while decoding one exchange
#[derive(Debug, Default)]
pub struct MessageAssembler {
    block: String,
    message: String,
}

impl MessageAssembler {
    /// Map one server-sent event onto zero or one generation event.
    ///
    /// `name` is the SSE `event:` field; the `type` inside `data` wins when present.
    pub fn on_event(&mut self, name: &str, data: &str) -> Option<Result<GenerationEvent>> {
        let json: serde_json::Value = match serde_json::from_str(data) {
            Ok(json) => json,
            Err(e) => {
                warn!("Skipping undecodable stream frame: {}", e);
                return None;
            }
        };
        let kind = json["type"].as_str().unwrap_or(name);

        match kind {
            "content_block_start" => {
                self.block.clear();
                None
            }
            "content_block_delta" => {
                if let Some(text) = json["delta"]["text"].as_str() {
                    self.block.push_str(text);
                }
                None
            }
            "content_block_stop" => {
                let text = std::mem::take(&mut self.block);
                self.message.push_str(&text);
                let block = if text.is_empty() {
                    ContentBlock::Other
                } else {
                    ContentBlock::Text(text)
                };
                Some(Ok(GenerationEvent::Assistant(vec![block])))
            }
            "message_stop" => Some(Ok(GenerationEvent::FinalResult(std::mem::take(
                &mut self.message,
            )))),
            "error" => {
                let error_type = json["error"]["type"].as_str().unwrap_or("");
                let message = json["error"]["message"]
                    .as_str()
                    .unwrap_or("stream error")
                    .to_string();
                let err = match error_type {
                    "rate_limit_error" | "overloaded_error" => {
                        TranslationError::RateLimitError { retry_after: None }
                    }
                    _ => TranslationError::InvalidResponseError { message },
                };
                Some(Err(err))
            }
            other => Some(Ok(GenerationEvent::Progress(other.to_string()))),
        }
    }
}

/// Decode the response body into generation events
fn sse_events(body: BoxStream<'static, reqwest::Result<Vec<u8>>>) -> EventStream {
    let mut assembler = MessageAssembler::default();

    let events = body.eventsource().filter_map(move |frame| {
        let event = match frame {
            Ok(frame) => assembler.on_event(&frame.event, &frame.data),
            Err(e) => Some(Err(TranslationError::NetworkError {
                message: e.to_string(),
            })),
        };
        future::ready(event)
    });

    Box::pin(events)
}
