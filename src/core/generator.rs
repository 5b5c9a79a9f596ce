//! Generator abstraction: the external text-generation capability

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::core::errors::Result;
use crate::core::models::ModelHint;

/// A content block inside an assistant message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBlock {
    /// Plain text authored by the assistant
    Text(String),
    /// Anything else (tool calls, thinking, ...), ignored by the invoker
    Other,
}

/// Typed events yielded by one generator exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationEvent {
    /// Session / progress bookkeeping with no text payload
    Progress(String),
    /// An assistant-authored message
    Assistant(Vec<ContentBlock>),
    /// The final result of the exchange
    FinalResult(String),
}

impl GenerationEvent {
    /// First non-empty assistant text in this event, if any
    pub fn assistant_text(&self) -> Option<&str> {
        match self {
            GenerationEvent::Assistant(blocks) => blocks.iter().find_map(|block| match block {
                ContentBlock::Text(text) if !text.is_empty() => Some(text.as_str()),
                _ => None,
            }),
            _ => None,
        }
    }
}

/// Options for one exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOptions {
    /// System prompt; empty means none
    pub system_prompt: String,
    /// Model variant to use
    pub model: ModelHint,
}

/// Streamed events of one exchange
pub type EventStream = Pin<Box<dyn Stream<Item = Result<GenerationEvent>> + Send>>;

/// External text generator.
///
/// Implementations open one streaming exchange per call; the invoker owns
/// timeouts and retries.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Start an exchange for `prompt` and return its event stream
    async fn exchange(&self, prompt: &str, options: &GenerationOptions) -> Result<EventStream>;

    /// Short name used in logs
    fn name(&self) -> &str;
}
