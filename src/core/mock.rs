/*!
 * Scripted generator for tests and offline runs.
 *
 * Each call to `exchange` pops the next scripted reply; once the script is
 * exhausted the fallback reply is repeated.
 */

use async_trait::async_trait;
use futures::stream;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::core::errors::{Result, TranslationError};
use crate::core::generator::{
    ContentBlock, EventStream, GenerationEvent, GenerationOptions, Generator,
};

/// What one scripted exchange does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    /// Emits a progress event then a final result with this text
    Text(String),
    /// Emits only an assistant message, no final result
    AssistantOnly(String),
    /// Completes without any text
    Empty,
    /// Fails to open the exchange with an upstream API error
    Fail(String),
    /// Fails to open the exchange with a rate limit error
    RateLimited,
    /// Opens the exchange but never yields anything
    Hang,
}

/// Deterministic generator driven by a reply script
#[derive(Debug)]
pub struct MockGenerator {
    script: Mutex<VecDeque<MockReply>>,
    fallback: MockReply,
    calls: AtomicUsize,
    prompts: Mutex<Vec<(String, GenerationOptions)>>,
}

impl MockGenerator {
    /// Generator that plays `script` in order, then repeats `fallback`
    pub fn scripted(script: impl IntoIterator<Item = MockReply>, fallback: MockReply) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Generator that always answers with `text`
    pub fn replying(text: impl Into<String>) -> Self {
        Self::scripted([], MockReply::Text(text.into()))
    }

    /// Generator that never yields an event
    pub fn hanging() -> Self {
        Self::scripted([], MockReply::Hang)
    }

    /// Number of exchanges opened so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts and options received, in call order
    pub fn prompts(&self) -> Vec<(String, GenerationOptions)> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn exchange(&self, prompt: &str, options: &GenerationOptions) -> Result<EventStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push((prompt.to_string(), options.clone()));

        let reply = self
            .script
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        let events: Vec<Result<GenerationEvent>> = match reply {
            MockReply::Text(text) => vec![
                Ok(GenerationEvent::Progress("system".to_string())),
                Ok(GenerationEvent::FinalResult(text)),
            ],
            MockReply::AssistantOnly(text) => vec![Ok(GenerationEvent::Assistant(vec![
                ContentBlock::Text(text),
            ]))],
            MockReply::Empty => vec![Ok(GenerationEvent::Progress("system".to_string()))],
            MockReply::Fail(message) => {
                return Err(TranslationError::ApiError {
                    status: 500,
                    message,
                })
            }
            MockReply::RateLimited => {
                return Err(TranslationError::RateLimitError { retry_after: None })
            }
            MockReply::Hang => return Ok(Box::pin(stream::pending::<Result<GenerationEvent>>())),
        };

        Ok(Box::pin(stream::iter(events)))
    }

    fn name(&self) -> &str {
        "mock"
    }
}
