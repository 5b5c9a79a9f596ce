//! Generation invoker with per-attempt timeout and exponential backoff

use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

use crate::core::errors::{Result, TranslationError};
use crate::core::generator::{GenerationEvent, GenerationOptions, Generator};
use crate::core::models::{ModelHint, PromptPlan};

/// Retry and timeout policy for one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts before giving up, at least 1
    pub max_attempts: u32,
    /// Budget for a single attempt
    pub attempt_timeout: Duration,
    /// Wait after the first failure; doubles per failure
    pub base_backoff: Duration,
    /// Upper bound on any single wait
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            attempt_timeout: Duration::from_millis(30_000),
            base_backoff: Duration::from_millis(1_000),
            max_backoff: Duration::from_millis(5_000),
        }
    }
}

impl RetryPolicy {
    /// Wait after failed attempt `attempt` (1-based): `min(base * 2^(attempt-1), max)`
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        self.base_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}

/// Lifecycle of one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationState {
    /// Nothing sent yet
    Pending,
    /// Attempt `n` (1-based) is in flight
    Attempting(u32),
    /// An attempt produced text
    Success,
    /// Every attempt failed
    Exhausted,
}

impl InvocationState {
    /// Apply the outcome of the current attempt.
    ///
    /// `Pending` always moves to the first attempt; terminal states are sticky.
    pub fn advance(self, attempt_succeeded: bool, max_attempts: u32) -> Self {
        match self {
            InvocationState::Pending => InvocationState::Attempting(1),
            InvocationState::Attempting(_) if attempt_succeeded => InvocationState::Success,
            InvocationState::Attempting(n) if n < max_attempts => InvocationState::Attempting(n + 1),
            InvocationState::Attempting(_) => InvocationState::Exhausted,
            terminal => terminal,
        }
    }

    /// Whether no further attempts will be made
    pub fn is_terminal(&self) -> bool {
        matches!(self, InvocationState::Success | InvocationState::Exhausted)
    }
}

/// Successful invocation plus diagnostics
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Text of the successful attempt
    pub text: String,
    /// Attempts made, including the successful one
    pub attempts: u32,
    /// Waits taken between attempts
    pub backoffs: Vec<Duration>,
    /// Wall time from first send to success
    pub elapsed: Duration,
}

/// Sends prompts to a generator with timeout and retry discipline
#[derive(Clone)]
pub struct GenerationInvoker {
    generator: Arc<dyn Generator>,
    policy: RetryPolicy,
}

impl GenerationInvoker {
    /// Create a new invoker
    pub fn new(generator: Arc<dyn Generator>, policy: RetryPolicy) -> Self {
        Self { generator, policy }
    }

    /// The active policy
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run a prompt plan until one attempt yields text or attempts run out
    pub async fn invoke(&self, plan: &PromptPlan, model: ModelHint) -> Result<Invocation> {
        let options = GenerationOptions {
            system_prompt: plan.system_preamble.clone(),
            model,
        };
        let max_attempts = self.policy.max_attempts.max(1);
        let started = Instant::now();

        let mut state = InvocationState::Pending.advance(false, max_attempts);
        let mut backoffs = Vec::new();
        let mut last_error = None;

        while let InvocationState::Attempting(attempt) = state {
            info!(
                "Generation attempt {}/{} via {}",
                attempt,
                max_attempts,
                self.generator.name()
            );

            match self.attempt(&plan.instruction_text, &options).await {
                Ok(text) => {
                    info!(
                        "Generation succeeded on attempt {} ({} chars, {:?})",
                        attempt,
                        text.chars().count(),
                        started.elapsed()
                    );
                    return Ok(Invocation {
                        text,
                        attempts: attempt,
                        backoffs,
                        elapsed: started.elapsed(),
                    });
                }
                Err(e) => {
                    warn!("Generation attempt {} failed: {}", attempt, e);
                    last_error = Some(e);
                }
            }

            state = state.advance(false, max_attempts);
            if let InvocationState::Attempting(_) = state {
                let wait = self.policy.backoff_for(attempt);
                debug!("Waiting {:?} before retry", wait);
                sleep(wait).await;
                backoffs.push(wait);
            }
        }

        Err(TranslationError::GenerationFailure {
            attempts: max_attempts,
            source: Box::new(last_error.unwrap_or(TranslationError::EmptyResult)),
        })
    }

    /// One attempt raced against the per-attempt timer
    async fn attempt(&self, prompt: &str, options: &GenerationOptions) -> Result<String> {
        let budget = self.policy.attempt_timeout;
        match timeout(budget, self.collect(prompt, options)).await {
            Ok(result) => result,
            Err(_) => Err(TranslationError::AttemptTimeout {
                timeout_ms: budget.as_millis() as u64,
            }),
        }
    }

    /// Consume one exchange: first non-empty final result wins, else first assistant text
    async fn collect(&self, prompt: &str, options: &GenerationOptions) -> Result<String> {
        let mut events = self.generator.exchange(prompt, options).await?;
        let mut fallback: Option<String> = None;
        let mut count = 0usize;

        while let Some(event) = events.next().await {
            let event = event?;
            count += 1;
            match event {
                GenerationEvent::FinalResult(text) if !text.is_empty() => {
                    debug!("Got result from final event after {} events", count);
                    return Ok(text);
                }
                ref assistant @ GenerationEvent::Assistant(_) if fallback.is_none() => {
                    fallback = assistant.assistant_text().map(str::to_string);
                }
                _ => {}
            }
        }

        match fallback {
            Some(text) => {
                debug!("No final result after {} events, using assistant text", count);
                Ok(text)
            }
            None => Err(TranslationError::EmptyResult),
        }
    }
}
