//! Wenyan Translator - sentence-aligned translation between Classical Chinese,
//! Modern Chinese and English
//!
//! This library composes tagged generation prompts, drives an external text
//! generator with timeout and retry discipline, and aligns the returned
//! `<sN>` segments across registers. An HTTP API exposes translation and
//! follow-up questions about a translated document.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod core;
pub mod server;

// Re-export key types for convenience
pub use crate::core::{
    client::MessagesClient,
    config::TranslatorConfig,
    errors::{ErrorCategory, TranslationError},
    generator::{GenerationEvent, GenerationOptions, Generator},
    invoker::{GenerationInvoker, RetryPolicy},
    models::{
        ConversationTurn, ModelHint, RegisterText, Role, SentenceSegment, TranslationRequest,
        TranslationResult,
    },
    orchestrator::Translator,
    registry::Register,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
