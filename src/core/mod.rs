//! Core translation engine module

pub mod aligner;
pub mod client;
pub mod config;
pub mod errors;
pub mod generator;
pub mod invoker;
pub mod mock;
pub mod models;
pub mod orchestrator;
pub mod prompt;
pub mod registry;
