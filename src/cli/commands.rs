//! CLI command definitions and handlers

use clap::Subcommand;
use std::path::PathBuf;
use std::sync::Arc;

use crate::core::client::MessagesClient;
use crate::core::config::TranslatorConfig;
use crate::core::models::{ModelHint, TranslationRequest};
use crate::core::orchestrator::Translator;
use crate::core::registry::Register;

/// Commands for Wenyan Translator
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP API server
    Server {
        /// Bind address (default: 0.0.0.0)
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        /// Listen port (default: 3001)
        #[arg(short, long, env = "PORT", default_value_t = 3001)]
        port: u16,
    },

    /// Translate a text once and print the aligned blocks
    Translate {
        /// Text to translate
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        text: Option<String>,

        /// Read the text from a file instead
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Input language: ancient, modern or english
        #[arg(long)]
        from: Register,

        /// Output language(s); repeat for several
        #[arg(long, required = true, num_args = 1..)]
        to: Vec<Register>,

        /// Model variant: default or fast
        #[arg(short, long, default_value = "default")]
        model: ModelHint,
    },
}

/// Handle server command
pub async fn handle_server(host: String, port: u16, config: TranslatorConfig) -> anyhow::Result<()> {
    use crate::server::api::run_server;
    use tracing::info;

    info!("Starting HTTP server on {}:{}", host, port);
    println!("🚀 Server starting on http://{}:{}", host, port);

    run_server(host, port, config).await?;

    Ok(())
}

/// Handle one-shot translate command
pub async fn handle_translate(
    text: Option<String>,
    file: Option<PathBuf>,
    from: Register,
    to: Vec<Register>,
    model: ModelHint,
    config: TranslatorConfig,
) -> anyhow::Result<()> {
    use indicatif::{ProgressBar, ProgressStyle};
    use std::time::{Duration, Instant};
    use tracing::info;

    let start_time = Instant::now();

    let text = match (text, file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)?,
        (None, None) => anyhow::bail!("Either --text or --file is required"),
    };

    let request = TranslationRequest::try_new(text, Some(from), to)?.with_model_hint(model);

    let policy = config.retry_policy();
    let translator = Translator::new(Arc::new(MessagesClient::new(config)?), policy);

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message(format!(
        "Translating {} -> {}",
        from,
        request
            .output_registers()
            .iter()
            .map(|r| r.code())
            .collect::<Vec<_>>()
            .join(", ")
    ));
    pb.enable_steady_tick(Duration::from_millis(120));

    let result = translator.translate(&request).await;
    pb.finish_and_clear();
    let result = result?;

    info!("Completed in {:?}", start_time.elapsed());

    println!("{}", from.header_line());
    println!("{}\n", result.original.raw_block);
    for register in request.output_registers() {
        println!("{}", register.header_line());
        match result.translation(*register) {
            Some(block) if !block.is_empty() => {
                println!("{}", block.raw_block);
                println!("   ({} segments)\n", block.segments.len());
            }
            _ => println!("⚠️  No {} block found in response\n", register),
        }
    }

    Ok(())
}
