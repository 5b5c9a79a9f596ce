//! Main entry point for Wenyan Translator CLI

#![forbid(unsafe_code)]

use clap::Parser;
use dotenvy::dotenv;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wenyan_translator::cli::commands::{self, Commands};
use wenyan_translator::TranslatorConfig;

/// Wenyan Translator - sentence-aligned Classical / Modern Chinese / English translation
#[derive(Parser, Debug)]
#[command(name = "wenyan-translator", version, about, long_about = None)]
struct Args {
    /// API key (optional, defaults to ANTHROPIC_API_KEY env var)
    #[arg(long)]
    api_key: Option<String>,

    /// JSON config file (overrides environment)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("wenyan_translator={},tower_http={}", log_level, log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let Some(command) = args.command else {
        println!("Please specify a command. Use --help for more information.");
        return Ok(());
    };

    let config = match &args.config {
        Some(path) => {
            let mut config = TranslatorConfig::from_file(path)?;
            // Override config with CLI args if provided
            if let Some(api_key) = args.api_key {
                config.api_key = api_key;
            }
            config
        }
        // An explicit --api-key makes ANTHROPIC_API_KEY optional
        None => TranslatorConfig::from_env_with_key(args.api_key)?,
    };
    config.validate()?;

    // Execute command
    match command {
        Commands::Server { host, port } => {
            commands::handle_server(host, port, config).await?;
        }
        Commands::Translate {
            text,
            file,
            from,
            to,
            model,
        } => {
            commands::handle_translate(text, file, from, to, model, config).await?;
        }
    }

    Ok(())
}
