//! Trace - terminal coding assistant

use anyhow::{Context, Result};
use clap::Parser;
use secrecy::SecretString;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trace_agent::app::{self, tool_loop::DEFAULT_MAX_ITERATIONS};
use trace_agent::types::config::{load_env_file, load_system_prompt, DEFAULT_BASE_URL, ENV_FILE};

#[derive(Parser, Debug)]
#[command(name = "trace")]
#[command(about = "Trace - terminal coding assistant")]
#[command(version)]
struct Args {
    /// API key (or set PROVIDER_API_KEY / PROVIDER_AUTH_TOKEN)
    #[arg(long, env = "PROVIDER_API_KEY", hide_env_values = true)]
    api_key: Option<SecretString>,

    /// Base URL of the OpenAI-compatible endpoint
    #[arg(long, env = "PROVIDER_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Model to use
    #[arg(short, long, env = "PROVIDER_MODEL")]
    model: String,

    /// Working directory
    #[arg(short = 'C', long, default_value = ".")]
    directory: PathBuf,

    /// System prompt file, relative to the working directory
    #[arg(long, default_value = "system_prompt.md")]
    system_prompt: PathBuf,

    /// Skip the introduction on startup
    #[arg(long)]
    no_greeting: bool,

    /// Model round trips allowed per turn
    #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS)]
    max_iterations: usize,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Log file (default: trace.log in the working directory)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn init_logging(args: &Args) -> Result<PathBuf> {
    let filter = if args.debug { "debug" } else { "info" };
    let log_path = args
        .log_file
        .clone()
        .unwrap_or_else(|| args.directory.join("trace.log"));

    // The TUI owns the terminal, so logs go to a file.
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file)),
        )
        .init();

    Ok(log_path)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Before parsing, so `.env` can supply the PROVIDER_* fallbacks.
    let env_file = load_env_file(std::path::Path::new(ENV_FILE));
    let mut args = Args::parse();
    let log_path = init_logging(&args)?;
    match env_file {
        Ok(true) => info!(file = ENV_FILE, "Loaded environment file"),
        Ok(false) => {}
        Err(e) => warn!(file = ENV_FILE, error = %e, "Failed to load environment file"),
    }

    let api_key = args.api_key.take().or_else(|| {
        std::env::var("PROVIDER_AUTH_TOKEN")
            .ok()
            .filter(|token| !token.is_empty())
            .map(Into::into)
    });

    let prompt_path = args.directory.join(&args.system_prompt);
    let system_prompt = load_system_prompt(&prompt_path)
        .with_context(|| format!("Failed to read system prompt {}", prompt_path.display()))?;

    info!(
        model = %args.model,
        base_url = %args.base_url,
        dir = %args.directory.display(),
        log = %log_path.display(),
        "Starting Trace"
    );

    app::run(app::Config {
        api_key,
        base_url: args.base_url,
        model: args.model,
        working_dir: args.directory,
        system_prompt,
        greeting: !args.no_greeting,
        max_iterations: args.max_iterations,
    })
    .await
}
