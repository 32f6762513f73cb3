//! Runtime configuration.
//!
//! `Config` is built once by the binary from command-line flags and
//! environment variables and then handed to [`crate::app::run`].

use secrecy::SecretString;
use std::io;
use std::path::{Path, PathBuf};

use crate::app::tool_loop::DEFAULT_MAX_ITERATIONS;

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// System prompt used when no prompt file exists.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are Trace, a helpful AI coding assistant.";

/// Hidden message that asks the model to introduce itself at startup.
pub const GREETING_PROMPT: &str = "Hello! Please introduce yourself and your tools briefly.";

/// Application configuration.
#[derive(Debug)]
pub struct Config {
    /// Bearer token for the completion endpoint. Some local endpoints need none.
    pub api_key: Option<SecretString>,
    /// Base URL of the OpenAI-compatible endpoint, without `/chat/completions`.
    pub base_url: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Directory tools and processes run in.
    pub working_dir: PathBuf,
    /// Content of the first system message.
    pub system_prompt: String,
    /// Whether to send the hidden greeting on startup.
    pub greeting: bool,
    /// Round-trip bound of the agent loop.
    pub max_iterations: usize,
}

impl Config {
    /// Creates a configuration with defaults for everything but the model.
    #[must_use]
    pub fn new(model: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
            working_dir: working_dir.into(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            greeting: true,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// Name of the optional environment file read at startup.
pub const ENV_FILE: &str = ".env";

/// Loads variables from the environment file at `path` without overriding
/// variables that are already set.
///
/// Returns `Ok(false)` when the file does not exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_env_file(path: &Path) -> Result<bool, dotenvy::Error> {
    match dotenvy::from_path(path) {
        Ok(()) => Ok(true),
        Err(e) if e.not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

/// Reads the system prompt from `path`, falling back to the built-in prompt
/// when the file does not exist.
///
/// # Errors
///
/// Returns any I/O error other than `NotFound`.
pub fn load_system_prompt(path: &Path) -> io::Result<String> {
    match std::fs::read_to_string(path) {
        Ok(prompt) => Ok(prompt),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(DEFAULT_SYSTEM_PROMPT.to_string()),
        Err(e) => Err(e),
    }
}
