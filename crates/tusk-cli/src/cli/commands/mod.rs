//! Command implementations and shared helpers.

pub mod auth;
pub mod config;
pub mod task;

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use tusk_core::api::{ApiClient, ApiErrorKind, FlowError};
use tusk_core::config::Config;
use tusk_core::session::SessionStore;

/// Builds the API client from config and the default session store.
pub(crate) fn api_client() -> Result<ApiClient> {
    let config = Config::load()?;
    tracing::debug!("Resolved API base URL: {}", config.base_url()?);
    ApiClient::new(&config, SessionStore::new())
}

/// Prints a prompt and reads one trimmed line from stdin.
pub(crate) fn prompt_line(prompt: &str) -> Result<String> {
    print!("{prompt}");
    std::io::stdout().flush().context("Failed to flush stdout")?;

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim().to_string())
}

/// Reads a value from an optional flag, falling back to a stdin prompt.
pub(crate) fn flag_or_prompt(value: Option<String>, prompt: &str) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None => prompt_line(prompt),
    }
}

/// Turns a flow error into the message the user should see.
///
/// Authentication errors always steer to `tusk login` instead of showing a
/// generic failure; duplicate-resource errors steer there too.
pub(crate) fn render_flow_error(e: FlowError) -> anyhow::Error {
    match e.api_kind() {
        Some(ApiErrorKind::AuthRequired) => {
            anyhow::anyhow!("Your session has expired. Run `tusk login` to sign in again.")
        }
        Some(ApiErrorKind::Duplicate) => {
            anyhow::anyhow!("{e} Try `tusk login` instead.")
        }
        _ => anyhow::Error::new(e),
    }
}
