//! Error types for the ai-rewrite-core library.
//!
//! Two families live here:
//!
//! - [`AppError`]: setup and infrastructure failures (clipboard or input
//!   initialisation, settings I/O, invalid configuration). These surface to the
//!   binary and may be fatal to it.
//! - [`PipelineError`]: the outcome of a single failed pipeline run. These are
//!   never fatal; the orchestrator turns each one into a notification.

use crate::mode::Mode;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while setting up or persisting state.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors (invalid values, unknown keys).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The system clipboard could not be opened or written.
    #[error("Clipboard error: {0}")]
    Clipboard(String),

    /// The input simulation backend could not be initialised.
    #[error("Input simulation error: {0}")]
    Input(String),

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Http(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a clipboard error with the given message.
    pub fn clipboard(msg: impl Into<String>) -> Self {
        Self::Clipboard(msg.into())
    }

    /// Creates an input simulation error with the given message.
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }
}

/// A convenient alias for Result with [`AppError`].
pub type Result<T> = std::result::Result<T, AppError>;

/// Which piece of configuration a run found missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKind {
    /// The prompt template for the given mode.
    Template(Mode),
    /// The API credential.
    Credential,
}

/// Why a pipeline run did not replace the selection.
///
/// The `Display` output is the human-readable detail shown as the
/// notification subtitle; [`PipelineError::title`] is the heading.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Select some text and press the hotkey again.")]
    NoSelection,

    #[error("{}", missing_config_message(.0))]
    ConfigMissing(ConfigKind),

    #[error("The API did not answer within {} seconds.", .0.as_secs())]
    Timeout(Duration),

    #[error("Request failed: {0}")]
    TransportError(String),

    #[error("The API answered with HTTP status {0}.")]
    HttpError(u16),

    #[error("The API response could not be parsed.")]
    InvalidResponseBody,

    #[error("The API response contained no text.")]
    MissingContent,

    #[error("Could not write the reply to the clipboard: {0}")]
    Clipboard(String),

    /// The clipboard could not be read before capture; nothing was touched.
    #[error("Could not read the clipboard, nothing was changed: {0}")]
    ClipboardUnreadable(String),
}

impl PipelineError {
    /// Short heading for the notification.
    pub fn title(&self) -> &'static str {
        match self {
            Self::NoSelection => "No selection",
            Self::ConfigMissing(ConfigKind::Template(_)) => "Prompt not configured",
            Self::ConfigMissing(ConfigKind::Credential) => "API key not configured",
            Self::Timeout(_) => "Request timed out",
            Self::TransportError(_) => "Network error",
            Self::HttpError(_) => "API error",
            Self::InvalidResponseBody => "Invalid response",
            Self::MissingContent => "Empty response",
            Self::Clipboard(_) => "Clipboard error",
            Self::ClipboardUnreadable(_) => "Clipboard unavailable",
        }
    }
}

fn missing_config_message(kind: &ConfigKind) -> String {
    match kind {
        ConfigKind::Template(mode) => format!(
            "No prompt is set for mode {mode}. Run `ai-rewrite config set {} <prompt>`.",
            mode.template_key()
        ),
        ConfigKind::Credential => {
            "No API key is set. Run `ai-rewrite config set credential <key>`.".to_string()
        }
    }
}
