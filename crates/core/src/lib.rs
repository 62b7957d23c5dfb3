//! AI-Rewrite Core Library
//!
//! This library provides the core of the AI-Rewrite utility: on a trigger it
//! captures the text selected in whatever application has focus, sends it
//! wrapped in a user-configured prompt to a chat completions API, and pastes
//! the reply over the selection.
//!
//! # Overview
//!
//! The system clipboard is the only way to move text in and out of an
//! arbitrary application, and it is a single global slot the user also
//! relies on. The library handles:
//!
//! - **Clipboard access**: read/write/clear via [`clipboard`]
//! - **Key injection**: synthetic copy and paste chords via [`input`]
//! - **Selection capture**: copy-and-read via [`capture`]
//! - **Prompt building**: per-mode templates via [`prompt`] and [`settings`]
//! - **AI Integration**: deadline-bounded chat completions via [`client`]
//! - **Orchestration**: snapshot, transform, replace, restore via [`pipeline`]
//!
//! # Quick Start
//!
//! ```ignore
//! use ai_rewrite_core::{AiRewrite, Mode};
//!
//! let app = AiRewrite::new()?;
//! app.pipeline().select_mode(Mode::B);
//!
//! // Called from the hotkey handler
//! app.pipeline().run().await;
//! ```
//!
//! # Module Structure
//!
//! - [`capture`]: Selected-text capture
//! - [`client`]: Chat completions client and transport
//! - [`clipboard`]: Clipboard bridge
//! - [`config`]: Environment configuration
//! - [`error`]: Error types and result aliases
//! - [`input`]: Key chord simulation
//! - [`mode`]: Prompt modes
//! - [`notify`]: User notifications
//! - [`pipeline`]: The orchestrator
//! - [`prompt`]: Request assembly
//! - [`settings`]: Persisted prompts and credential

pub mod capture;
pub mod client;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod input;
pub mod mode;
pub mod notify;
pub mod pipeline;
pub mod prompt;
pub mod settings;

#[cfg(test)]
mod testing;

// Re-export primary types for convenience
pub use config::Config;
pub use error::{AppError, ConfigKind, PipelineError, Result};
pub use mode::Mode;
pub use pipeline::{Pipeline, PipelineState, RunOutcome, TriggerHandler};
pub use settings::{ConfigStore, SettingsStore};

use client::TransformationClient;
use clipboard::SystemClipboard;
use input::EnigoKeys;
use notify::DesktopNotifier;
use std::sync::Arc;

/// Main entry point for the AI-Rewrite application.
///
/// Wires the real clipboard, key injection, HTTP client, settings file and
/// desktop notifications into a [`Pipeline`].
pub struct AiRewrite {
    config: Config,
    settings: SettingsStore,
    pipeline: Arc<Pipeline>,
}

impl AiRewrite {
    /// Creates an instance from the environment and the default settings file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An environment variable holds an invalid value
    /// - The config directory cannot be determined
    /// - The clipboard or input simulation cannot be initialised
    pub fn new() -> Result<Self> {
        let config = Config::load()?;
        let settings = SettingsStore::open_default()?;
        Self::with_config(config, settings)
    }

    /// Creates an instance with custom configuration and settings location.
    pub fn with_config(config: Config, settings: SettingsStore) -> Result<Self> {
        let settings = settings.with_fallback_credential(config.fallback_credential.clone());
        let clipboard = SystemClipboard::new()?;
        let keys = EnigoKeys::new()?;
        let client = TransformationClient::from_config(&config)?;

        let pipeline = Pipeline::new(
            Box::new(clipboard),
            Box::new(keys),
            Arc::new(settings.clone()),
            client,
            Arc::new(DesktopNotifier::new("AI Rewrite")),
        )
        .with_settle_delay(config.settle_delay);

        Ok(Self {
            config,
            settings,
            pipeline: Arc::new(pipeline),
        })
    }

    /// Shared handle to the pipeline, for hotkey handlers.
    pub fn pipeline(&self) -> Arc<Pipeline> {
        self.pipeline.clone()
    }

    /// Returns a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }
}

/// Initializes the library by loading environment variables.
///
/// Call this once at application startup before using any other functions.
pub fn init() {
    let _ = dotenvy::dotenv();
}
