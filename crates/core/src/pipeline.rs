//! The capture → transform → replace pipeline.
//!
//! # State machine
//!
//! ```text
//! Idle → Capturing → Resolving → Requesting → Replacing → Restoring → Idle
//!            │            │            │            │          ▲
//!            └────────────┴────────────┴────────────┴──────────┘  (failure)
//! ```
//!
//! Every run that changed the clipboard leaves through `Restoring`, which puts
//! back the content taken before capture. Whatever happens in between, the
//! user never finds the captured selection or the generated reply left on
//! their clipboard. A run that never touched the clipboard (an unreadable
//! snapshot, or no text before and no selection after) skips `Restoring`, so
//! non-text content such as an image survives it.
//!
//! Only one run may be active. The clipboard and key devices sit behind a
//! single async mutex; a trigger that cannot take it immediately is rejected
//! rather than queued.

use crate::capture::{Captured, SelectionCapture};
use crate::client::TransformationClient;
use crate::clipboard::ClipboardBridge;
use crate::config::DEFAULT_SETTLE;
use crate::error::PipelineError;
use crate::input::{Chord, KeySimulator};
use crate::mode::{ActiveMode, Mode};
use crate::notify::Notifier;
use crate::prompt;
use crate::settings::{ConfigSnapshot, ConfigStore};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;

/// Where the pipeline currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Capturing,
    Resolving,
    Requesting,
    Replacing,
    Restoring,
}

/// How a trigger ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The selection was replaced with the reply.
    Replaced,
    /// The run aborted; the user has been notified.
    Failed(PipelineError),
    /// Another run was in flight, nothing was done.
    Rejected,
}

/// Entry point for whatever delivers the hotkey.
#[async_trait]
pub trait TriggerHandler: Send + Sync {
    async fn on_trigger(&self);
}

struct Devices {
    clipboard: Box<dyn ClipboardBridge>,
    keys: Box<dyn KeySimulator>,
}

/// Sequences capture, prompt resolution, the API call and replacement.
pub struct Pipeline {
    devices: AsyncMutex<Devices>,
    state: Mutex<PipelineState>,
    mode: ActiveMode,
    store: Arc<dyn ConfigStore>,
    client: TransformationClient,
    notifier: Arc<dyn Notifier>,
    capture: SelectionCapture,
    paste_settle: Duration,
}

impl Pipeline {
    pub fn new(
        clipboard: Box<dyn ClipboardBridge>,
        keys: Box<dyn KeySimulator>,
        store: Arc<dyn ConfigStore>,
        client: TransformationClient,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            devices: AsyncMutex::new(Devices { clipboard, keys }),
            state: Mutex::new(PipelineState::Idle),
            mode: ActiveMode::default(),
            store,
            client,
            notifier,
            capture: SelectionCapture::new(DEFAULT_SETTLE),
            paste_settle: DEFAULT_SETTLE,
        }
    }

    /// Sets the wait after both the copy and the paste chord.
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.capture = SelectionCapture::new(delay);
        self.paste_settle = delay;
        self
    }

    pub fn with_mode(self, mode: Mode) -> Self {
        self.mode.select(mode);
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode.current()
    }

    /// Changes the mode used by the next run.
    pub fn select_mode(&self, mode: Mode) {
        tracing::info!(%mode, "Mode selected");
        self.mode.select(mode);
    }

    pub fn state(&self) -> PipelineState {
        *self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn enter(&self, next: PipelineState) {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        tracing::debug!(from = ?*state, to = ?next, "Pipeline transition");
        *state = next;
    }

    /// Runs the pipeline once, unless a run is already active.
    pub async fn run(&self) -> RunOutcome {
        let Ok(mut devices) = self.devices.try_lock() else {
            tracing::info!("Trigger ignored, a run is already in progress");
            return RunOutcome::Rejected;
        };
        let Devices { clipboard, keys } = &mut *devices;

        // Mode and configuration are fixed for the whole run.
        let mode = self.mode.current();
        let config = self.store.snapshot();

        self.enter(PipelineState::Capturing);
        let Captured {
            original,
            touched,
            selected,
        } = match self.capture.capture(clipboard.as_mut(), keys.as_mut()).await {
            Ok(captured) => captured,
            Err(err) => {
                self.report(mode, &err);
                self.enter(PipelineState::Idle);
                return RunOutcome::Failed(err);
            }
        };

        let result = match selected {
            Ok(selected) => {
                self.transform_and_replace(clipboard.as_mut(), keys.as_mut(), mode, &config, &selected)
                    .await
            }
            Err(err) => Err(err),
        };

        if let Err(err) = &result {
            self.report(mode, err);
        }

        if touched {
            self.enter(PipelineState::Restoring);
            if let Err(e) = clipboard.restore(original.as_deref()) {
                tracing::error!(error = %e, "Failed to restore clipboard");
                self.notifier
                    .display("Clipboard not restored", Some(&e.to_string()));
            }
        } else {
            tracing::debug!("Clipboard untouched, nothing to restore");
        }

        self.enter(PipelineState::Idle);
        match result {
            Ok(()) => {
                tracing::info!(%mode, "Selection replaced");
                RunOutcome::Replaced
            }
            Err(err) => RunOutcome::Failed(err),
        }
    }

    fn report(&self, mode: Mode, err: &PipelineError) {
        tracing::warn!(%mode, error = %err, "Pipeline run failed");
        self.notifier.display(err.title(), Some(&err.to_string()));
    }

    async fn transform_and_replace(
        &self,
        clipboard: &mut dyn ClipboardBridge,
        keys: &mut dyn KeySimulator,
        mode: Mode,
        config: &ConfigSnapshot,
        selected: &str,
    ) -> Result<(), PipelineError> {
        self.enter(PipelineState::Resolving);
        let resolved = prompt::resolve(mode, config, selected)?;

        self.enter(PipelineState::Requesting);
        let reply = self
            .client
            .transform(&resolved.credential, &resolved.request.full_prompt())
            .await?;

        self.enter(PipelineState::Replacing);
        clipboard
            .write(&reply)
            .map_err(|e| PipelineError::Clipboard(e.to_string()))?;
        keys.send(Chord::Paste);
        tokio::time::sleep(self.paste_settle).await;
        Ok(())
    }
}

#[async_trait]
impl TriggerHandler for Pipeline {
    async fn on_trigger(&self) {
        self.run().await;
    }
}
