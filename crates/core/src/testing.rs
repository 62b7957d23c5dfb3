//! In-memory stand-ins for the desktop, the remote API and the notifier.

use crate::client::{ChatRequest, ChatTransport, RawResponse};
use crate::clipboard::ClipboardBridge;
use crate::error::{AppError, Result};
use crate::input::{Chord, KeySimulator};
use crate::notify::Notifier;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;

/// Something that changed the clipboard or hit the keyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Written(String),
    Cleared,
    Chord(Chord),
}

#[derive(Debug, Default)]
struct DesktopState {
    clipboard: Option<String>,
    /// Non-text content that reads as `None`.
    image: bool,
    selection: Option<String>,
    fail_next_read: bool,
    fail_next_write: bool,
    events: Vec<Event>,
}

/// A fake desktop: one clipboard slot and a focused app holding `selection`.
///
/// A copy chord makes the "app" put its selection on the clipboard, as a real
/// application would; nothing happens if it has none.
#[derive(Debug, Clone, Default)]
pub struct Desktop(Arc<Mutex<DesktopState>>);

impl Desktop {
    pub fn new(clipboard: Option<&str>, selection: Option<&str>) -> Self {
        Self(Arc::new(Mutex::new(DesktopState {
            clipboard: clipboard.map(str::to_string),
            selection: selection.map(str::to_string),
            ..Default::default()
        })))
    }

    /// A desktop whose clipboard holds an image.
    pub fn with_image(selection: Option<&str>) -> Self {
        let desktop = Self::new(None, selection);
        desktop.state().image = true;
        desktop
    }

    fn state(&self) -> MutexGuard<'_, DesktopState> {
        self.0.lock().unwrap()
    }

    pub fn devices(&self) -> (FakeClipboard, FakeKeys) {
        (FakeClipboard(self.clone()), FakeKeys(self.clone()))
    }

    pub fn clipboard(&self) -> Option<String> {
        self.state().clipboard.clone()
    }

    pub fn events(&self) -> Vec<Event> {
        self.state().events.clone()
    }

    pub fn chords(&self) -> Vec<Chord> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Chord(chord) => Some(chord),
                _ => None,
            })
            .collect()
    }

    pub fn has_image(&self) -> bool {
        self.state().image
    }

    pub fn fail_next_read(&self) {
        self.state().fail_next_read = true;
    }

    pub fn fail_next_write(&self) {
        self.state().fail_next_write = true;
    }
}

pub struct FakeClipboard(Desktop);

impl ClipboardBridge for FakeClipboard {
    fn read(&mut self) -> Result<Option<String>> {
        let mut state = self.0.state();
        if std::mem::take(&mut state.fail_next_read) {
            return Err(AppError::clipboard("clipboard is busy"));
        }
        Ok(state.clipboard.clone())
    }

    fn write(&mut self, text: &str) -> Result<()> {
        let mut state = self.0.state();
        if std::mem::take(&mut state.fail_next_write) {
            return Err(AppError::clipboard("clipboard is locked"));
        }
        state.clipboard = Some(text.to_string());
        state.image = false;
        state.events.push(Event::Written(text.to_string()));
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        let mut state = self.0.state();
        state.clipboard = None;
        state.image = false;
        state.events.push(Event::Cleared);
        Ok(())
    }
}

pub struct FakeKeys(Desktop);

impl KeySimulator for FakeKeys {
    fn send(&mut self, chord: Chord) {
        let mut state = self.0.state();
        state.events.push(Event::Chord(chord));
        if chord == Chord::Copy {
            if let Some(selection) = state.selection.clone() {
                state.clipboard = Some(selection);
                state.image = false;
            }
        }
    }
}

#[derive(Debug, Clone)]
enum Behaviour {
    Reply(RawResponse),
    Fail(String),
    Stall,
}

/// Scripted [`ChatTransport`] that records what it was sent.
#[derive(Debug, Clone)]
pub struct FakeTransport {
    behaviour: Behaviour,
    gate: Option<Arc<Notify>>,
    requests: Arc<Mutex<Vec<(String, ChatRequest)>>>,
}

impl FakeTransport {
    fn with(behaviour: Behaviour) -> Self {
        Self {
            behaviour,
            gate: None,
            requests: Arc::default(),
        }
    }

    pub fn reply(status: u16, body: &str) -> Self {
        Self::with(Behaviour::Reply(RawResponse {
            status,
            body: body.as_bytes().to_vec(),
        }))
    }

    /// A successful chat completion whose message content is `text`.
    pub fn completion(text: &str) -> Self {
        let body = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": text}}]
        });
        Self::reply(200, &body.to_string())
    }

    pub fn fail(cause: &str) -> Self {
        Self::with(Behaviour::Fail(cause.to_string()))
    }

    /// Never answers.
    pub fn stall() -> Self {
        Self::with(Behaviour::Stall)
    }

    /// Holds the reply back until the returned handle is notified.
    pub fn gated(self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        (
            Self {
                gate: Some(gate.clone()),
                ..self
            },
            gate,
        )
    }

    pub fn requests(&self) -> Vec<(String, ChatRequest)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatTransport for FakeTransport {
    async fn post(&self, credential: &str, request: &ChatRequest) -> std::result::Result<RawResponse, String> {
        self.requests
            .lock()
            .unwrap()
            .push((credential.to_string(), request.clone()));

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        match &self.behaviour {
            Behaviour::Reply(raw) => Ok(raw.clone()),
            Behaviour::Fail(cause) => Err(cause.clone()),
            Behaviour::Stall => std::future::pending().await,
        }
    }
}

/// Notifier that remembers every notification.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier(Arc<Mutex<Vec<(String, Option<String>)>>>);

impl RecordingNotifier {
    pub fn shown(&self) -> Vec<(String, Option<String>)> {
        self.0.lock().unwrap().clone()
    }

    pub fn titles(&self) -> Vec<String> {
        self.shown().into_iter().map(|(title, _)| title).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn display(&self, title: &str, subtitle: Option<&str>) {
        self.0
            .lock()
            .unwrap()
            .push((title.to_string(), subtitle.map(str::to_string)));
    }
}
