//! Synthetic copy/paste key chords.

use crate::error::{AppError, Result};
use enigo::{Direction, Enigo, Key, Keyboard, Settings};

/// A modifier+key combination posted to the focused application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chord {
    Copy,
    Paste,
}

impl Chord {
    fn key(self) -> char {
        match self {
            Chord::Copy => 'c',
            Chord::Paste => 'v',
        }
    }
}

/// Posts key chords to the system input stream.
///
/// Delivery is fire-and-forget: implementations log failures rather than
/// returning them, since the pipeline cannot observe whether the target
/// application reacted anyway.
pub trait KeySimulator: Send {
    fn send(&mut self, chord: Chord);
}

/// [`KeySimulator`] backed by `enigo`.
///
/// A fresh connection is made per chord, so nothing platform-specific is kept
/// across await points.
pub struct EnigoKeys {
    settings: Settings,
}

impl EnigoKeys {
    /// Checks once that the input backend is reachable.
    pub fn new() -> Result<Self> {
        let settings = Settings::default();
        Enigo::new(&settings)
            .map_err(|e| AppError::input(format!("Failed to initialize input simulation: {e}")))?;
        Ok(Self { settings })
    }

    fn press(&self, chord: Chord) -> std::result::Result<(), String> {
        let mut enigo = Enigo::new(&self.settings).map_err(|e| e.to_string())?;

        // The hotkey's own modifiers may still be held down; release them so
        // the target sees a plain copy/paste and not e.g. Ctrl+Shift+C.
        for held in [Key::Shift, Key::Alt, Key::Meta, Key::Control] {
            enigo.key(held, Direction::Release).map_err(|e| e.to_string())?;
        }

        let modifier = command_modifier();
        enigo.key(modifier, Direction::Press).map_err(|e| e.to_string())?;
        let clicked = enigo.key(Key::Unicode(chord.key()), Direction::Click);
        enigo.key(modifier, Direction::Release).map_err(|e| e.to_string())?;
        clicked.map_err(|e| e.to_string())
    }
}

impl KeySimulator for EnigoKeys {
    fn send(&mut self, chord: Chord) {
        match self.press(chord) {
            Ok(()) => tracing::debug!(?chord, "Posted key chord"),
            Err(e) => tracing::warn!(?chord, error = %e, "Failed to post key chord"),
        }
    }
}

#[cfg(target_os = "macos")]
fn command_modifier() -> Key {
    Key::Meta
}

#[cfg(not(target_os = "macos"))]
fn command_modifier() -> Key {
    Key::Control
}
