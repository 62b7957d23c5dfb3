//! Global hotkey detection on top of `rdev`'s raw key event stream.

use ai_rewrite_core::Mode;
use rdev::{EventType, Key};
use std::fmt;
use std::str::FromStr;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

pub const DEFAULT_HOTKEY: &str = "Ctrl+Shift+P";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    fn any(self) -> bool {
        self.ctrl || self.shift || self.alt || self.meta
    }
}

/// Modifier combination plus one key, e.g. `Ctrl+Shift+P`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hotkey {
    pub modifiers: Modifiers,
    pub key: Key,
}

impl FromStr for Hotkey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s
            .split('+')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();
        let Some((key_part, modifier_parts)) = parts.split_last() else {
            return Err("hotkey is empty".to_string());
        };

        let mut modifiers = Modifiers::default();
        for part in modifier_parts {
            match part.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => modifiers.ctrl = true,
                "shift" => modifiers.shift = true,
                "alt" | "option" => modifiers.alt = true,
                "meta" | "cmd" | "command" | "super" | "win" => modifiers.meta = true,
                other => return Err(format!("unknown modifier '{other}'")),
            }
        }
        if !modifiers.any() {
            return Err(format!("hotkey '{s}' needs at least one modifier"));
        }

        let key = key_from_name(key_part).ok_or_else(|| format!("unsupported key '{key_part}'"))?;
        if mode_for_key(key).is_some() {
            return Err("digits 1-3 are reserved for mode selection".to_string());
        }
        Ok(Self { modifiers, key })
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.modifiers;
        for (held, name) in [(m.ctrl, "Ctrl"), (m.shift, "Shift"), (m.alt, "Alt"), (m.meta, "Meta")] {
            if held {
                write!(f, "{name}+")?;
            }
        }
        write!(f, "{:?}", self.key)
    }
}

fn key_from_name(name: &str) -> Option<Key> {
    let key = match name.to_ascii_uppercase().as_str() {
        "A" => Key::KeyA,
        "B" => Key::KeyB,
        "C" => Key::KeyC,
        "D" => Key::KeyD,
        "E" => Key::KeyE,
        "F" => Key::KeyF,
        "G" => Key::KeyG,
        "H" => Key::KeyH,
        "I" => Key::KeyI,
        "J" => Key::KeyJ,
        "K" => Key::KeyK,
        "L" => Key::KeyL,
        "M" => Key::KeyM,
        "N" => Key::KeyN,
        "O" => Key::KeyO,
        "P" => Key::KeyP,
        "Q" => Key::KeyQ,
        "R" => Key::KeyR,
        "S" => Key::KeyS,
        "T" => Key::KeyT,
        "U" => Key::KeyU,
        "V" => Key::KeyV,
        "W" => Key::KeyW,
        "X" => Key::KeyX,
        "Y" => Key::KeyY,
        "Z" => Key::KeyZ,
        "0" => Key::Num0,
        "1" => Key::Num1,
        "2" => Key::Num2,
        "3" => Key::Num3,
        "4" => Key::Num4,
        "5" => Key::Num5,
        "6" => Key::Num6,
        "7" => Key::Num7,
        "8" => Key::Num8,
        "9" => Key::Num9,
        "SPACE" => Key::Space,
        "F1" => Key::F1,
        "F2" => Key::F2,
        "F3" => Key::F3,
        "F4" => Key::F4,
        "F5" => Key::F5,
        "F6" => Key::F6,
        "F7" => Key::F7,
        "F8" => Key::F8,
        "F9" => Key::F9,
        "F10" => Key::F10,
        "F11" => Key::F11,
        "F12" => Key::F12,
        _ => return None,
    };
    Some(key)
}

fn mode_for_key(key: Key) -> Option<Mode> {
    match key {
        Key::Num1 => Some(Mode::A),
        Key::Num2 => Some(Mode::B),
        Key::Num3 => Some(Mode::C),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HotkeyEvent {
    /// The trigger hotkey was pressed.
    Trigger,
    /// The trigger modifiers plus 1, 2 or 3 were pressed.
    SelectMode(Mode),
    /// The OS listener failed; no further events will arrive.
    Stopped(String),
}

/// Turns raw key events into hotkey events.
///
/// A hotkey fires once per press: auto-repeat is ignored until the key is
/// released.
///
/// While `paused` reports true every event is dropped. The pipeline injects
/// its own copy/paste chords, releasing the modifiers the user is still
/// holding; tracking those would leave the modifier state out of sync with
/// the keyboard.
pub struct Tracker {
    hotkey: Hotkey,
    held: Modifiers,
    latched: Option<Key>,
    paused: Box<dyn Fn() -> bool + Send>,
}

impl Tracker {
    pub fn new(hotkey: Hotkey) -> Self {
        Self::with_pause(hotkey, || false)
    }

    pub fn with_pause(hotkey: Hotkey, paused: impl Fn() -> bool + Send + 'static) -> Self {
        Self {
            hotkey,
            held: Modifiers::default(),
            latched: None,
            paused: Box::new(paused),
        }
    }

    pub fn handle(&mut self, event: &EventType) -> Option<HotkeyEvent> {
        if (self.paused)() {
            return None;
        }
        match *event {
            EventType::KeyPress(key) => {
                if self.set_modifier(key, true) {
                    return None;
                }
                if self.held != self.hotkey.modifiers || self.latched == Some(key) {
                    return None;
                }
                let fired = if key == self.hotkey.key {
                    Some(HotkeyEvent::Trigger)
                } else {
                    mode_for_key(key).map(HotkeyEvent::SelectMode)
                };
                if fired.is_some() {
                    self.latched = Some(key);
                }
                fired
            }
            EventType::KeyRelease(key) => {
                self.set_modifier(key, false);
                if self.latched == Some(key) {
                    self.latched = None;
                }
                None
            }
            _ => None,
        }
    }

    /// Updates modifier state; returns whether `key` is a modifier.
    fn set_modifier(&mut self, key: Key, down: bool) -> bool {
        let slot = match key {
            Key::ControlLeft | Key::ControlRight => &mut self.held.ctrl,
            Key::ShiftLeft | Key::ShiftRight => &mut self.held.shift,
            Key::Alt | Key::AltGr => &mut self.held.alt,
            Key::MetaLeft | Key::MetaRight => &mut self.held.meta,
            _ => return false,
        };
        *slot = down;
        true
    }
}

/// Starts the OS key listener on its own thread.
///
/// `rdev::listen` blocks for the life of the process, so it cannot run on
/// the async runtime. Key events are ignored while `busy` returns true.
pub fn spawn_listener(
    hotkey: Hotkey,
    busy: impl Fn() -> bool + Send + 'static,
) -> UnboundedReceiver<HotkeyEvent> {
    let (tx, rx) = unbounded_channel();
    std::thread::spawn(move || run_listener(Tracker::with_pause(hotkey, busy), tx));
    rx
}

fn run_listener(mut tracker: Tracker, tx: UnboundedSender<HotkeyEvent>) {
    let events = tx.clone();
    let result = rdev::listen(move |event| {
        if let Some(hotkey_event) = tracker.handle(&event.event_type) {
            tracing::debug!(?hotkey_event, "Hotkey pressed");
            let _ = events.send(hotkey_event);
        }
    });
    if let Err(e) = result {
        let _ = tx.send(HotkeyEvent::Stopped(format!("{e:?}")));
    }
}
