//! Prompt modes and the process-wide active mode.

use crate::error::AppError;
use std::fmt;
use std::str::FromStr;
use std::sync::RwLock;

/// One of the three user-configurable prompt profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    #[default]
    A,
    B,
    C,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::A, Mode::B, Mode::C];

    /// Configuration key holding this mode's prompt template.
    pub fn template_key(self) -> &'static str {
        match self {
            Mode::A => "promptA",
            Mode::B => "promptB",
            Mode::C => "promptC",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::A => "A",
            Mode::B => "B",
            Mode::C => "C",
        };
        f.write_str(name)
    }
}

impl FromStr for Mode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a" | "1" => Ok(Mode::A),
            "b" | "2" => Ok(Mode::B),
            "c" | "3" => Ok(Mode::C),
            other => Err(AppError::config(format!(
                "unknown mode '{other}', expected one of a, b, c"
            ))),
        }
    }
}

/// The currently selected mode.
///
/// Changed only through [`ActiveMode::select`]; a pipeline run reads it once
/// when it starts, so a selection made mid-run applies to the next run.
#[derive(Debug, Default)]
pub struct ActiveMode(RwLock<Mode>);

impl ActiveMode {
    pub fn new(mode: Mode) -> Self {
        Self(RwLock::new(mode))
    }

    pub fn current(&self) -> Mode {
        // A poisoned lock still holds a valid Copy value.
        *self.0.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn select(&self, mode: Mode) {
        *self.0.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = mode;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_letters_and_digits() {
        assert_eq!("a".parse::<Mode>().unwrap(), Mode::A);
        assert_eq!("B".parse::<Mode>().unwrap(), Mode::B);
        assert_eq!("3".parse::<Mode>().unwrap(), Mode::C);
        assert!("d".parse::<Mode>().is_err());
    }

    #[test]
    fn template_keys_are_case_sensitive_names() {
        let keys: Vec<_> = Mode::ALL.iter().map(|m| m.template_key()).collect();
        assert_eq!(keys, ["promptA", "promptB", "promptC"]);
    }

    #[test]
    fn select_replaces_current_mode() {
        let active = ActiveMode::default();
        assert_eq!(active.current(), Mode::A);
        active.select(Mode::C);
        assert_eq!(active.current(), Mode::C);
    }
}
