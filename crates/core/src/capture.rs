//! Selected-text capture.
//!
//! There is no portable way to ask "what text is selected" without knowing
//! which application owns the selection, so capture drives the application's
//! own copy command and reads the clipboard afterwards:
//!
//! 1. snapshot the current clipboard,
//! 2. clear it if it held text, so stale text cannot pass for a fresh copy,
//! 3. post the copy chord,
//! 4. wait for the application to fill the clipboard,
//! 5. read it back.
//!
//! A clipboard holding no text (empty, or an image) is left alone until the
//! copy itself replaces it. If the snapshot cannot be read, capture stops
//! before anything is changed. Otherwise the caller owns the snapshot and
//! must restore it when [`Captured::touched`] is set.

use crate::clipboard::ClipboardBridge;
use crate::error::PipelineError;
use crate::input::{Chord, KeySimulator};
use std::time::Duration;

/// What a capture observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captured {
    /// Clipboard text before the pipeline touched it.
    pub original: Option<String>,
    /// Whether the clipboard may differ from `original` now.
    pub touched: bool,
    /// The selected text, or why there is none to work with.
    pub selected: Result<String, PipelineError>,
}

/// Captures the current selection via the clipboard.
#[derive(Debug, Clone, Copy)]
pub struct SelectionCapture {
    settle_delay: Duration,
}

impl SelectionCapture {
    pub fn new(settle_delay: Duration) -> Self {
        Self { settle_delay }
    }

    /// Copies the selection, or fails without side effects if the clipboard
    /// cannot be snapshotted.
    pub async fn capture(
        &self,
        clipboard: &mut dyn ClipboardBridge,
        keys: &mut dyn KeySimulator,
    ) -> Result<Captured, PipelineError> {
        let original = clipboard
            .read()
            .map_err(|e| PipelineError::ClipboardUnreadable(e.to_string()))?;

        let mut touched = false;
        if original.is_some() {
            touched = true;
            if let Err(e) = clipboard.clear() {
                return Ok(Captured {
                    original,
                    touched,
                    selected: Err(PipelineError::Clipboard(e.to_string())),
                });
            }
        }

        keys.send(Chord::Copy);
        tokio::time::sleep(self.settle_delay).await;

        let selected = match clipboard.read() {
            // No selection and an empty selection look the same from here.
            Ok(Some(text)) => {
                touched = true;
                if text.is_empty() {
                    Err(PipelineError::NoSelection)
                } else {
                    Ok(text)
                }
            }
            Ok(None) => Err(PipelineError::NoSelection),
            Err(e) => Err(PipelineError::Clipboard(e.to_string())),
        };
        tracing::debug!(
            had_original = original.is_some(),
            touched,
            selected_len = selected.as_ref().map_or(0, String::len),
            "Captured selection"
        );

        Ok(Captured {
            original,
            touched,
            selected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Desktop, Event};

    fn capture() -> SelectionCapture {
        SelectionCapture::new(Duration::from_millis(200))
    }

    #[tokio::test(start_paused = true)]
    async fn returns_selection_and_keeps_original() {
        let desktop = Desktop::new(Some("ORIGINAL"), Some("Hello world"));
        let (mut clipboard, mut keys) = desktop.devices();

        let started = tokio::time::Instant::now();
        let captured = capture().capture(&mut clipboard, &mut keys).await.unwrap();

        assert_eq!(captured.original.as_deref(), Some("ORIGINAL"));
        assert_eq!(captured.selected.as_deref(), Ok("Hello world"));
        assert!(captured.touched);
        assert!(started.elapsed() >= Duration::from_millis(200));
        assert_eq!(desktop.chords(), vec![Chord::Copy]);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_clipboard_is_not_mistaken_for_a_selection() {
        let desktop = Desktop::new(Some("ORIGINAL"), None);
        let (mut clipboard, mut keys) = desktop.devices();

        let captured = capture().capture(&mut clipboard, &mut keys).await.unwrap();

        assert_eq!(captured.original.as_deref(), Some("ORIGINAL"));
        assert_eq!(captured.selected, Err(PipelineError::NoSelection));
        assert!(captured.touched);
        assert!(desktop.events().contains(&Event::Cleared));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_copy_counts_as_no_selection() {
        let desktop = Desktop::new(None, Some(""));
        let (mut clipboard, mut keys) = desktop.devices();

        let captured = capture().capture(&mut clipboard, &mut keys).await.unwrap();

        assert_eq!(captured.original, None);
        assert_eq!(captured.selected, Err(PipelineError::NoSelection));
    }

    #[tokio::test(start_paused = true)]
    async fn whitespace_is_a_real_selection() {
        let desktop = Desktop::new(None, Some("  \n"));
        let (mut clipboard, mut keys) = desktop.devices();

        let captured = capture().capture(&mut clipboard, &mut keys).await.unwrap();

        assert_eq!(captured.selected.as_deref(), Ok("  \n"));
    }

    #[tokio::test(start_paused = true)]
    async fn image_on_clipboard_is_left_alone_without_a_selection() {
        let desktop = Desktop::with_image(None);
        let (mut clipboard, mut keys) = desktop.devices();

        let captured = capture().capture(&mut clipboard, &mut keys).await.unwrap();

        assert_eq!(captured.original, None);
        assert!(!captured.touched);
        assert!(desktop.has_image());
        assert!(!desktop.events().contains(&Event::Cleared));
    }

    #[tokio::test(start_paused = true)]
    async fn unreadable_clipboard_aborts_before_any_change() {
        let desktop = Desktop::new(Some("ORIGINAL"), Some("Hello world"));
        desktop.fail_next_read();
        let (mut clipboard, mut keys) = desktop.devices();

        let err = capture().capture(&mut clipboard, &mut keys).await.unwrap_err();

        assert!(matches!(err, PipelineError::ClipboardUnreadable(_)));
        assert!(desktop.events().is_empty());
        assert_eq!(desktop.clipboard().as_deref(), Some("ORIGINAL"));
    }
}
