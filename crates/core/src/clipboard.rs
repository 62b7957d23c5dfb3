//! Access to the single shared system clipboard slot.
//!
//! The pipeline only ever deals in text: a clipboard holding an image or
//! nothing at all reads as `Ok(None)`. A read that fails outright is an error,
//! so callers never mistake it for an empty clipboard.

use crate::error::{AppError, Result};
use arboard::Clipboard;

/// Synchronous read/write/clear over the clipboard.
pub trait ClipboardBridge: Send {
    /// Current text content, or `None` if empty or not text.
    fn read(&mut self) -> Result<Option<String>>;

    /// Overwrites the clipboard with `text`.
    fn write(&mut self, text: &str) -> Result<()>;

    fn clear(&mut self) -> Result<()>;

    /// Puts a previously taken snapshot back, clearing if it was empty.
    fn restore(&mut self, snapshot: Option<&str>) -> Result<()> {
        match snapshot {
            Some(text) => self.write(text),
            None => self.clear(),
        }
    }
}

/// [`ClipboardBridge`] over the OS clipboard via `arboard`.
///
/// The handle is held for the life of the process so that content written on
/// X11/Wayland stays owned while other applications read it.
pub struct SystemClipboard {
    inner: Clipboard,
}

impl SystemClipboard {
    pub fn new() -> Result<Self> {
        let inner = Clipboard::new()
            .map_err(|e| AppError::clipboard(format!("Failed to open clipboard: {e}")))?;
        Ok(Self { inner })
    }
}

impl ClipboardBridge for SystemClipboard {
    fn read(&mut self) -> Result<Option<String>> {
        match self.inner.get_text() {
            Ok(text) => Ok(Some(text)),
            Err(arboard::Error::ContentNotAvailable) => Ok(None),
            Err(e) => Err(AppError::clipboard(format!("Failed to read clipboard: {e}"))),
        }
    }

    fn write(&mut self, text: &str) -> Result<()> {
        self.inner
            .set_text(text)
            .map_err(|e| AppError::clipboard(format!("Failed to write clipboard: {e}")))
    }

    fn clear(&mut self) -> Result<()> {
        self.inner
            .clear()
            .map_err(|e| AppError::clipboard(format!("Failed to clear clipboard: {e}")))
    }
}
