//! Turns the active mode, configuration and captured text into a request.

use crate::error::{ConfigKind, PipelineError};
use crate::mode::Mode;
use crate::settings::ConfigSnapshot;

const SEPARATOR: &str = "\n\n";

/// Template plus captured text; immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformationRequest {
    template: String,
    selected_text: String,
}

impl TransformationRequest {
    pub fn new(template: impl Into<String>, selected_text: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            selected_text: selected_text.into(),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn selected_text(&self) -> &str {
        &self.selected_text
    }

    /// The user message sent to the model.
    pub fn full_prompt(&self) -> String {
        format!("{}{SEPARATOR}{}", self.template, self.selected_text)
    }
}

/// Everything the client needs for one exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPrompt {
    pub credential: String,
    pub request: TransformationRequest,
}

/// Resolves the template for `mode` and the credential.
///
/// The template is checked before the credential, so a fresh install with
/// nothing configured reports the missing prompt first.
pub fn resolve(
    mode: Mode,
    config: &ConfigSnapshot,
    selected_text: &str,
) -> Result<ResolvedPrompt, PipelineError> {
    let template = config
        .template(mode)
        .ok_or(PipelineError::ConfigMissing(ConfigKind::Template(mode)))?;
    let credential = config
        .credential()
        .ok_or(PipelineError::ConfigMissing(ConfigKind::Credential))?;

    Ok(ResolvedPrompt {
        credential: credential.to_string(),
        request: TransformationRequest::new(template, selected_text),
    })
}
