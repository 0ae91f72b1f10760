//! # Layout Error Types
//!
//! Errors surfaced by the layout crate.
//!
//! ## What Can Fail
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Before layout              │  During layout                            │
//! │  ─────────────              │  ─────────────                            │
//! │  Config      bad values     │  nothing: overflow adds pages,            │
//! │  Io / Toml   config file    │  unknown currencies fall back to          │
//! │  Core        totals math    │  "<amount> <CODE>"                        │
//! │  TemplateNotFound           │                                           │
//! │  TemplateSyntax / Render    │                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use invoicer_core::CoreError;
use thiserror::Error;

/// Result type alias for layout operations.
pub type LayoutResult<T> = Result<T, LayoutError>;

#[derive(Debug, Error)]
pub enum LayoutError {
    /// No template source could provide the named template.
    #[error("Template '{name}' not found: {reason}")]
    TemplateNotFound { name: String, reason: String },

    /// The template text does not parse.
    #[error("Template '{name}' has a syntax error: {reason}")]
    TemplateSyntax { name: String, reason: String },

    /// Rendering failed, e.g. an unknown helper or a helper given bad input.
    #[error("Failed to render template '{name}': {reason}")]
    TemplateRender { name: String, reason: String },

    /// Render configuration failed validation.
    #[error("Invalid render configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// Totals could not be computed.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl LayoutError {
    pub(crate) fn template_not_found(name: &str, reason: impl Into<String>) -> Self {
        LayoutError::TemplateNotFound {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = LayoutError::template_not_found("invoice.html", "not in any source");
        assert_eq!(
            err.to_string(),
            "Template 'invoice.html' not found: not in any source"
        );

        let err = LayoutError::TemplateRender {
            name: "invoice.html".into(),
            reason: "Helper not defined".into(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to render template 'invoice.html': Helper not defined"
        );

        let err: LayoutError = CoreError::UnknownCurrency("XYZ".into()).into();
        assert_eq!(err.to_string(), "Unknown currency: XYZ");
    }
}
