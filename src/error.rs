//! Error taxonomy for the export pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Errors raised while validating or running an export.
///
/// Pre-flight variants (`InputNotFound`, `UnsupportedOutputFormat`,
/// `InvalidScale`) are produced before a browser is launched. Everything
/// else happens inside a browser session.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Cannot find input file \"{}\"", .0.display())]
    InputNotFound(PathBuf),

    #[error("Output file must end with .pdf or .png (got \"{}\")", .0.display())]
    UnsupportedOutputFormat(PathBuf),

    #[error("Scale must be a finite number greater than 0 (got \"{0}\")")]
    InvalidScale(String),

    #[error("failed to launch browser: {0}")]
    BrowserLaunch(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("waiting for selector `{selector}` failed: {message}")]
    SelectorTimeout { selector: String, message: String },

    #[error("measuring diagram failed: {0}")]
    Measurement(String),

    #[error("rendering output failed: {0}")]
    Render(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    /// True for failures detected before any browser resource is acquired.
    pub fn is_preflight(&self) -> bool {
        matches!(
            self,
            ExportError::InputNotFound(_)
                | ExportError::UnsupportedOutputFormat(_)
                | ExportError::InvalidScale(_)
        )
    }

    /// True for generic runtime failures (navigation, measurement, export, I/O).
    pub fn is_runtime(&self) -> bool {
        matches!(
            self,
            ExportError::BrowserLaunch(_)
                | ExportError::Navigation(_)
                | ExportError::Measurement(_)
                | ExportError::Render(_)
                | ExportError::Io { .. }
        )
    }
}
