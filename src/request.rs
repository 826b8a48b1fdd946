//! Export request model and pre-flight validation.

use crate::error::{ExportError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Default device scale factor for PNG export.
pub const DEFAULT_SCALE: f64 = 2.0;

/// Output kind, selected by the output file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// Single-page vector PDF.
    Pdf,
    /// Transparent raster PNG.
    Png,
}

impl OutputKind {
    /// Picks the kind from the path suffix. Only `.pdf` and `.png` are recognized.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.to_str()?;
        if name.ends_with(".pdf") {
            Some(OutputKind::Pdf)
        } else if name.ends_with(".png") {
            Some(OutputKind::Png)
        } else {
            None
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputKind::Pdf => write!(f, "pdf"),
            OutputKind::Png => write!(f, "png"),
        }
    }
}

/// A validated export request. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub kind: OutputKind,
    pub scale: f64,
}

impl ExportRequest {
    /// Resolves and validates the raw command-line values.
    ///
    /// Checks run in the same order the CLI reports them: missing input,
    /// unsupported output extension, then scale.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>, scale: &str) -> Result<Self> {
        let raw_input = input.as_ref();
        let input = absolutize(raw_input)?;
        let output = absolutize(output.as_ref())?;

        if !input.is_file() {
            return Err(ExportError::InputNotFound(raw_input.to_path_buf()));
        }

        let kind = OutputKind::from_path(&output)
            .ok_or_else(|| ExportError::UnsupportedOutputFormat(output.clone()))?;

        let scale = parse_scale(scale)?;

        Ok(Self {
            input,
            output,
            kind,
            scale,
        })
    }

    /// `file://` URL of the input document.
    pub fn input_url(&self) -> String {
        format!("file://{}", self.input.display())
    }
}

/// Parses a device scale factor, rejecting NaN, infinities and non-positive values.
pub fn parse_scale(raw: &str) -> Result<f64> {
    match raw.trim().parse::<f64>() {
        Ok(scale) if scale.is_finite() && scale > 0.0 => Ok(scale),
        _ => Err(ExportError::InvalidScale(raw.to_string())),
    }
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(cwd.join(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn html_file() -> NamedTempFile {
        tempfile::Builder::new().suffix(".html").tempfile().unwrap()
    }

    #[test]
    fn test_output_kind_from_extension() {
        assert_eq!(OutputKind::from_path(Path::new("map.pdf")), Some(OutputKind::Pdf));
        assert_eq!(OutputKind::from_path(Path::new("/a/b/map.png")), Some(OutputKind::Png));
        assert_eq!(OutputKind::from_path(Path::new("map.svg")), None);
        assert_eq!(OutputKind::from_path(Path::new("map.PDF")), None);
        assert_eq!(OutputKind::from_path(Path::new("pdf")), None);
    }

    #[test]
    fn test_valid_request() {
        let input = html_file();
        let request = ExportRequest::new(input.path(), "/tmp/out.png", "2").unwrap();

        assert_eq!(request.kind, OutputKind::Png);
        assert_eq!(request.scale, 2.0);
        assert_eq!(request.input, input.path());
        assert!(request.input_url().starts_with("file:///"));
    }

    #[test]
    fn test_relative_output_is_resolved() {
        let input = html_file();
        let request = ExportRequest::new(input.path(), "out.pdf", "1").unwrap();

        assert!(request.output.is_absolute());
        assert!(request.output.ends_with("out.pdf"));
        assert_eq!(request.kind, OutputKind::Pdf);
    }

    #[test]
    fn test_missing_input() {
        let err = ExportRequest::new("/definitely/not/here.html", "/tmp/out.pdf", "2").unwrap_err();
        match err {
            ExportError::InputNotFound(path) => {
                assert_eq!(path, PathBuf::from("/definitely/not/here.html"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_directory_is_not_an_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ExportRequest::new(dir.path(), "/tmp/out.pdf", "2").unwrap_err();
        assert!(matches!(err, ExportError::InputNotFound(_)));
    }

    #[test]
    fn test_unsupported_output() {
        let input = html_file();
        let err = ExportRequest::new(input.path(), "/tmp/out.jpg", "2").unwrap_err();
        assert!(matches!(err, ExportError::UnsupportedOutputFormat(_)));
    }

    #[test]
    fn test_missing_input_reported_before_bad_extension() {
        let err = ExportRequest::new("/nope.html", "/tmp/out.jpg", "2").unwrap_err();
        assert!(matches!(err, ExportError::InputNotFound(_)));
    }

    #[test]
    fn test_parse_scale() {
        assert_eq!(parse_scale("2").unwrap(), 2.0);
        assert_eq!(parse_scale("1.5").unwrap(), 1.5);
        assert_eq!(parse_scale(" 3 ").unwrap(), 3.0);

        for bad in ["0", "-1", "NaN", "inf", "abc", ""] {
            assert!(
                matches!(parse_scale(bad), Err(ExportError::InvalidScale(_))),
                "scale {bad:?} should be rejected"
            );
        }
    }
}
