//! Markmap HTML to PDF/PNG export library.
//!
//! Loads a rendered mind map in headless Chromium, measures the content box
//! of its `svg#mindmap` root, re-fits the SVG to that box plus a fixed
//! margin, and prints (PDF) or captures (PNG) exactly that canvas.
//!
//! ## Module Overview
//!
//! - `request`: export request model and pre-flight validation
//! - `geometry`: content box, padded canvas, raster and page sizing
//! - `session`: scoped headless browser session behind the `DiagramPage` trait
//! - `exporter`: the export pipeline
//! - `run`: per-invocation record
//! - `telemetry`: tracing subscriber and OpenTelemetry spans
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use mmap_export::{
//!     exporter::MindmapExporter,
//!     request::ExportRequest,
//!     session::SessionConfig,
//! };
//!
//! let request = ExportRequest::new("map.html", "map.png", "2").unwrap();
//! let outcome = MindmapExporter::new()
//!     .export_with_browser(&SessionConfig::default(), &request)
//!     .unwrap();
//! println!("{}x{}", outcome.canvas.width, outcome.canvas.height);
//! ```

pub mod error;
pub mod exporter;
pub mod geometry;
pub mod request;
pub mod run;
pub mod session;
pub mod telemetry;

pub use error::{ExportError, Result};
