//! Mind-map export pipeline: load, measure, fit, export.

use crate::error::{ExportError, Result};
use crate::geometry::{Canvas, CONTENT_PADDING};
use crate::request::{ExportRequest, OutputKind};
use crate::session::{BrowserSession, DiagramPage, SessionConfig};
use std::fs;
use tracing::info;

/// Root SVG element of a rendered markmap document.
pub const DIAGRAM_SELECTOR: &str = "svg#mindmap";

/// What a successful export produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportOutcome {
    pub canvas: Canvas,
    pub bytes_written: usize,
}

/// Exports a rendered mind map, auto-fitting the output to the diagram's
/// content box.
pub struct MindmapExporter {
    selector: String,
    padding: f64,
}

impl MindmapExporter {
    /// Creates an exporter for `svg#mindmap` with the standard padding.
    pub fn new() -> Self {
        Self {
            selector: DIAGRAM_SELECTOR.to_string(),
            padding: CONTENT_PADDING,
        }
    }

    /// Launches a browser, runs the export, and closes the browser whether
    /// or not the export succeeded.
    pub fn export_with_browser(
        &self,
        config: &SessionConfig,
        request: &ExportRequest,
    ) -> Result<ExportOutcome> {
        BrowserSession::scoped(config, |session| self.export(session, request))
    }

    /// Runs the pipeline against an already-acquired page.
    ///
    /// # Errors
    ///
    /// - `Navigation` if the document cannot be loaded or never goes idle
    /// - `SelectorTimeout` if the diagram root never appears
    /// - `Measurement` if the content box is missing or empty
    /// - `Render` if printing or capturing fails
    /// - `Io` if the output cannot be written
    pub fn export<P: DiagramPage + ?Sized>(
        &self,
        page: &P,
        request: &ExportRequest,
    ) -> Result<ExportOutcome> {
        info!(
            "Exporting mind map ({}): {} -> {}",
            request.kind,
            request.input.display(),
            request.output.display()
        );

        page.open(&request.input_url())?;
        page.wait_for_selector(&self.selector)?;

        let bbox = page.fit_to_content(&self.selector, self.padding)?;
        if !bbox.is_drawable() {
            return Err(ExportError::Measurement(format!(
                "diagram has no drawable content: {}x{} at ({}, {})",
                bbox.width, bbox.height, bbox.x, bbox.y
            )));
        }
        let canvas = bbox.padded(self.padding);

        info!(
            width = canvas.width,
            height = canvas.height,
            "Canvas fitted to content"
        );

        let data = match request.kind {
            OutputKind::Pdf => page.print_pdf(&canvas)?,
            OutputKind::Png => {
                let viewport = canvas.raster_viewport(request.scale);
                page.capture_png(&self.selector, &viewport)?
            }
        };

        fs::write(&request.output, &data).map_err(|source| ExportError::Io {
            path: request.output.clone(),
            source,
        })?;

        info!("Export complete ({}): {} bytes", request.kind, data.len());
        Ok(ExportOutcome {
            canvas,
            bytes_written: data.len(),
        })
    }
}

impl Default for MindmapExporter {
    fn default() -> Self {
        Self::new()
    }
}
