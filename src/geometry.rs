//! Canvas geometry derived from the diagram's content bounding box.

use serde::{Deserialize, Serialize};

/// Margin added on every side of the content box, in SVG user units.
pub const CONTENT_PADDING: f64 = 20.0;

/// CSS reference pixels per inch, used to size PDF pages.
pub const CSS_PIXELS_PER_INCH: f64 = 96.0;

/// Tight box around the rendered SVG content, as reported by `getBBox()`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// A box is drawable when all components are finite and it has area.
    pub fn is_drawable(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.width > 0.0
            && self.height > 0.0
    }

    /// Grows the box by `padding` on each side.
    pub fn padded(&self, padding: f64) -> Canvas {
        Canvas {
            x: self.x - padding,
            y: self.y - padding,
            width: self.width + padding * 2.0,
            height: self.height + padding * 2.0,
        }
    }
}

/// The export canvas: the padded content box.
///
/// `x`/`y` become the origin of the rewritten `viewBox`; `width`/`height`
/// are both the viewBox extent and the CSS pixel size of the element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Canvas {
    /// Value for the SVG `viewBox` attribute.
    pub fn view_box(&self) -> String {
        format!("{} {} {} {}", self.x, self.y, self.width, self.height)
    }

    /// PDF paper size in inches, one CSS pixel per 1/96 inch.
    pub fn paper_size_inches(&self) -> (f64, f64) {
        (
            self.width / CSS_PIXELS_PER_INCH,
            self.height / CSS_PIXELS_PER_INCH,
        )
    }

    /// Viewport for raster capture: integer CSS pixels, rounded up.
    pub fn raster_viewport(&self, device_scale_factor: f64) -> RasterViewport {
        RasterViewport {
            width: self.width.ceil() as u32,
            height: self.height.ceil() as u32,
            device_scale_factor,
        }
    }
}

/// Browser viewport used for PNG export.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RasterViewport {
    pub width: u32,
    pub height: u32,
    pub device_scale_factor: f64,
}

impl RasterViewport {
    /// Expected pixel size of the emitted image.
    pub fn output_pixels(&self) -> (u32, u32) {
        (
            (self.width as f64 * self.device_scale_factor).round() as u32,
            (self.height as f64 * self.device_scale_factor).round() as u32,
        )
    }
}
