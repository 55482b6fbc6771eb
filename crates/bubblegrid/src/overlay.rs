//! Diagnostic overlay: an annotated copy of the source frame.
//!
//! The overlay is a side channel. The decoder hands the rendered image to an
//! injected [`OverlaySink`]; sink failures are logged and never change the
//! decode result.

use std::path::{Path, PathBuf};

use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::error::OverlayError;
use crate::pipeline::SheetScan;

/// Receiver for rendered overlays.
pub trait OverlaySink: Send + Sync {
    fn write_overlay(&self, overlay: &RgbImage) -> Result<(), OverlayError>;
}

/// Writes every overlay to one PNG path, replacing the previous one.
#[derive(Debug, Clone)]
pub struct PngFileSink {
    path: PathBuf,
}

impl PngFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OverlaySink for PngFileSink {
    fn write_overlay(&self, overlay: &RgbImage) -> Result<(), OverlayError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        overlay.save_with_format(&self.path, image::ImageFormat::Png)?;
        Ok(())
    }
}

/// Colors and marker size of the overlay.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OverlayStyle {
    /// Circle color for the selected option.
    pub selected: [u8; 3],
    /// Circle color for every other option.
    pub unselected: [u8; 3],
    /// Content box outline color.
    pub content_box: [u8; 3],
    /// Circle radius as a fraction of option width.
    pub radius_frac: f64,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            selected: [0, 200, 0],
            unselected: [220, 0, 0],
            content_box: [0, 90, 255],
            radius_frac: 0.3,
        }
    }
}

/// Draw the content box and one circle per option onto a color copy of `gray`.
///
/// Circles sit on the refined bubble centers, so the overlay also shows how
/// far the locator moved each one.
pub fn render_overlay(gray: &GrayImage, scan: &SheetScan, style: &OverlayStyle) -> RgbImage {
    let mut canvas = image::DynamicImage::ImageLuma8(gray.clone()).to_rgb8();

    let b = scan.content_box;
    let outline =
        Rect::at(b.min_x() as i32, b.min_y() as i32).of_size(b.width() + 1, b.height() + 1);
    draw_hollow_rect_mut(&mut canvas, outline, Rgb(style.content_box));

    let radius = (scan.grid.option_width * style.radius_frac).round().max(2.0) as i32;
    for q in &scan.questions {
        let selected = q.selected_answer();
        for s in &q.samples {
            let color = if selected == Some(s.option) {
                style.selected
            } else {
                style.unselected
            };
            let center = (s.center[0] as i32, s.center[1] as i32);
            draw_hollow_circle_mut(&mut canvas, center, radius, Rgb(color));
            draw_hollow_circle_mut(&mut canvas, center, radius + 1, Rgb(color));
        }
    }
    canvas
}
