//! Plausibility checks deciding whether a content box depicts an answer sheet.
//!
//! All checks must pass. Failing any of them is an expected outcome (the
//! camera saw something else) rather than an internal error.

use image::GrayImage;

use super::ContentBox;
use crate::error::SheetRejection;

/// Acceptance bounds for sheet validation.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SheetValidationConfig {
    /// Sample every `sample_stride`-th pixel in both axes for ink coverage.
    pub sample_stride: u32,
    /// Accepted `[min, max]` fraction of sampled pixels below the ink threshold.
    pub ink_coverage_range: [f64; 2],
    /// Accepted `[min, max]` box width / height.
    pub aspect_ratio_range: [f64; 2],
    /// Minimum box area as a fraction of the image area.
    pub min_area_fraction: f64,
    /// Box width and height must each exceed this fraction of the image's.
    pub min_dimension_fraction: f64,
}

impl Default for SheetValidationConfig {
    fn default() -> Self {
        Self {
            sample_stride: 5,
            ink_coverage_range: [0.05, 0.6],
            aspect_ratio_range: [0.3, 3.0],
            min_area_fraction: 0.15,
            min_dimension_fraction: 0.2,
        }
    }
}

/// Measurements taken over a candidate content box.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ValidationMetrics {
    /// Fraction of sampled pixels inside the box that are ink.
    pub ink_coverage: f64,
    /// Box width / box height.
    pub aspect_ratio: f64,
    /// Box area / image area.
    pub content_area_fraction: f64,
    /// `min(box_w / img_w, box_h / img_h)`.
    pub min_dimension_ratio: f64,
}

fn in_range(v: f64, [lo, hi]: [f64; 2]) -> bool {
    v >= lo && v <= hi
}

impl SheetValidationConfig {
    /// Check metrics against the bounds, naming the first failed check.
    pub fn check(&self, m: &ValidationMetrics) -> Result<(), SheetRejection> {
        if !in_range(m.ink_coverage, self.ink_coverage_range) {
            return Err(SheetRejection::InkCoverage);
        }
        if !in_range(m.aspect_ratio, self.aspect_ratio_range) {
            return Err(SheetRejection::AspectRatio);
        }
        if m.content_area_fraction < self.min_area_fraction {
            return Err(SheetRejection::ContentArea);
        }
        if m.min_dimension_ratio <= self.min_dimension_fraction {
            return Err(SheetRejection::MinDimension);
        }
        Ok(())
    }
}

/// Fraction of sparsely sampled pixels inside `b` darker than `ink_threshold`.
pub fn ink_coverage(gray: &GrayImage, b: &ContentBox, ink_threshold: u8, stride: u32) -> f64 {
    let stride = stride.max(1) as usize;
    let max_x = b.max_x().min(gray.width());
    let max_y = b.max_y().min(gray.height());
    let mut ink = 0u64;
    let mut total = 0u64;
    for y in (b.min_y()..max_y).step_by(stride) {
        for x in (b.min_x()..max_x).step_by(stride) {
            total += 1;
            if gray.get_pixel(x, y)[0] < ink_threshold {
                ink += 1;
            }
        }
    }
    if total == 0 {
        return 0.0;
    }
    ink as f64 / total as f64
}

/// Measure a content box against the frame it was found in.
pub fn measure_sheet(
    gray: &GrayImage,
    b: &ContentBox,
    ink_threshold: u8,
    config: &SheetValidationConfig,
) -> ValidationMetrics {
    let (w, h) = gray.dimensions();
    let (bw, bh) = (b.width() as f64, b.height() as f64);
    let image_area = w as f64 * h as f64;
    ValidationMetrics {
        ink_coverage: ink_coverage(gray, b, ink_threshold, config.sample_stride),
        aspect_ratio: bw / bh,
        content_area_fraction: if image_area > 0.0 {
            b.area() as f64 / image_area
        } else {
            0.0
        },
        min_dimension_ratio: (bw / w.max(1) as f64).min(bh / h.max(1) as f64),
    }
}

/// Measure and check in one step.
pub fn validate_sheet(
    gray: &GrayImage,
    b: &ContentBox,
    ink_threshold: u8,
    config: &SheetValidationConfig,
) -> (ValidationMetrics, Result<(), SheetRejection>) {
    let metrics = measure_sheet(gray, b, ink_threshold, config);
    let verdict = config.check(&metrics);
    (metrics, verdict)
}
