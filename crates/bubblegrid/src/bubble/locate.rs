//! Local re-centering of nominal bubble positions.
//!
//! Fixed-grid positions drift under scan skew, scale error and uneven margins.
//! Searching a small neighborhood for its darkest pixel snaps each nominal
//! center onto the printed or filled bubble without full segmentation.

use image::GrayImage;

/// Neighborhood search parameters.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BubbleSearchConfig {
    /// Search half-width as a fraction of option width.
    pub radius_frac: f64,
    /// Sampling step in pixels along both axes.
    pub step_px: u32,
}

impl Default for BubbleSearchConfig {
    fn default() -> Self {
        Self {
            radius_frac: 0.4,
            step_px: 2,
        }
    }
}

/// Round and clamp a sub-pixel position onto the image grid.
pub(crate) fn clamp_to_image(gray: &GrayImage, p: [f64; 2]) -> [u32; 2] {
    let (w, h) = gray.dimensions();
    let x = p[0].round().clamp(0.0, w.saturating_sub(1) as f64) as u32;
    let y = p[1].round().clamp(0.0, h.saturating_sub(1) as f64) as u32;
    [x, y]
}

/// Find the darkest pixel within `radius_px` of `nominal`.
///
/// Offsets are visited on a lattice of `step_px` centered on the nominal
/// pixel, so the nominal pixel is always a candidate. Candidates outside the
/// image are skipped, and the lattice never extends past the larger image
/// dimension. Ties prefer the candidate nearest the nominal center.
pub fn locate_bubble(gray: &GrayImage, nominal: [f64; 2], radius_px: f64, step_px: u32) -> [u32; 2] {
    let [cx, cy] = clamp_to_image(gray, nominal);
    let (w, h) = gray.dimensions();
    let step = step_px.max(1) as i64;
    let n = ((radius_px.max(0.0) / step as f64).floor() as i64).min(i64::from(w.max(h)));

    let mut best = [cx, cy];
    let mut best_val = gray.get_pixel(cx, cy)[0];
    let mut best_d2 = 0i64;

    for ky in -n..=n {
        let y = cy as i64 + ky * step;
        if y < 0 || y >= h as i64 {
            continue;
        }
        for kx in -n..=n {
            let x = cx as i64 + kx * step;
            if x < 0 || x >= w as i64 {
                continue;
            }
            let v = gray.get_pixel(x as u32, y as u32)[0];
            let d2 = (kx * kx + ky * ky) * step * step;
            if v < best_val || (v == best_val && d2 < best_d2) {
                best = [x as u32, y as u32];
                best_val = v;
                best_d2 = d2;
            }
        }
    }
    best
}
