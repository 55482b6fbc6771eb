//! Content bounding-box detection by ink scanning.
//!
//! One horizontal line through the frame center gives the horizontal extent,
//! two vertical lines (a quarter in from each side) give the vertical extent.
//! The grid is assumed to span the frame's central cross, which holds when the
//! sheet fills most of the frame.

use image::GrayImage;

/// Behavior when the sampling lines find no ink at all.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum MissingContentPolicy {
    /// Fail with [`crate::ScanError::NoContentDetected`].
    #[default]
    Reject,
    /// Fall back to a fixed inset of `margin_frac` of each dimension.
    FixedMargin { margin_frac: f64 },
}

/// Configuration for content bounding-box detection.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContentBoxConfig {
    /// Row of the horizontal sampling line, as a fraction of image height.
    pub horizontal_scan_frac: f64,
    /// Columns of the vertical sampling lines, as fractions of image width.
    pub vertical_scan_fracs: [f64; 2],
    /// Outward expansion on each side, as a fraction of the matching dimension.
    pub expand_frac: f64,
    /// What to do when no ink is found.
    pub on_missing: MissingContentPolicy,
}

impl Default for ContentBoxConfig {
    fn default() -> Self {
        Self {
            horizontal_scan_frac: 0.5,
            vertical_scan_fracs: [0.25, 0.75],
            expand_frac: 0.02,
            on_missing: MissingContentPolicy::Reject,
        }
    }
}

/// Pixel-space rectangle believed to hold the answer grid.
///
/// Invariant: `min_x < max_x` and `min_y < max_y`. Boxes produced by
/// [`detect_content_box`] also satisfy `max_x <= width` and `max_y <= height`.
/// Fields are read-only so every box goes through [`ContentBox::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "BoxCorners")]
pub struct ContentBox {
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
}

/// Unchecked wire form of [`ContentBox`].
#[derive(serde::Deserialize)]
struct BoxCorners {
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
}

impl TryFrom<BoxCorners> for ContentBox {
    type Error = String;

    fn try_from(c: BoxCorners) -> Result<Self, Self::Error> {
        Self::new(c.min_x, c.min_y, c.max_x, c.max_y).ok_or_else(|| {
            format!(
                "degenerate content box x={}..{} y={}..{}",
                c.min_x, c.max_x, c.min_y, c.max_y
            )
        })
    }
}

impl ContentBox {
    /// Build a box, returning `None` when it is degenerate or inverted.
    pub fn new(min_x: u32, min_y: u32, max_x: u32, max_y: u32) -> Option<Self> {
        (min_x < max_x && min_y < max_y).then_some(Self {
            min_x,
            min_y,
            max_x,
            max_y,
        })
    }

    pub fn min_x(&self) -> u32 {
        self.min_x
    }

    pub fn min_y(&self) -> u32 {
        self.min_y
    }

    pub fn max_x(&self) -> u32 {
        self.max_x
    }

    pub fn max_y(&self) -> u32 {
        self.max_y
    }

    pub fn width(&self) -> u32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// `true` when the box lies within a `width` x `height` frame.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.max_x <= width && self.max_y <= height
    }
}

fn scan_index(extent: u32, frac: f64) -> u32 {
    ((extent as f64 * frac) as u32).min(extent.saturating_sub(1))
}

/// Ink extent `[min, max]` along one row.
fn row_ink_extent(gray: &GrayImage, y: u32, ink_threshold: u8) -> Option<[u32; 2]> {
    let mut extent: Option<[u32; 2]> = None;
    for x in 0..gray.width() {
        if gray.get_pixel(x, y)[0] < ink_threshold {
            extent = Some(match extent {
                Some([lo, _]) => [lo, x],
                None => [x, x],
            });
        }
    }
    extent
}

/// Ink extent `[min, max]` along one column.
fn column_ink_extent(gray: &GrayImage, x: u32, ink_threshold: u8) -> Option<[u32; 2]> {
    let mut extent: Option<[u32; 2]> = None;
    for y in 0..gray.height() {
        if gray.get_pixel(x, y)[0] < ink_threshold {
            extent = Some(match extent {
                Some([lo, _]) => [lo, y],
                None => [y, y],
            });
        }
    }
    extent
}

fn merge_extents(a: Option<[u32; 2]>, b: Option<[u32; 2]>) -> Option<[u32; 2]> {
    match (a, b) {
        (Some(a), Some(b)) => Some([a[0].min(b[0]), a[1].max(b[1])]),
        (a, None) => a,
        (None, b) => b,
    }
}

fn fixed_margin_box(width: u32, height: u32, margin_frac: f64) -> Option<ContentBox> {
    let mx = (width as f64 * margin_frac) as u32;
    let my = (height as f64 * margin_frac) as u32;
    ContentBox::new(mx, my, width.saturating_sub(mx), height.saturating_sub(my))
}

/// Locate the content box, or `None` when nothing plausible was found and the
/// policy is [`MissingContentPolicy::Reject`].
pub fn detect_content_box(
    gray: &GrayImage,
    ink_threshold: u8,
    config: &ContentBoxConfig,
) -> Option<ContentBox> {
    let (w, h) = gray.dimensions();
    if w < 2 || h < 2 {
        return None;
    }

    let y_mid = scan_index(h, config.horizontal_scan_frac);
    let x_extent = row_ink_extent(gray, y_mid, ink_threshold);
    let y_extent = config
        .vertical_scan_fracs
        .iter()
        .map(|&frac| column_ink_extent(gray, scan_index(w, frac), ink_threshold))
        .fold(None, merge_extents);

    let found = match (x_extent, y_extent) {
        (Some([x0, x1]), Some([y0, y1])) if x0 < x1 && y0 < y1 => {
            let pad_x = (w as f64 * config.expand_frac) as u32;
            let pad_y = (h as f64 * config.expand_frac) as u32;
            ContentBox::new(
                x0.saturating_sub(pad_x),
                y0.saturating_sub(pad_y),
                (x1 + pad_x).min(w),
                (y1 + pad_y).min(h),
            )
        }
        _ => None,
    };

    match (found, config.on_missing) {
        (Some(b), _) => Some(b),
        (None, MissingContentPolicy::Reject) => None,
        (None, MissingContentPolicy::FixedMargin { margin_frac }) => {
            tracing::debug!("no ink on sampling lines, using fixed {margin_frac} margin");
            fixed_margin_box(w, h, margin_frac)
        }
    }
}
