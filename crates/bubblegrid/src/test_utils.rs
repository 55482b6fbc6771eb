//! Shared test utilities: rectangle painting and synthetic answer sheets.

use image::{GrayImage, Luma};

use crate::grid::{GridConfig, GridLayoutConfig};
use crate::sheet::ContentBox;
use crate::OPTIONS_PER_QUESTION;

/// Paint the inclusive rectangle `[x0, x1] x [y0, y1]`, clipped to the image.
pub(crate) fn fill_rect(img: &mut GrayImage, x0: u32, y0: u32, x1: u32, y1: u32, value: u8) {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return;
    }
    for y in y0..=y1.min(h - 1) {
        for x in x0..=x1.min(w - 1) {
            img.put_pixel(x, y, Luma([value]));
        }
    }
}

pub(crate) const BLANK_LEVEL: u8 = 220;
pub(crate) const FILLED_LEVEL: u8 = 60;
const PAPER_LEVEL: u8 = 255;
const PRINT_LEVEL: u8 = 0;
const RULE_THICKNESS: u32 = 10;
const INK_INSET: u32 = 40;

/// A rendered sheet with its ground truth.
pub(crate) struct SyntheticSheet {
    pub image: GrayImage,
    /// Filled option per question, `None` where the question was left blank.
    pub answers: Vec<Option<u8>>,
    /// Content box the detector is expected to report.
    pub content_box: ContentBox,
}

/// Deterministic answer pattern used by the default fixture.
pub(crate) fn pattern_answer(index: u32) -> u8 {
    ((index * 7 + index / 3) % OPTIONS_PER_QUESTION as u32) as u8 + 1
}

/// Render a printed answer sheet.
///
/// The printed frame is made of full-width horizontal rules: a top and bottom
/// bar, one through the vertical center, and one on every interior row
/// boundary. Option cells are squares of `BLANK_LEVEL`, the marked option of
/// each answered question is `FILLED_LEVEL`. Cells are centered on the grid's
/// nominal bubble positions for the content box the detector will find.
pub(crate) fn render_sheet(width: u32, height: u32, answers: &[Option<u8>]) -> SyntheticSheet {
    let mut img = GrayImage::from_pixel(width, height, Luma([PAPER_LEVEL]));
    let left = INK_INSET;
    let right = width - INK_INSET - 1;
    let top = INK_INSET;
    let bottom = height - INK_INSET - 1;

    let pad_x = (width as f64 * 0.02) as u32;
    let pad_y = (height as f64 * 0.02) as u32;
    let content_box = ContentBox::new(
        left - pad_x,
        top - pad_y,
        (right + pad_x).min(width),
        (bottom + pad_y).min(height),
    )
    .expect("fixture box");

    let total = answers.len() as u32;
    let grid = GridConfig::new(&content_box, total, &GridLayoutConfig::default());

    let rule = |img: &mut GrayImage, y_center: u32| {
        let y0 = y_center - RULE_THICKNESS / 2;
        fill_rect(img, left, y0, right, y0 + RULE_THICKNESS - 1, PRINT_LEVEL);
    };
    fill_rect(&mut img, left, top, right, top + RULE_THICKNESS - 1, PRINT_LEVEL);
    fill_rect(&mut img, left, bottom + 1 - RULE_THICKNESS, right, bottom, PRINT_LEVEL);
    rule(&mut img, height / 2);
    for r in 1..grid.rows {
        rule(&mut img, (grid.margin_y + r as f64 * grid.row_height).round() as u32);
    }

    let half = (grid.option_width * 0.3).floor() as u32;
    for (index, answer) in answers.iter().enumerate() {
        for option in 1..=OPTIONS_PER_QUESTION as u8 {
            let [cx, cy] = grid.option_center(index as u32, option);
            let (cx, cy) = (cx.round() as u32, cy.round() as u32);
            let level = if *answer == Some(option) {
                FILLED_LEVEL
            } else {
                BLANK_LEVEL
            };
            fill_rect(&mut img, cx - half, cy - half, cx + half, cy + half, level);
        }
    }

    SyntheticSheet {
        image: img,
        answers: answers.to_vec(),
        content_box,
    }
}

/// The 1000x1400, 100-question fixture with every question answered.
pub(crate) fn standard_sheet() -> SyntheticSheet {
    let answers: Vec<Option<u8>> = (0..100).map(|i| Some(pattern_answer(i))).collect();
    render_sheet(1000, 1400, &answers)
}

/// Encode a grayscale image as PNG bytes.
pub(crate) fn encode_png(img: &GrayImage) -> Vec<u8> {
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .expect("png encode");
    buf.into_inner()
}
