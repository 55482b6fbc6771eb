//! Answer-grid geometry derived from the content box and question count.
//!
//! Questions run left to right, `questions_per_row` per row. Each question
//! occupies a block of `question_width` x `row_height` holding
//! [`OPTIONS_PER_QUESTION`](crate::OPTIONS_PER_QUESTION) bubbles side by side.
//! The fractional offsets locate the bubbles inside a block; they depend on
//! the printed template and are meant to be calibrated per sheet design.

use crate::sheet::ContentBox;

/// Template-dependent layout parameters.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridLayoutConfig {
    /// Questions per grid row.
    pub questions_per_row: u32,
    /// `option_width = question_width / option_width_divisor`.
    pub option_width_divisor: f64,
    /// Block anchor x offset, as a fraction of question width.
    pub block_x_offset: f64,
    /// Block anchor y offset, as a fraction of row height.
    pub block_y_offset: f64,
    /// Bubble center x offset within its option slot, as a fraction of option width.
    pub option_x_offset: f64,
}

impl Default for GridLayoutConfig {
    fn default() -> Self {
        Self {
            questions_per_row: 10,
            option_width_divisor: 4.2,
            block_x_offset: 0.15,
            block_y_offset: 0.55,
            option_x_offset: 0.6,
        }
    }
}

/// Resolved grid geometry in image pixels.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GridConfig {
    pub questions_per_row: u32,
    pub rows: u32,
    pub margin_x: f64,
    pub margin_y: f64,
    pub content_width: f64,
    pub content_height: f64,
    pub row_height: f64,
    pub question_width: f64,
    pub option_width: f64,
    block_x_offset: f64,
    block_y_offset: f64,
    option_x_offset: f64,
}

impl GridConfig {
    /// Lay out `total_questions` questions over the content box.
    pub fn new(content: &ContentBox, total_questions: u32, layout: &GridLayoutConfig) -> Self {
        let questions_per_row = layout.questions_per_row.max(1);
        let rows = total_questions.div_ceil(questions_per_row).max(1);
        let content_width = content.width() as f64;
        let content_height = content.height() as f64;
        let question_width = content_width / questions_per_row as f64;
        Self {
            questions_per_row,
            rows,
            margin_x: content.min_x() as f64,
            margin_y: content.min_y() as f64,
            content_width,
            content_height,
            row_height: content_height / rows as f64,
            question_width,
            option_width: question_width / layout.option_width_divisor,
            block_x_offset: layout.block_x_offset,
            block_y_offset: layout.block_y_offset,
            option_x_offset: layout.option_x_offset,
        }
    }

    /// `(row, col)` of a zero-based question index.
    pub fn cell(&self, index: u32) -> (u32, u32) {
        (index / self.questions_per_row, index % self.questions_per_row)
    }

    /// Nominal anchor of a question block (zero-based index).
    pub fn block_center(&self, index: u32) -> [f64; 2] {
        let (row, col) = self.cell(index);
        [
            self.margin_x + col as f64 * self.question_width + self.question_width * self.block_x_offset,
            self.margin_y + row as f64 * self.row_height + self.row_height * self.block_y_offset,
        ]
    }

    /// Nominal bubble center for a zero-based question index and a one-based
    /// option number.
    pub fn option_center(&self, index: u32, option: u8) -> [f64; 2] {
        let [bx, by] = self.block_center(index);
        let slot = option.saturating_sub(1) as f64;
        [
            bx + slot * self.option_width + self.option_width * self.option_x_offset,
            by,
        ]
    }
}
