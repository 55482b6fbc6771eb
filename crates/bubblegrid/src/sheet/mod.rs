//! Sheet localization: where is the answer grid, and is it really one.

mod content_box;
mod validate;

pub use content_box::{detect_content_box, ContentBox, ContentBoxConfig, MissingContentPolicy};
pub use validate::{
    ink_coverage, measure_sheet, validate_sheet, SheetValidationConfig, ValidationMetrics,
};
