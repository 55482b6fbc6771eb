//! bubblegrid: marker-free decoder for photographed multiple-choice answer sheets.
//!
//! Turns one camera frame of a printed bubble sheet into one selected option
//! (or none) per question. The pipeline stages are:
//!
//! 1. **Preprocess** – decode raw or base64 input, convert to grayscale,
//!    stretch contrast.
//! 2. **Content box** – find the grid's extent by scanning a central cross of
//!    sampling lines for ink.
//! 3. **Validate** – reject frames whose ink coverage or box geometry does not
//!    look like an answer sheet.
//! 4. **Grid** – derive nominal bubble positions from the box and the expected
//!    question count.
//! 5. **Locate** – snap each nominal position to the darkest pixel nearby.
//! 6. **Classify** – compare the four option brightnesses of a question
//!    through a relative-darkness cascade.
//! 7. **Assemble** – one answer per question, in order, with an optional
//!    diagnostic overlay.
//!
//! # Public API
//! - [`SheetDecoder`] as the primary entry point
//! - [`DecodeConfig`] for tuning every stage constant
//! - [`grade`] for comparing decoded answers with an [`AnswerKey`]
//!
//! The stage functions are exported as well so callers can run or inspect a
//! single stage.

mod api;
mod bubble;
mod config;
mod error;
mod grading;
mod grid;
mod overlay;
mod pipeline;
mod preprocess;
mod sheet;

#[cfg(test)]
pub(crate) mod test_utils;

pub use api::SheetDecoder;
pub use bubble::{
    classify_fill, locate_bubble, measure_brightness, BubbleSearchConfig, FillClassifierConfig,
    FillDecision, FillRule, OptionSample, QuestionReading,
};
pub use config::{DecodeConfig, DEFAULT_INK_THRESHOLD};
pub use error::{
    ConfigError, DecodeError, OverlayError, ScanError, SheetRejection, SHEET_NOT_FOUND_MARKER,
};
pub use grading::{grade, AnswerKey, GradeReport, GradedAnswer, KeyEntry};
pub use grid::{GridConfig, GridLayoutConfig};
pub use overlay::{render_overlay, OverlaySink, OverlayStyle, PngFileSink};
pub use pipeline::SheetScan;
pub use preprocess::{load_gray, stretch_contrast, ImageInput, PreprocessConfig};
pub use sheet::{
    detect_content_box, ink_coverage, measure_sheet, validate_sheet, ContentBox,
    ContentBoxConfig, MissingContentPolicy, SheetValidationConfig, ValidationMetrics,
};

/// Options per question (A-D).
pub const OPTIONS_PER_QUESTION: usize = 4;

/// Question count assumed when the caller does not supply one.
pub const DEFAULT_TOTAL_QUESTIONS: u32 = 100;

/// Decoded answer for one question.
///
/// Serialized with the wire names `questionNumber` / `selectedAnswer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionAnswer {
    /// One-based question number.
    pub question_number: u32,
    /// One-based selected option, `None` when blank or ambiguous.
    pub selected_answer: Option<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_answer_wire_names() {
        let a = QuestionAnswer {
            question_number: 3,
            selected_answer: None,
        };
        let json = serde_json::to_string(&a).expect("serialize");
        assert_eq!(json, r#"{"questionNumber":3,"selectedAnswer":null}"#);

        let back: QuestionAnswer =
            serde_json::from_str(r#"{"questionNumber":7,"selectedAnswer":2}"#).expect("parse");
        assert_eq!(back.question_number, 7);
        assert_eq!(back.selected_answer, Some(2));
    }
}
