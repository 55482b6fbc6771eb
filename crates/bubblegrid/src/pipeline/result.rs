use crate::bubble::QuestionReading;
use crate::grid::GridConfig;
use crate::sheet::{ContentBox, ValidationMetrics};
use crate::QuestionAnswer;

/// Full decode result with per-stage diagnostics.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SheetScan {
    /// Frame size as `[width, height]`.
    pub image_size: [u32; 2],
    /// Detected content box.
    pub content_box: ContentBox,
    /// Measurements the validator accepted.
    pub metrics: ValidationMetrics,
    /// Grid geometry used for the nominal bubble positions.
    pub grid: GridConfig,
    /// One reading per question, in question order.
    pub questions: Vec<QuestionReading>,
}

impl SheetScan {
    /// The contract output: one answer per question, in order.
    pub fn answers(&self) -> Vec<QuestionAnswer> {
        self.questions
            .iter()
            .map(|q| QuestionAnswer {
                question_number: q.question_number,
                selected_answer: q.selected_answer(),
            })
            .collect()
    }

    /// Number of questions with a selected option.
    pub fn answered_count(&self) -> usize {
        self.questions
            .iter()
            .filter(|q| q.selected_answer().is_some())
            .count()
    }
}
