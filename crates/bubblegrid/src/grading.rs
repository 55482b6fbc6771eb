//! Scoring decoded answers against an answer key.
//!
//! Keys use the same camelCase field names as decoded answers, so key records
//! exported by an upstream service load directly. Extra fields (question
//! text, option labels) are ignored.

use std::collections::HashMap;
use std::path::Path;

use crate::error::ConfigError;
use crate::{QuestionAnswer, OPTIONS_PER_QUESTION};

/// Correct option for one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyEntry {
    pub question_number: u32,
    pub correct_answer: u8,
}

/// Answer key for one exam.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerKey {
    #[serde(default)]
    pub name: String,
    /// Question count handed to the decoder.
    pub total_questions: u32,
    #[serde(alias = "questions")]
    pub answers: Vec<KeyEntry>,
}

impl AnswerKey {
    /// Load an answer key from a JSON file and validate it.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    pub fn from_json_str(data: &str) -> Result<Self, ConfigError> {
        let key: Self = serde_json::from_str(data)?;
        key.validate()?;
        Ok(key)
    }

    /// Question count must be positive and every correct answer a valid option.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_questions == 0 {
            return Err(ConfigError::Invalid(
                "answer key totalQuestions must be at least 1".into(),
            ));
        }
        for entry in &self.answers {
            if !(1..=OPTIONS_PER_QUESTION as u8).contains(&entry.correct_answer) {
                return Err(ConfigError::Invalid(format!(
                    "question {} has correct answer {}, expected 1..={}",
                    entry.question_number, entry.correct_answer, OPTIONS_PER_QUESTION
                )));
            }
        }
        Ok(())
    }
}

/// One decoded answer next to the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradedAnswer {
    pub question_number: u32,
    pub selected_answer: Option<u8>,
    /// `None` when the key has no entry for this question.
    pub correct_answer: Option<u8>,
    pub is_correct: bool,
}

/// Aggregate score of one sheet.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeReport {
    pub total_questions: u32,
    pub correct_answers: u32,
    /// Everything not correct, blanks included.
    pub wrong_answers: u32,
    pub score: u32,
    /// `correct / total * 100`, rounded to two decimals.
    pub percentage: f64,
    pub answers: Vec<GradedAnswer>,
}

/// Compare decoded answers with a key.
///
/// Key entries are matched by question number. A blank answer never counts
/// as correct.
pub fn grade(key: &AnswerKey, answers: &[QuestionAnswer]) -> GradeReport {
    let correct_by_question: HashMap<u32, u8> = key
        .answers
        .iter()
        .map(|e| (e.question_number, e.correct_answer))
        .collect();

    let graded: Vec<GradedAnswer> = answers
        .iter()
        .map(|a| {
            let correct_answer = correct_by_question.get(&a.question_number).copied();
            GradedAnswer {
                question_number: a.question_number,
                selected_answer: a.selected_answer,
                correct_answer,
                is_correct: correct_answer.is_some() && a.selected_answer == correct_answer,
            }
        })
        .collect();

    let total = graded.len() as u32;
    let correct = graded.iter().filter(|g| g.is_correct).count() as u32;
    let percentage = if total == 0 {
        0.0
    } else {
        (correct as f64 / total as f64 * 100.0 * 100.0).round() / 100.0
    };

    GradeReport {
        total_questions: total,
        correct_answers: correct,
        wrong_answers: total - correct,
        score: correct,
        percentage,
        answers: graded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(selected: &[Option<u8>]) -> Vec<QuestionAnswer> {
        selected
            .iter()
            .enumerate()
            .map(|(i, &s)| QuestionAnswer {
                question_number: i as u32 + 1,
                selected_answer: s,
            })
            .collect()
    }

    fn key(correct: &[u8]) -> AnswerKey {
        AnswerKey {
            name: "quiz".into(),
            total_questions: correct.len() as u32,
            answers: correct
                .iter()
                .enumerate()
                .map(|(i, &c)| KeyEntry {
                    question_number: i as u32 + 1,
                    correct_answer: c,
                })
                .collect(),
        }
    }

    #[test]
    fn counts_blanks_as_wrong() {
        let report = grade(&key(&[1, 2, 3]), &answers(&[Some(1), None, Some(4)]));
        assert_eq!(report.total_questions, 3);
        assert_eq!(report.correct_answers, 1);
        assert_eq!(report.wrong_answers, 2);
        assert_eq!(report.score, 1);
        assert_eq!(report.percentage, 33.33);
        assert!(report.answers[0].is_correct);
        assert!(!report.answers[1].is_correct);
        assert_eq!(report.answers[2].correct_answer, Some(3));
    }

    #[test]
    fn missing_key_entry_is_never_correct() {
        let mut k = key(&[1, 1]);
        k.answers.pop();
        let report = grade(&k, &answers(&[Some(1), Some(1)]));
        assert_eq!(report.answers[1].correct_answer, None);
        assert!(!report.answers[1].is_correct);
        assert_eq!(report.percentage, 50.0);
    }

    #[test]
    fn empty_answers_score_zero() {
        let report = grade(&key(&[1]), &[]);
        assert_eq!(report.total_questions, 0);
        assert_eq!(report.percentage, 0.0);
    }

    #[test]
    fn loads_upstream_key_records() {
        let json = r#"{
            "name": "Physics midterm",
            "totalQuestions": 2,
            "questions": [
                { "questionNumber": 1, "question": "?", "options": [], "correctAnswer": 2 },
                { "questionNumber": 2, "question": "?", "options": [], "correctAnswer": 4 }
            ]
        }"#;
        let k = AnswerKey::from_json_str(json).expect("parse key");
        assert_eq!(k.total_questions, 2);
        assert_eq!(k.answers[1].correct_answer, 4);

        let bad = r#"{ "totalQuestions": 1, "answers": [ { "questionNumber": 1, "correctAnswer": 5 } ] }"#;
        assert!(matches!(
            AnswerKey::from_json_str(bad),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn report_uses_camel_case() {
        let report = grade(&key(&[2]), &answers(&[Some(2)]));
        let v = serde_json::to_value(&report).unwrap();
        assert_eq!(v["correctAnswers"], 1);
        assert_eq!(v["answers"][0]["isCorrect"], true);
        assert_eq!(v["percentage"], 100.0);
    }
}
