use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

/// Stored in place of an option whose source text was blank.
pub const EMPTY_OPTION_PLACEHOLDER: &str = "-";

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyQuestionText,
}

//
// ─── OPTION LETTER ─────────────────────────────────────────────────────────────
//

/// One of the four answer slots of a question.
///
/// The exam labels its options with katakana (`ア イ ウ エ`); the ASCII
/// letters `A`..`D` are accepted as aliases in either case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OptionLetter {
    A,
    B,
    C,
    D,
}

impl OptionLetter {
    pub const ALL: [OptionLetter; 4] = [Self::A, Self::B, Self::C, Self::D];

    /// Parses a submitted or stored option label.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "ア" | "A" | "a" => Some(Self::A),
            "イ" | "B" | "b" => Some(Self::B),
            "ウ" | "C" | "c" => Some(Self::C),
            "エ" | "D" | "d" => Some(Self::D),
            _ => None,
        }
    }

    /// Canonical exam label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::A => "ア",
            Self::B => "イ",
            Self::C => "ウ",
            Self::D => "エ",
        }
    }
}

impl fmt::Display for OptionLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Compares a stored answer key with a submitted answer.
///
/// Both sides are compared as option letters when they parse as one,
/// otherwise as trimmed strings.
#[must_use]
pub fn answers_match(stored: &str, submitted: &str) -> bool {
    match (OptionLetter::parse(stored), OptionLetter::parse(submitted)) {
        (Some(expected), Some(given)) => expected == given,
        _ => stored.trim() == submitted.trim(),
    }
}

//
// ─── QUESTION TYPES ────────────────────────────────────────────────────────────
//

/// Raw question fields as they arrive from a tabular source.
///
/// Missing columns deserialize as empty values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct QuestionDraft {
    pub exam_type: String,
    pub category: String,
    pub scenario: Option<String>,
    pub question_text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub correct_answer: String,
    pub explanation: Option<String>,
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}

fn option_text(raw: String) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        EMPTY_OPTION_PLACEHOLDER.to_owned()
    } else {
        trimmed.to_owned()
    }
}

impl QuestionDraft {
    /// Normalizes the draft into an insertable question.
    ///
    /// Trims every field, replaces blank options with
    /// [`EMPTY_OPTION_PLACEHOLDER`] and maps blank scenario/explanation to `None`.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyQuestionText` if the question text is blank.
    pub fn validate(self) -> Result<NewQuestion, QuestionError> {
        let question_text = self.question_text.trim().to_owned();
        if question_text.is_empty() {
            return Err(QuestionError::EmptyQuestionText);
        }

        Ok(NewQuestion {
            exam_type: self.exam_type.trim().to_owned(),
            category: self.category.trim().to_owned(),
            scenario: non_empty(self.scenario),
            question_text,
            option_a: option_text(self.option_a),
            option_b: option_text(self.option_b),
            option_c: option_text(self.option_c),
            option_d: option_text(self.option_d),
            correct_answer: self.correct_answer.trim().to_owned(),
            explanation: non_empty(self.explanation),
        })
    }
}

/// A validated question that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestion {
    pub exam_type: String,
    pub category: String,
    pub scenario: Option<String>,
    pub question_text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub correct_answer: String,
    pub explanation: Option<String>,
}

impl NewQuestion {
    #[must_use]
    pub fn assign_id(self, id: QuestionId) -> Question {
        Question {
            id,
            exam_type: self.exam_type,
            category: self.category,
            scenario: self.scenario,
            question_text: self.question_text,
            option_a: self.option_a,
            option_b: self.option_b,
            option_c: self.option_c,
            option_d: self.option_d,
            correct_answer: self.correct_answer,
            explanation: self.explanation,
        }
    }
}

/// A persisted exam question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    pub id: QuestionId,
    pub exam_type: String,
    pub category: String,
    pub scenario: Option<String>,
    pub question_text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub correct_answer: String,
    pub explanation: Option<String>,
}

impl Question {
    /// Option text for the given slot.
    #[must_use]
    pub fn option(&self, letter: OptionLetter) -> &str {
        match letter {
            OptionLetter::A => &self.option_a,
            OptionLetter::B => &self.option_b,
            OptionLetter::C => &self.option_c,
            OptionLetter::D => &self.option_d,
        }
    }

    #[must_use]
    pub fn is_correct(&self, submitted: &str) -> bool {
        answers_match(&self.correct_answer, submitted)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
