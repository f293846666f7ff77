use crate::model::question::Question;

/// Exam sittings grouped under the "past exams" series.
pub const PAST_SITTINGS: [&str; 3] = ["第50回", "第51回", "第52回"];

/// `exam_type` label used for AI-generated mock questions.
pub const AI_EXAM_TYPE: &str = "AI模擬";

/// Which questions a listing should consider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QuizMode {
    #[default]
    All,
    /// Only questions whose most recent recorded outcome was incorrect.
    Review,
}

impl QuizMode {
    /// Parses the `mode` query value; anything but `review` lists everything.
    #[must_use]
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("review") => Self::Review,
            _ => Self::All,
        }
    }
}

/// A named grouping of `exam_type` labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExamSeries {
    /// Every past sitting in [`PAST_SITTINGS`].
    Past,
    /// AI-generated mock questions.
    Ai,
    /// A single past sitting, e.g. `第52回`.
    Sitting(&'static str),
}

/// How an `ExamSeries` constrains the `exam_type` column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExamTypeCriterion {
    /// `exam_type` starts with any of the prefixes.
    AnyPrefix(Vec<&'static str>),
    /// `exam_type` equals the value.
    Exact(&'static str),
}

impl ExamSeries {
    /// Parses the `exam_series` query value.
    ///
    /// Returns `None` for unknown values, which callers treat as "no
    /// restriction".
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        match raw {
            "past" => Some(Self::Past),
            "ai" => Some(Self::Ai),
            _ => PAST_SITTINGS
                .iter()
                .find(|sitting| **sitting == raw)
                .map(|sitting| Self::Sitting(sitting)),
        }
    }

    #[must_use]
    pub fn criterion(self) -> ExamTypeCriterion {
        match self {
            Self::Past => ExamTypeCriterion::AnyPrefix(PAST_SITTINGS.to_vec()),
            Self::Ai => ExamTypeCriterion::Exact(AI_EXAM_TYPE),
            Self::Sitting(sitting) => ExamTypeCriterion::AnyPrefix(vec![sitting]),
        }
    }

    #[must_use]
    pub fn matches(self, exam_type: &str) -> bool {
        match self.criterion() {
            ExamTypeCriterion::AnyPrefix(prefixes) => {
                prefixes.iter().any(|prefix| exam_type.starts_with(prefix))
            }
            ExamTypeCriterion::Exact(value) => exam_type == value,
        }
    }
}

/// Criteria for listing questions. All present criteria must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionFilter {
    pub mode: QuizMode,
    pub exam_series: Option<ExamSeries>,
    pub category: Option<String>,
}

impl QuestionFilter {
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn review() -> Self {
        Self {
            mode: QuizMode::Review,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_exam_series(mut self, series: ExamSeries) -> Self {
        self.exam_series = Some(series);
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Checks the column criteria (exam series and category) against a question.
    ///
    /// Review mode depends on history and is evaluated by the repository.
    #[must_use]
    pub fn matches_columns(&self, question: &Question) -> bool {
        let series_ok = self
            .exam_series
            .is_none_or(|series| series.matches(&question.exam_type));
        let category_ok = self
            .category
            .as_deref()
            .is_none_or(|category| question.category == category);
        series_ok && category_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QuestionDraft, QuestionId};

    fn question(exam_type: &str, category: &str) -> Question {
        QuestionDraft {
            exam_type: exam_type.into(),
            category: category.into(),
            question_text: "Q".into(),
            correct_answer: "ア".into(),
            ..QuestionDraft::default()
        }
        .validate()
        .unwrap()
        .assign_id(QuestionId::new(1))
    }

    #[test]
    fn parses_known_series_and_ignores_unknown() {
        assert_eq!(ExamSeries::parse("past"), Some(ExamSeries::Past));
        assert_eq!(ExamSeries::parse("ai"), Some(ExamSeries::Ai));
        assert_eq!(
            ExamSeries::parse("第51回"),
            Some(ExamSeries::Sitting("第51回"))
        );
        assert_eq!(ExamSeries::parse("第49回"), None);
        assert_eq!(ExamSeries::parse(""), None);
    }

    #[test]
    fn past_series_matches_every_sitting_prefix() {
        assert!(ExamSeries::Past.matches("第50回 学科"));
        assert!(ExamSeries::Past.matches("第52回 実技"));
        assert!(!ExamSeries::Past.matches("AI模擬"));
    }

    #[test]
    fn ai_series_requires_exact_label() {
        assert!(ExamSeries::Ai.matches("AI模擬"));
        assert!(!ExamSeries::Ai.matches("AI模擬 追加"));
    }

    #[test]
    fn mode_param_only_recognizes_review() {
        assert_eq!(QuizMode::from_param(Some("review")), QuizMode::Review);
        assert_eq!(QuizMode::from_param(Some("all")), QuizMode::All);
        assert_eq!(QuizMode::from_param(None), QuizMode::All);
    }

    #[test]
    fn column_criteria_intersect() {
        let filter = QuestionFilter::all()
            .with_exam_series(ExamSeries::Sitting("第52回"))
            .with_category("特許法");
        assert!(filter.matches_columns(&question("第52回 学科", "特許法")));
        assert!(!filter.matches_columns(&question("第51回 学科", "特許法")));
        assert!(!filter.matches_columns(&question("第52回 学科", "著作権法")));
    }
}
