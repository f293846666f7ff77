mod filter;
mod history;
mod ids;
mod question;

pub use ids::{HistoryId, ParseIdError, QuestionId, SessionId};

pub use filter::{ExamSeries, ExamTypeCriterion, QuestionFilter, QuizMode};
pub use history::{HistoryEntry, NewHistoryEntry, latest_outcomes};
pub use question::{
    EMPTY_OPTION_PLACEHOLDER, NewQuestion, OptionLetter, Question, QuestionDraft, QuestionError,
    answers_match,
};
