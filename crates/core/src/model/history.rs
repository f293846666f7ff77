use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::ids::{HistoryId, QuestionId};

/// An answer outcome waiting to be appended to the history log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewHistoryEntry {
    pub question_id: QuestionId,
    pub is_correct: bool,
    pub answered_at: DateTime<Utc>,
}

impl NewHistoryEntry {
    #[must_use]
    pub fn new(question_id: QuestionId, is_correct: bool, answered_at: DateTime<Utc>) -> Self {
        Self {
            question_id,
            is_correct,
            answered_at,
        }
    }

    #[must_use]
    pub fn assign_id(self, id: HistoryId) -> HistoryEntry {
        HistoryEntry {
            id,
            question_id: self.question_id,
            is_correct: self.is_correct,
            answered_at: self.answered_at,
        }
    }
}

/// One recorded attempt at a question. Entries are never updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub id: HistoryId,
    pub question_id: QuestionId,
    pub is_correct: bool,
    pub answered_at: DateTime<Utc>,
}

/// Most recent outcome per question.
///
/// The latest entry is the one with the greatest `answered_at`; entries
/// sharing a timestamp are ordered by id.
#[must_use]
pub fn latest_outcomes<'a, I>(entries: I) -> HashMap<QuestionId, bool>
where
    I: IntoIterator<Item = &'a HistoryEntry>,
{
    let mut latest: HashMap<QuestionId, &HistoryEntry> = HashMap::new();
    for entry in entries {
        latest
            .entry(entry.question_id)
            .and_modify(|current| {
                if (entry.answered_at, entry.id) > (current.answered_at, current.id) {
                    *current = entry;
                }
            })
            .or_insert(entry);
    }
    latest
        .into_iter()
        .map(|(id, entry)| (id, entry.is_correct))
        .collect()
}
