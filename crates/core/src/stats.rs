use serde::Serialize;

/// Attempt counts for one category, as aggregated from the history log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTally {
    pub category: String,
    pub total: u64,
    pub correct: u64,
}

impl CategoryTally {
    #[must_use]
    pub fn new(category: impl Into<String>, total: u64, correct: u64) -> Self {
        Self {
            category: category.into(),
            total,
            correct,
        }
    }

    #[must_use]
    pub fn percent(&self) -> u64 {
        accuracy_percent(self.correct, self.total)
    }
}

/// `round(100 * correct / total)` with ties rounded to even.
///
/// Returns 0 when there are no attempts.
#[must_use]
pub fn accuracy_percent(correct: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    let scaled = correct.saturating_mul(100);
    let quotient = scaled / total;
    let twice_remainder = (scaled % total) * 2;
    if twice_remainder > total || (twice_remainder == total && quotient % 2 == 1) {
        quotient + 1
    } else {
        quotient
    }
}
