use serde::{Deserialize, Serialize};

/// A title awarded once a combo reaches `threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComboTitle {
    pub threshold: u32,
    pub title: &'static str,
}

/// Title table, highest threshold first.
pub const COMBO_TITLES: [ComboTitle; 5] = [
    ComboTitle {
        threshold: 50,
        title: "知財の神",
    },
    ComboTitle {
        threshold: 30,
        title: "弁理士レベル",
    },
    ComboTitle {
        threshold: 20,
        title: "歩く知的財産権法",
    },
    ComboTitle {
        threshold: 10,
        title: "特許庁の注目株",
    },
    ComboTitle {
        threshold: 5,
        title: "駆け出し知財担当",
    },
];

/// Returns the title of the first table row the combo reaches.
#[must_use]
pub fn title_for_combo(combo: u32) -> Option<&'static str> {
    COMBO_TITLES
        .iter()
        .find(|row| combo >= row.threshold)
        .map(|row| row.title)
}

/// Consecutive-correct-answer counter for one quiz session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboTracker {
    count: u32,
}

impl ComboTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Applies one answer outcome and returns the new combo.
    pub fn record(&mut self, correct: bool) -> u32 {
        self.count = if correct {
            self.count.saturating_add(1)
        } else {
            0
        };
        self.count
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }

    #[must_use]
    pub fn title(&self) -> Option<&'static str> {
        title_for_combo(self.count)
    }
}
