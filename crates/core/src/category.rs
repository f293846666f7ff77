//! Keyword-based category assignment for past-exam questions.
//!
//! Source spreadsheets label questions with ad-hoc categories. The importer
//! can replace those with the syllabus sections below, chosen by keywords in
//! the question text and explanation.

/// Category used when no rule matches.
pub const DEFAULT_CATEGORY: &str = "2-1 法務";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryRule {
    pub category: &'static str,
    pub keywords: &'static [&'static str],
}

/// Rules in priority order; the first rule with a matching keyword wins.
pub const CLASSIFICATION_RULES: &[CategoryRule] = &[
    CategoryRule {
        category: "3-1 調査",
        keywords: &["J-PlatPat", "調査", "検索"],
    },
    CategoryRule {
        category: "5-2 エンフォースメント",
        keywords: &["侵害", "警告", "差止", "損害賠償"],
    },
    CategoryRule {
        category: "5-1 契約",
        keywords: &["ライセンス", "許諾", "譲渡", "契約"],
    },
    CategoryRule {
        category: "4-1 ブランド保護",
        keywords: &["商標", "ブランド"],
    },
    CategoryRule {
        category: "4-2 技術保護",
        keywords: &["特許", "発明", "実用新案"],
    },
    CategoryRule {
        category: "4-3 コンテンツ保護",
        keywords: &["著作権", "コンテンツ"],
    },
    CategoryRule {
        category: "4-4 デザイン保護",
        keywords: &["意匠", "デザイン"],
    },
    CategoryRule {
        category: "6. 関係法規",
        keywords: &["条約", "パリ", "PCT"],
    },
];

/// Picks a category for a question from its text and explanation.
#[must_use]
pub fn classify(question_text: &str, explanation: Option<&str>) -> &'static str {
    let haystack = format!("{question_text} {}", explanation.unwrap_or_default());
    CLASSIFICATION_RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|kw| haystack.contains(kw)))
        .map_or(DEFAULT_CATEGORY, |rule| rule.category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_matching_rule_wins() {
        // Mentions both infringement and patents; enforcement has priority.
        let category = classify("特許権の侵害に関して", None);
        assert_eq!(category, "5-2 エンフォースメント");
    }

    #[test]
    fn explanation_keywords_count() {
        let category = classify("次のうち最も適切なものはどれか。", Some("意匠法第3条参照。"));
        assert_eq!(category, "4-4 デザイン保護");
    }

    #[test]
    fn ascii_keywords_are_case_sensitive() {
        assert_eq!(classify("PCT出願について", None), "6. 関係法規");
        assert_eq!(classify("pct出願について", None), DEFAULT_CATEGORY);
    }

    #[test]
    fn unmatched_text_falls_back_to_default() {
        assert_eq!(classify("会社法に関する問題", None), DEFAULT_CATEGORY);
    }
}
