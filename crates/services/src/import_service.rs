use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use quiz_core::category::classify;
use quiz_core::model::{NewQuestion, QuestionDraft};
use storage::repository::QuestionRepository;

use crate::error::ImportError;

const UTF8_BOM: char = '\u{feff}';

/// Files feeding a bulk reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSources {
    /// Past exam questions. Must exist.
    pub primary: PathBuf,
    /// AI-generated practice questions. Skipped when absent.
    pub supplementary: Option<PathBuf>,
    /// Reassign primary-source categories with the keyword classifier.
    pub reclassify_primary: bool,
}

impl ImportSources {
    #[must_use]
    pub fn new(primary: impl Into<PathBuf>) -> Self {
        Self {
            primary: primary.into(),
            supplementary: None,
            reclassify_primary: false,
        }
    }

    #[must_use]
    pub fn with_supplementary(mut self, path: impl Into<PathBuf>) -> Self {
        self.supplementary = Some(path.into());
        self
    }

    #[must_use]
    pub fn reclassify(mut self, enabled: bool) -> Self {
        self.reclassify_primary = enabled;
        self
    }
}

/// Outcome of loading one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub path: PathBuf,
    pub inserted: u64,
    pub skipped: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub primary: SourceReport,
    pub supplementary: Option<SourceReport>,
}

impl ImportReport {
    #[must_use]
    pub fn total(&self) -> u64 {
        self.primary.inserted + self.supplementary.as_ref().map_or(0, |s| s.inserted)
    }
}

/// Rows parsed from one source: accepted questions and the number of rows
/// dropped for blank question text.
#[derive(Debug, Default)]
pub struct ParsedRows {
    pub questions: Vec<NewQuestion>,
    pub skipped: u64,
}

/// Parse CSV with a header row naming the question columns.
///
/// Unknown columns are ignored and missing columns read as empty.
///
/// # Errors
///
/// Returns the underlying `csv::Error` for malformed input.
pub fn parse_csv<R: Read>(reader: R) -> Result<ParsedRows, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(reader);

    let mut parsed = ParsedRows::default();
    for row in reader.deserialize::<QuestionDraft>() {
        match row?.validate() {
            Ok(question) => parsed.questions.push(question),
            Err(_) => parsed.skipped += 1,
        }
    }
    Ok(parsed)
}

fn read_source(path: &Path) -> Result<ParsedRows, ImportError> {
    let content = std::fs::read_to_string(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let content = content.strip_prefix(UTF8_BOM).unwrap_or(&content);
    parse_csv(content.as_bytes()).map_err(|source| ImportError::Csv {
        path: path.to_path_buf(),
        source,
    })
}

/// Bulk loader that replaces the question table from tabular sources.
#[derive(Clone)]
pub struct ImportService {
    questions: Arc<dyn QuestionRepository>,
}

impl ImportService {
    #[must_use]
    pub fn new(questions: Arc<dyn QuestionRepository>) -> Self {
        Self { questions }
    }

    /// Delete every question, then load the primary source followed by the
    /// supplementary one.
    ///
    /// Both files are parsed before anything is deleted, so a parse failure
    /// leaves the store untouched. Deleting questions also deletes their
    /// history.
    ///
    /// # Errors
    ///
    /// Returns `ImportError::MissingSource` when the primary file does not
    /// exist, `ImportError::Io`/`ImportError::Csv` when a file cannot be read,
    /// or `ImportError::Storage` if the replacement fails.
    pub async fn reload(&self, sources: &ImportSources) -> Result<ImportReport, ImportError> {
        if !sources.primary.is_file() {
            return Err(ImportError::MissingSource(sources.primary.clone()));
        }

        let mut primary = read_source(&sources.primary)?;
        if sources.reclassify_primary {
            for question in &mut primary.questions {
                question.category =
                    classify(&question.question_text, question.explanation.as_deref()).to_owned();
            }
        }

        let supplementary = match &sources.supplementary {
            Some(path) if path.is_file() => Some((path.clone(), read_source(path)?)),
            Some(path) => {
                tracing::warn!(path = %path.display(), "supplementary source not found, skipping");
                Some((path.clone(), ParsedRows::default()))
            }
            None => None,
        };

        let mut batch = primary.questions.clone();
        if let Some((_, rows)) = &supplementary {
            batch.extend(rows.questions.iter().cloned());
        }
        let inserted = self.questions.replace_all(&batch).await?;

        let report = ImportReport {
            primary: SourceReport {
                path: sources.primary.clone(),
                inserted: primary.questions.len() as u64,
                skipped: primary.skipped,
            },
            supplementary: supplementary.map(|(path, rows)| SourceReport {
                path,
                inserted: rows.questions.len() as u64,
                skipped: rows.skipped,
            }),
        };
        debug_assert_eq!(report.total(), inserted);

        tracing::info!(
            primary = report.primary.inserted,
            supplementary = report.supplementary.as_ref().map_or(0, |s| s.inserted),
            total = inserted,
            "reloaded questions"
        );
        Ok(report)
    }

    /// Replace the question table with the built-in sample set.
    ///
    /// # Errors
    ///
    /// Returns `ImportError::Storage` if the replacement fails.
    pub async fn seed_samples(&self) -> Result<u64, ImportError> {
        let samples: Vec<NewQuestion> = sample_questions()
            .into_iter()
            .filter_map(|draft| draft.validate().ok())
            .collect();
        let inserted = self.questions.replace_all(&samples).await?;
        tracing::info!(inserted, "seeded sample questions");
        Ok(inserted)
    }
}

/// Three sample questions for local development.
#[must_use]
pub fn sample_questions() -> Vec<QuestionDraft> {
    vec![
        QuestionDraft {
            exam_type: "第52回 学科".into(),
            category: "特許法（職務発明）".into(),
            scenario: None,
            question_text: "ア～エを比較して、職務発明に関して、最も適切と考えられるものはどれか。".into(),
            option_a: "従業者が職務発明を完成した場合であっても、当該従業者がその職務発明について特許を受ける権利を、その発生したときから有しないことがある。".into(),
            option_b: "企業の取締役は、特許法に規定される「従業者等」に含まれない。".into(),
            option_c: "従業者が特許を受ける権利を会社に譲渡した場合、予め契約により定めのある場合に限り会社から相当の利益を受ける権利を得る。".into(),
            option_d: "従業者が職務発明について特許権を取得した場合において会社がその発明を実施しようとする場合には、会社は特許権を取得した従業者から実施の許諾を受ける必要がある。".into(),
            correct_answer: "ウ".into(),
            explanation: Some("特許法第35条参照。相当の利益を受ける権利は、契約等により定められる。".into()),
        },
        QuestionDraft {
            exam_type: "第52回 学科".into(),
            category: "著作権法（公衆送信権）".into(),
            scenario: None,
            question_text: "ア～エを比較して、公衆送信権等に関して、最も不適切と考えられるものはどれか。".into(),
            option_a: "プログラムの著作物を同一構内における電気通信設備により送信することは、公衆送信に該当する。".into(),
            option_b: "公衆送信は、公衆によって直接受信されることを目的とした無線通信又は有線電気通信の送信のことであるため、放送・有線放送の他、自動公衆送信も含まれる。".into(),
            option_c: "レコード製作者の送信可能化権の対象となるのは、商業用レコードのみである。".into(),
            option_d: "複製権又は公衆送信権を有する者は、出版権を設定することができる。".into(),
            correct_answer: "イ".into(),
            explanation: Some("同一構内送信は公衆送信から除かれるが、プログラムの著作物は例外として公衆送信に含まれる。".into()),
        },
        QuestionDraft {
            exam_type: "第52回 実技".into(),
            category: "特許法（侵害・訴訟）".into(),
            scenario: Some("材料メーカーX社は、プラスチックAに関する特許権Pを有している。X社の知的財産部の部員は、他社が販売しているプラスチックを調査したところ、Y社が販売しているプラスチックBで特許権Pに係る特許発明が実施されていることが判明したため、差止請求訴訟,損害賠償請求訴訟を提起することを検討している。".into()),
            question_text: "ア～エを比較して、部員の発言として、最も適切と考えられるものを1つ選びなさい。".into(),
            option_a: "「わが社はW社に対して特許権Pの全範囲について専用実施権を設定していますが、わが社はY社に対して特許権Pに基づいて差止請求訴訟を提起することができます。」".into(),
            option_b: "「わが社は、差止請求をするに際し、Y社が販売しているプラスチックBの廃棄を請求することはできません。」".into(),
            option_c: "「特許権PについてY社の侵害行為に対する損害賠償が認められた場合、Y社に対して刑事罰の適用はありません。」".into(),
            option_d: "「Y社による特許権Pの侵害における過失の立証責任はわが社にありますので、早急に証拠を収集しましょう。」".into(),
            correct_answer: "ア".into(),
            explanation: Some("専用実施権を設定した後でも、特許権者は差止請求権を有する（判例・通説）。".into()),
        },
    ]
}
