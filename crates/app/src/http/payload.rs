//! Request and response bodies of the JSON API.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, de};

use quiz_core::model::QuestionId;

/// Query string of `GET /api/questions`.
#[derive(Debug, Default, Deserialize)]
pub struct QuestionsQuery {
    pub mode: Option<String>,
    pub exam_series: Option<String>,
    pub category: Option<String>,
}

/// Query string of `GET /api/check/{id}`.
#[derive(Debug, Deserialize)]
pub struct CheckQuery {
    pub answer: String,
}

/// Body of `POST /api/record`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RecordRequest {
    #[serde(deserialize_with = "question_id_from_number_or_string")]
    pub question_id: QuestionId,
    pub is_correct: bool,
}

impl RecordRequest {
    /// Parse a body regardless of its declared content type.
    ///
    /// # Errors
    ///
    /// Returns the JSON error for malformed bodies or missing fields.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Ack {
    pub ok: bool,
}

impl Ack {
    pub const OK: Self = Self { ok: true };
}

fn question_id_from_number_or_string<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<QuestionId, D::Error> {
    struct Vis;

    impl de::Visitor<'_> for Vis {
        type Value = QuestionId;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a question id as number or numeric string")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<QuestionId, E> {
            Ok(QuestionId::new(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<QuestionId, E> {
            u64::try_from(v)
                .map(QuestionId::new)
                .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<QuestionId, E> {
            v.parse().map_err(E::custom)
        }
    }

    d.deserialize_any(Vis)
}
