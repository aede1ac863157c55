use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::answers::{AnswerState, AnswerValue};
use crate::spec::field::FieldSpec;
use crate::spec::questionnaire::{QuestionnaireSpec, SubmissionRule};

/// Completion bookkeeping stored alongside the answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DocumentMetadata {
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub completion_percentage: u32,
    pub compulsory_completed: bool,
    pub optional_completed: usize,
}

/// Structured output handed to the persona store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SubmissionDocument {
    pub subject_id: String,
    #[serde(default)]
    pub compulsory_fields: BTreeMap<String, AnswerValue>,
    #[serde(default)]
    pub optional_fields: BTreeMap<String, AnswerValue>,
    pub metadata: DocumentMetadata,
}

impl SubmissionDocument {
    /// Keeps the creation time of an earlier revision of the same document.
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.metadata.created_at = created_at;
        self
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_cbor(&self) -> Result<Vec<u8>, serde_cbor::Error> {
        serde_cbor::to_vec(self)
    }

    pub fn from_cbor(bytes: &[u8]) -> Result<Self, serde_cbor::Error> {
        serde_cbor::from_slice(bytes)
    }
}

/// Splits `answers` into compulsory and optional buckets and scores completion.
pub fn to_submission_document(
    spec: &QuestionnaireSpec,
    answers: &AnswerState,
    subject_id: &str,
    now: DateTime<Utc>,
) -> SubmissionDocument {
    let compulsory_fields = collect_bucket(&spec.compulsory_fields, answers, |value| {
        match spec.submission_rule {
            SubmissionRule::SourceCompatible => true,
            SubmissionRule::Uniform => !value.is_empty(),
        }
    });
    let optional_fields = collect_bucket(&spec.optional_fields, answers, |value| {
        match spec.submission_rule {
            SubmissionRule::SourceCompatible => value.as_str() != Some(""),
            SubmissionRule::Uniform => !value.is_empty(),
        }
    });

    let answered = compulsory_fields.len() + optional_fields.len();
    let metadata = DocumentMetadata {
        created_at: now,
        last_updated: now,
        completion_percentage: completion_percentage(answered, spec.total_fields()),
        compulsory_completed: compulsory_fields.len() == spec.compulsory_fields.len(),
        optional_completed: optional_fields.len(),
    };

    SubmissionDocument {
        subject_id: subject_id.to_string(),
        compulsory_fields,
        optional_fields,
        metadata,
    }
}

fn collect_bucket(
    fields: &[FieldSpec],
    answers: &AnswerState,
    keep: impl Fn(&AnswerValue) -> bool,
) -> BTreeMap<String, AnswerValue> {
    fields
        .iter()
        .filter_map(|field| {
            answers
                .get(&field.id)
                .filter(|value| keep(*value))
                .map(|value| (field.id.clone(), value.clone()))
        })
        .collect()
}

/// `round(100 * answered / total)` with halves rounded up; zero when `total` is zero.
pub fn completion_percentage(answered: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((200 * answered + total) / (2 * total)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_rounds_half_up() {
        assert_eq!(completion_percentage(0, 15), 0);
        assert_eq!(completion_percentage(13, 15), 87);
        assert_eq!(completion_percentage(1, 8), 13);
        assert_eq!(completion_percentage(1, 3), 33);
        assert_eq!(completion_percentage(15, 15), 100);
        assert_eq!(completion_percentage(3, 0), 0);
    }

    #[test]
    fn cbor_export_decodes_back() {
        let now = Utc::now();
        let document = SubmissionDocument {
            subject_id: "ada@example.com".into(),
            compulsory_fields: BTreeMap::from([("age".to_string(), AnswerValue::text("34"))]),
            optional_fields: BTreeMap::new(),
            metadata: DocumentMetadata {
                created_at: now,
                last_updated: now,
                completion_percentage: 7,
                compulsory_completed: false,
                optional_completed: 0,
            },
        };
        let bytes = document.to_cbor().expect("encode");
        let decoded = SubmissionDocument::from_cbor(&bytes).expect("decode");
        assert_eq!(decoded.subject_id, document.subject_id);
        assert_eq!(decoded.compulsory_fields, document.compulsory_fields);
    }
}
