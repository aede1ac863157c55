//! JSON shapes exchanged with the persona store.
//!
//! The store nests the two answer buckets under `persona` and keys the record
//! by `user_id`; the engine's [`SubmissionDocument`] keeps them flat.

use std::collections::BTreeMap;

use persona_spec::{AnswerValue, DocumentMetadata, SubmissionDocument};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaFields {
    #[serde(default)]
    pub compulsory_fields: BTreeMap<String, AnswerValue>,
    #[serde(default)]
    pub optional_fields: BTreeMap<String, AnswerValue>,
}

/// Body of `POST /store_persona` and the `data` of `GET /get_persona`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaRecord {
    pub user_id: String,
    pub persona: PersonaFields,
    pub persona_metadata: DocumentMetadata,
}

impl From<&SubmissionDocument> for PersonaRecord {
    fn from(document: &SubmissionDocument) -> Self {
        Self {
            user_id: document.subject_id.clone(),
            persona: PersonaFields {
                compulsory_fields: document.compulsory_fields.clone(),
                optional_fields: document.optional_fields.clone(),
            },
            persona_metadata: document.metadata.clone(),
        }
    }
}

impl From<PersonaRecord> for SubmissionDocument {
    fn from(record: PersonaRecord) -> Self {
        SubmissionDocument {
            subject_id: record.user_id,
            compulsory_fields: record.persona.compulsory_fields,
            optional_fields: record.persona.optional_fields,
            metadata: record.persona_metadata,
        }
    }
}

/// Envelope every store endpoint answers with.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl StoreResponse {
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some("success")
    }
}
