use async_trait::async_trait;
use persona_spec::SubmissionDocument;

use crate::error::ClientError;

/// Remote store that owns submitted persona documents.
#[async_trait]
pub trait PersonaBackend: Send + Sync {
    /// Persists a document. `Err` leaves the questionnaire retryable.
    async fn store_persona(&self, document: &SubmissionDocument) -> Result<(), ClientError>;

    /// Fetches the latest document for `subject_id`, if one exists.
    async fn get_persona(&self, subject_id: &str)
    -> Result<Option<SubmissionDocument>, ClientError>;
}
