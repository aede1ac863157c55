use persona_spec::{
    Advance, EngineError, QuestionnaireEngine, QuestionnaireSpec, SubmissionDocument,
};
use tracing::debug;

use crate::backend::PersonaBackend;
use crate::error::ClientError;

/// What a call to [`advance`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Moved on to the given section.
    Moved(usize),
    /// The current section has errors to fix.
    Blocked(usize),
    /// The store accepted this document.
    Submitted(Box<SubmissionDocument>),
    /// The store rejected the document; answers are intact for a retry.
    Failed(String),
}

/// Advances the engine and, on the last section, sends the document to `backend`.
///
/// Holding `&mut engine` across the request keeps a second submission from
/// starting while one is in flight.
pub async fn advance<B>(engine: &mut QuestionnaireEngine, backend: &B) -> Result<Step, EngineError>
where
    B: PersonaBackend + ?Sized,
{
    match engine.advance()? {
        Advance::Moved { to } => Ok(Step::Moved(to)),
        Advance::Blocked { errors } => Ok(Step::Blocked(errors)),
        Advance::Submit(document) => {
            debug!(subject = %document.subject_id, "sending persona document");
            match backend.store_persona(&document).await {
                Ok(()) => {
                    engine.complete_submission(Ok(()))?;
                    Ok(Step::Submitted(document))
                }
                Err(error) => {
                    let message = error.user_message();
                    engine.complete_submission(Err(message.clone()))?;
                    Ok(Step::Failed(message))
                }
            }
        }
    }
}

/// Loads the subject's stored document, if any, into a fresh engine.
pub async fn resume<B>(
    spec: QuestionnaireSpec,
    subject_id: &str,
    backend: &B,
) -> Result<QuestionnaireEngine, ClientError>
where
    B: PersonaBackend + ?Sized,
{
    let existing = backend.get_persona(subject_id).await?;
    let engine = match existing {
        Some(document) => QuestionnaireEngine::from_document(spec, &document)?,
        None => QuestionnaireEngine::new(spec, subject_id)?,
    };
    Ok(engine)
}
