use std::sync::Mutex;

use async_trait::async_trait;
use persona_client::{ClientError, PersonaBackend, Step, advance, resume};
use persona_spec::{
    AnswerState, AnswerValue, EngineState, QuestionnaireEngine, SubmissionDocument,
    persona_questionnaire,
};

const SUBJECT: &str = "ada@example.com";

#[derive(Default)]
struct FakeBackend {
    failures_left: Mutex<usize>,
    stored: Mutex<Vec<SubmissionDocument>>,
}

impl FakeBackend {
    fn failing(times: usize) -> Self {
        Self {
            failures_left: Mutex::new(times),
            ..Self::default()
        }
    }

    fn stored(&self) -> Vec<SubmissionDocument> {
        self.stored.lock().unwrap().clone()
    }
}

#[async_trait]
impl PersonaBackend for FakeBackend {
    async fn store_persona(&self, document: &SubmissionDocument) -> Result<(), ClientError> {
        let mut failures = self.failures_left.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(ClientError::Backend("store unavailable".into()));
        }
        self.stored.lock().unwrap().push(document.clone());
        Ok(())
    }

    async fn get_persona(
        &self,
        subject_id: &str,
    ) -> Result<Option<SubmissionDocument>, ClientError> {
        Ok(self
            .stored
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|document| document.subject_id == subject_id)
            .cloned())
    }
}

fn answers() -> AnswerState {
    let mut answers = AnswerState::new();
    for (id, value) in [
        ("preferred_name", "Ada"),
        ("age", "34"),
        ("gender", "female"),
        ("occupation", "Engineer"),
        ("relationship_status", "single"),
        ("communication_style", "direct"),
        ("preferred_tone", "calm"),
        ("biggest_challenge", "Keeping a steady routine"),
        ("stress_response", "talk_through_with_others"),
        ("personality_type", "curious introvert"),
        ("goal_approach", "process_focused_with_flexibility"),
    ] {
        answers.insert(id, AnswerValue::text(value));
    }
    answers.insert(
        "support_preferences",
        AnswerValue::list(["empathy", "practical_advice"]),
    );
    answers.insert(
        "current_priorities",
        AnswerValue::list(["career_growth", "mental_wellness", "physical_health"]),
    );
    answers
}

fn filled_engine() -> QuestionnaireEngine {
    QuestionnaireEngine::with_answers(persona_questionnaire().expect("spec"), SUBJECT, answers())
        .expect("engine")
}

async fn walk_to_last_section(engine: &mut QuestionnaireEngine, backend: &FakeBackend) {
    for expected in 1..=4 {
        assert_eq!(
            advance(engine, backend).await.expect("advance"),
            Step::Moved(expected)
        );
    }
}

#[tokio::test]
async fn blocked_section_does_not_reach_backend() {
    let backend = FakeBackend::default();
    let mut engine =
        QuestionnaireEngine::new(persona_questionnaire().expect("spec"), SUBJECT).expect("engine");

    let step = advance(&mut engine, &backend).await.expect("advance");
    assert_eq!(step, Step::Blocked(5));
    assert_eq!(engine.current_section(), Some(0));
    assert!(backend.stored().is_empty());
}

#[tokio::test]
async fn last_section_submits_document() {
    let backend = FakeBackend::default();
    let mut engine = filled_engine();
    walk_to_last_section(&mut engine, &backend).await;

    let step = advance(&mut engine, &backend).await.expect("submit");
    assert_eq!(engine.state(), &EngineState::Submitted);

    let stored = backend.stored();
    assert_eq!(stored.len(), 1);
    assert_eq!(step, Step::Submitted(Box::new(stored[0].clone())));
    assert!(stored[0].metadata.compulsory_completed);
    assert_eq!(stored[0].metadata.completion_percentage, 87);
}

#[tokio::test]
async fn failed_submission_keeps_answers_for_retry() {
    let backend = FakeBackend::failing(1);
    let mut engine = filled_engine();
    walk_to_last_section(&mut engine, &backend).await;

    let step = advance(&mut engine, &backend).await.expect("submit");
    assert_eq!(step, Step::Failed("store unavailable".into()));
    assert!(matches!(engine.state(), EngineState::Failed { message } if message == "store unavailable"));
    assert_eq!(engine.answers(), &answers());

    assert_eq!(engine.retry_from_failure().expect("retry"), 4);
    assert!(matches!(
        advance(&mut engine, &backend).await.expect("resubmit"),
        Step::Submitted(_)
    ));
    assert_eq!(backend.stored().len(), 1);
}

#[tokio::test]
async fn resume_seeds_engine_from_stored_document() {
    let backend = FakeBackend::default();
    let mut engine = filled_engine();
    walk_to_last_section(&mut engine, &backend).await;
    advance(&mut engine, &backend).await.expect("submit");
    let first = backend.stored().remove(0);

    let resumed = resume(persona_questionnaire().expect("spec"), SUBJECT, &backend)
        .await
        .expect("resume");
    assert_eq!(resumed.current_section(), Some(0));
    assert_eq!(resumed.answers(), &answers());

    let rebuilt = resumed.build_document(chrono::Utc::now());
    assert_eq!(rebuilt.metadata.created_at, first.metadata.created_at);
}

#[tokio::test]
async fn resume_without_stored_document_starts_empty() {
    let backend = FakeBackend::default();
    let resumed = resume(persona_questionnaire().expect("spec"), "new@example.com", &backend)
        .await
        .expect("resume");
    assert_eq!(resumed.subject_id(), "new@example.com");
    assert!(resumed.answers().is_empty());
}
