#![allow(dead_code)]

use persona_spec::{AnswerState, AnswerValue, QuestionnaireEngine, persona_questionnaire};

pub const SUBJECT: &str = "ada@example.com";

/// Answers that satisfy every compulsory field of the built-in questionnaire.
pub fn compulsory_answers() -> AnswerState {
    let mut answers = AnswerState::new();
    answers.insert("preferred_name", AnswerValue::text("Ada"));
    answers.insert("age", AnswerValue::text("34"));
    answers.insert("gender", AnswerValue::text("female"));
    answers.insert("occupation", AnswerValue::text("Engineer"));
    answers.insert("relationship_status", AnswerValue::text("single"));
    answers.insert("communication_style", AnswerValue::text("direct"));
    answers.insert("preferred_tone", AnswerValue::text("calm"));
    answers.insert(
        "support_preferences",
        AnswerValue::list(["empathy", "practical_advice"]),
    );
    answers.insert(
        "current_priorities",
        AnswerValue::list(["career_growth", "mental_wellness", "physical_health"]),
    );
    answers.insert(
        "biggest_challenge",
        AnswerValue::text("Keeping a steady routine"),
    );
    answers.insert("stress_response", AnswerValue::text("talk_through_with_others"));
    answers.insert("personality_type", AnswerValue::text("curious introvert"));
    answers.insert(
        "goal_approach",
        AnswerValue::text("process_focused_with_flexibility"),
    );
    answers
}

pub fn engine() -> QuestionnaireEngine {
    QuestionnaireEngine::new(persona_questionnaire().expect("builtin spec"), SUBJECT)
        .expect("engine")
}

pub fn filled_engine() -> QuestionnaireEngine {
    QuestionnaireEngine::with_answers(
        persona_questionnaire().expect("builtin spec"),
        SUBJECT,
        compulsory_answers(),
    )
    .expect("engine")
}
