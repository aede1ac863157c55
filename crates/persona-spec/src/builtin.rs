use crate::spec::questionnaire::{QuestionnaireSpec, SchemaError};

/// JSON source of the persona questionnaire shipped with the app.
pub const PERSONA_QUESTIONNAIRE_JSON: &str = include_str!("../fixtures/persona_questionnaire.json");

/// Loads and checks the built-in persona questionnaire.
pub fn persona_questionnaire() -> Result<QuestionnaireSpec, SchemaError> {
    QuestionnaireSpec::from_json(PERSONA_QUESTIONNAIRE_JSON)
}
