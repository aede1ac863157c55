#![allow(missing_docs)]

pub mod answers;
pub mod answers_schema;
pub mod builtin;
pub mod document;
pub mod engine;
pub mod render;
pub mod spec;
pub mod validate;

pub use answers::{
    AnswerState, AnswerValue, ErrorCode, FieldError, UnsupportedAnswer, ValidationErrors,
};
pub use answers_schema::{generate as answers_schema, submission_schema};
pub use builtin::persona_questionnaire;
pub use document::{
    DocumentMetadata, SubmissionDocument, completion_percentage, to_submission_document,
};
pub use engine::{Advance, EngineError, EngineState, QuestionnaireEngine, SectionProgress};
pub use render::{
    RenderField, RenderProgress, RenderStatus, SectionPayload, build_section_payload,
    render_json_ui, render_text,
};
pub use spec::{
    ChoiceOption, FieldKind, FieldSpec, NumericBounds, QuestionnaireSpec, SchemaError,
    SectionSpec, SelectionBounds, SubmissionRule,
};
pub use validate::{SectionReport, validate_all, validate_field, validate_section};
