pub mod field;
pub mod questionnaire;
pub mod section;

pub use field::{ChoiceOption, FieldKind, FieldSpec, NumericBounds, SelectionBounds};
pub use questionnaire::{QuestionnaireSpec, SchemaError, SubmissionRule};
pub use section::SectionSpec;
