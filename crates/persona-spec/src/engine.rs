//! Section-by-section driver for a questionnaire.
//!
//! The engine owns the answers and the displayed errors. Every operation is
//! synchronous; the only asynchronous step, sending the finished document,
//! happens outside the engine between [`QuestionnaireEngine::advance`]
//! returning [`Advance::Submit`] and the caller reporting the outcome through
//! [`QuestionnaireEngine::complete_submission`].

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::answers::{AnswerState, AnswerValue, ValidationErrors};
use crate::document::{SubmissionDocument, to_submission_document};
use crate::spec::field::FieldKind;
use crate::spec::questionnaire::{QuestionnaireSpec, SchemaError};
use crate::validate::validate_section;

/// Misuse of the engine API. Validation failures are never reported here.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("section {0} does not exist")]
    UnknownSection(usize),
    #[error("field '{field}' has no option '{option}'")]
    UnknownOption { field: String, option: String },
    #[error("field '{0}' is not a multi_select field")]
    NotMultiSelect(String),
    #[error("answers cannot change while the questionnaire is {0}")]
    NotEditable(&'static str),
    #[error("a submission is already in flight")]
    SubmissionInFlight,
    #[error("the questionnaire was already submitted")]
    AlreadySubmitted,
    #[error("no submission is in flight")]
    NoSubmissionInFlight,
}

/// Where the questionnaire currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineState {
    Section(usize),
    Submitting,
    Submitted,
    Failed { message: String },
}

impl EngineState {
    pub fn label(&self) -> &'static str {
        match self {
            EngineState::Section(_) => "in_progress",
            EngineState::Submitting => "submitting",
            EngineState::Submitted => "submitted",
            EngineState::Failed { .. } => "failed",
        }
    }
}

/// Result of a successful call to [`QuestionnaireEngine::advance`].
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// Validation passed and the next section is now current.
    Moved { to: usize },
    /// Validation failed; the listed number of fields carry errors.
    Blocked { errors: usize },
    /// The last section passed; send this document and report back.
    Submit(Box<SubmissionDocument>),
}

/// Position of the current section, as shown in a progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionProgress {
    pub position: usize,
    pub total: usize,
}

impl SectionProgress {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.position as f64 / self.total as f64 * 100.0
    }
}

#[derive(Debug, Clone)]
pub struct QuestionnaireEngine {
    spec: QuestionnaireSpec,
    subject_id: String,
    answers: AnswerState,
    errors: ValidationErrors,
    state: EngineState,
    created_at: Option<DateTime<Utc>>,
}

impl QuestionnaireEngine {
    /// Starts an empty questionnaire at the first section.
    pub fn new(spec: QuestionnaireSpec, subject_id: impl Into<String>) -> Result<Self, SchemaError> {
        spec.check()?;
        Ok(Self {
            spec,
            subject_id: subject_id.into(),
            answers: AnswerState::new(),
            errors: ValidationErrors::default(),
            state: EngineState::Section(0),
            created_at: None,
        })
    }

    /// Starts at the first section with answers flattened from an existing document.
    pub fn from_document(
        spec: QuestionnaireSpec,
        document: &SubmissionDocument,
    ) -> Result<Self, SchemaError> {
        let mut engine = Self::new(spec, document.subject_id.clone())?;
        engine.answers = AnswerState::from_document(document);
        engine.created_at = Some(document.metadata.created_at);
        debug!(
            subject = %engine.subject_id,
            answers = engine.answers.len(),
            "seeded questionnaire from existing document"
        );
        Ok(engine)
    }

    /// Starts at the first section with caller-provided answers.
    pub fn with_answers(
        spec: QuestionnaireSpec,
        subject_id: impl Into<String>,
        answers: AnswerState,
    ) -> Result<Self, SchemaError> {
        let mut engine = Self::new(spec, subject_id)?;
        engine.answers = answers;
        Ok(engine)
    }

    pub fn spec(&self) -> &QuestionnaireSpec {
        &self.spec
    }

    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    pub fn answers(&self) -> &AnswerState {
        &self.answers
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Index of the section on screen. A failed submission keeps the last one.
    pub fn current_section(&self) -> Option<usize> {
        match self.state {
            EngineState::Section(index) => Some(index),
            EngineState::Failed { .. } => Some(self.spec.last_section_index()),
            EngineState::Submitting | EngineState::Submitted => None,
        }
    }

    pub fn is_last_section(&self) -> bool {
        self.current_section() == Some(self.spec.last_section_index())
    }

    pub fn progress(&self) -> SectionProgress {
        let total = self.spec.sections.len();
        let position = self
            .current_section()
            .map(|index| index + 1)
            .unwrap_or(total);
        SectionProgress { position, total }
    }

    /// Stores an answer and clears the field's error.
    pub fn set_answer(
        &mut self,
        field_id: &str,
        value: impl Into<AnswerValue>,
    ) -> Result<(), EngineError> {
        self.ensure_editable()?;
        if self.spec.field(field_id).is_none() {
            return Err(EngineError::UnknownField(field_id.to_string()));
        }
        self.answers.insert(field_id, value.into());
        self.errors.clear_field(field_id);
        Ok(())
    }

    /// Removes an answer and clears the field's error.
    pub fn clear_answer(&mut self, field_id: &str) -> Result<(), EngineError> {
        self.ensure_editable()?;
        if self.spec.field(field_id).is_none() {
            return Err(EngineError::UnknownField(field_id.to_string()));
        }
        self.answers.remove(field_id);
        self.errors.clear_field(field_id);
        Ok(())
    }

    /// Selects or deselects one option of a multi-select field.
    ///
    /// Selecting past a `max`/`exact` bound leaves the selection unchanged.
    /// Returns whether the option is selected afterwards.
    pub fn toggle_option(&mut self, field_id: &str, option: &str) -> Result<bool, EngineError> {
        let field = self
            .spec
            .field(field_id)
            .ok_or_else(|| EngineError::UnknownField(field_id.to_string()))?;
        if field.kind != FieldKind::MultiSelect {
            return Err(EngineError::NotMultiSelect(field_id.to_string()));
        }
        if !field.has_option(option) {
            return Err(EngineError::UnknownOption {
                field: field_id.to_string(),
                option: option.to_string(),
            });
        }
        let limit = field.selection.map(|bounds| bounds.limit());

        let mut selected = self
            .answers
            .get(field_id)
            .and_then(AnswerValue::as_list)
            .map(<[String]>::to_vec)
            .unwrap_or_default();
        let now_selected = if let Some(position) = selected.iter().position(|item| item == option) {
            selected.remove(position);
            false
        } else if limit.is_none_or(|limit| selected.len() < limit) {
            selected.push(option.to_string());
            true
        } else {
            false
        };

        self.set_answer(field_id, AnswerValue::List(selected))?;
        Ok(now_selected)
    }

    /// Re-validates every field of section `index`, replacing that section's errors.
    pub fn validate_section(&mut self, index: usize) -> Result<bool, EngineError> {
        let report = validate_section(&self.spec, index, &self.answers)
            .ok_or(EngineError::UnknownSection(index))?;
        let valid = report.is_valid();
        if !valid {
            debug!(
                section = index,
                errors = report.errors.len(),
                "section validation failed"
            );
        }
        let section = &self.spec.sections[index];
        self.errors.replace_for(&section.questions, report.errors);
        Ok(valid)
    }

    /// Validates the current section and moves forward or starts submission.
    pub fn advance(&mut self) -> Result<Advance, EngineError> {
        let current = match &self.state {
            EngineState::Section(index) => *index,
            EngineState::Failed { .. } => self.spec.last_section_index(),
            EngineState::Submitting => return Err(EngineError::SubmissionInFlight),
            EngineState::Submitted => return Err(EngineError::AlreadySubmitted),
        };
        self.state = EngineState::Section(current);

        if !self.validate_section(current)? {
            return Ok(Advance::Blocked {
                errors: self.section_error_count(current),
            });
        }

        if current < self.spec.last_section_index() {
            self.state = EngineState::Section(current + 1);
            debug!(from = current, to = current + 1, "advanced section");
            return Ok(Advance::Moved { to: current + 1 });
        }

        let document = self.build_document(Utc::now());
        self.state = EngineState::Submitting;
        info!(
            subject = %self.subject_id,
            completion = document.metadata.completion_percentage,
            "questionnaire ready for submission"
        );
        Ok(Advance::Submit(Box::new(document)))
    }

    /// Moves back one section without validating. Returns the new index.
    pub fn retreat(&mut self) -> Result<usize, EngineError> {
        let current = match &self.state {
            EngineState::Section(index) => *index,
            EngineState::Failed { .. } => self.spec.last_section_index(),
            EngineState::Submitting => return Err(EngineError::SubmissionInFlight),
            EngineState::Submitted => return Err(EngineError::AlreadySubmitted),
        };
        let target = current.saturating_sub(1);
        self.state = EngineState::Section(target);
        Ok(target)
    }

    /// Returns a failed questionnaire to its last section.
    pub fn retry_from_failure(&mut self) -> Result<usize, EngineError> {
        match self.state {
            EngineState::Failed { .. } => {
                let last = self.spec.last_section_index();
                self.state = EngineState::Section(last);
                Ok(last)
            }
            EngineState::Submitting => Err(EngineError::SubmissionInFlight),
            EngineState::Submitted => Err(EngineError::AlreadySubmitted),
            EngineState::Section(index) => Ok(index),
        }
    }

    /// Records the backend's verdict on the in-flight submission.
    pub fn complete_submission(&mut self, outcome: Result<(), String>) -> Result<(), EngineError> {
        if self.state != EngineState::Submitting {
            return Err(EngineError::NoSubmissionInFlight);
        }
        self.state = match outcome {
            Ok(()) => {
                info!(subject = %self.subject_id, "questionnaire submitted");
                EngineState::Submitted
            }
            Err(message) => {
                warn!(subject = %self.subject_id, %message, "questionnaire submission failed");
                EngineState::Failed { message }
            }
        };
        Ok(())
    }

    /// Builds the document from the current answers without changing state.
    pub fn build_document(&self, now: DateTime<Utc>) -> SubmissionDocument {
        let document = to_submission_document(&self.spec, &self.answers, &self.subject_id, now);
        match self.created_at {
            Some(created_at) => document.with_created_at(created_at),
            None => document,
        }
    }

    fn section_error_count(&self, index: usize) -> usize {
        self.spec.sections[index]
            .questions
            .iter()
            .filter(|id| self.errors.get(id).is_some())
            .count()
    }

    fn ensure_editable(&self) -> Result<(), EngineError> {
        match self.state {
            EngineState::Submitting | EngineState::Submitted => {
                Err(EngineError::NotEditable(self.state.label()))
            }
            _ => Ok(()),
        }
    }
}
