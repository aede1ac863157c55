use std::collections::BTreeMap;

use serde::Serialize;

use crate::answers::{AnswerState, AnswerValue, ErrorCode, FieldError};
use crate::spec::field::{FieldKind, FieldSpec, SelectionBounds};
use crate::spec::questionnaire::QuestionnaireSpec;

pub const REQUIRED_MESSAGE: &str = "This field is required";

/// Outcome of validating every field of one section.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SectionReport {
    pub section: usize,
    pub errors: BTreeMap<String, FieldError>,
}

impl SectionReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validates the fields of section `index`; `None` when the index is out of range.
pub fn validate_section(
    spec: &QuestionnaireSpec,
    index: usize,
    answers: &AnswerState,
) -> Option<SectionReport> {
    let section = spec.section(index)?;
    let errors = section
        .questions
        .iter()
        .filter_map(|id| {
            let field = spec.field(id)?;
            validate_field(field, answers.get(id)).map(|error| (id.clone(), error))
        })
        .collect();
    Some(SectionReport {
        section: index,
        errors,
    })
}

/// Validates every section, keeping only the sections that failed.
pub fn validate_all(spec: &QuestionnaireSpec, answers: &AnswerState) -> Vec<SectionReport> {
    (0..spec.sections.len())
        .filter_map(|index| validate_section(spec, index, answers))
        .filter(|report| !report.is_valid())
        .collect()
}

/// Checks one value against its definition, returning the first failure.
pub fn validate_field(field: &FieldSpec, value: Option<&AnswerValue>) -> Option<FieldError> {
    let value = match value {
        Some(value) if !value.is_empty() => value,
        _ if field.required => {
            return Some(FieldError::new(ErrorCode::Required, REQUIRED_MESSAGE));
        }
        _ => return None,
    };

    if !matches_kind(field.kind, value) {
        return Some(FieldError::new(
            ErrorCode::TypeMismatch,
            "Please provide a valid answer",
        ));
    }

    if let Some(bounds) = field.selection
        && let Some(items) = value.as_list()
        && let Some(error) = check_selection(bounds, items.len())
    {
        return Some(error);
    }

    if field.kind == FieldKind::Number
        && let Some(error) = check_number(field, value)
    {
        return Some(error);
    }

    if let Some(max_length) = field.max_length
        && let Some(text) = value.as_str()
        && text.chars().count() > max_length
    {
        return Some(FieldError::new(
            ErrorCode::TooLong,
            format!("Please keep this under {} characters", max_length),
        ));
    }

    if field.kind.is_choice() && !choices_known(field, value) {
        return Some(FieldError::new(
            ErrorCode::UnknownOption,
            "Please choose from the listed options",
        ));
    }

    None
}

fn matches_kind(kind: FieldKind, value: &AnswerValue) -> bool {
    match kind {
        FieldKind::Text | FieldKind::Textarea | FieldKind::SingleSelect => {
            matches!(value, AnswerValue::Text(_))
        }
        FieldKind::Number => matches!(value, AnswerValue::Text(_) | AnswerValue::Number(_)),
        FieldKind::MultiSelect => matches!(value, AnswerValue::List(_)),
    }
}

fn check_selection(bounds: SelectionBounds, selected: usize) -> Option<FieldError> {
    match bounds {
        SelectionBounds::Exact(count) if selected != count => Some(FieldError::new(
            ErrorCode::ExactSelections,
            format!("Please select exactly {} options", count),
        )),
        SelectionBounds::Max(count) if selected > count => Some(FieldError::new(
            ErrorCode::MaxSelections,
            format!("Please select up to {} options", count),
        )),
        _ => None,
    }
}

fn check_number(field: &FieldSpec, value: &AnswerValue) -> Option<FieldError> {
    let parsed = parse_integer(value);
    let in_range = match (&field.numeric, parsed) {
        (_, None) => false,
        (Some(bounds), Some(number)) => bounds.contains(number),
        (None, Some(_)) => true,
    };
    if in_range {
        return None;
    }
    let message = match &field.numeric {
        Some(bounds) => format!(
            "Please enter a valid {} between {} and {}",
            bounds.label(),
            bounds.min,
            bounds.max
        ),
        None => "Please enter a whole number".to_string(),
    };
    Some(FieldError::new(ErrorCode::NumberOutOfRange, message))
}

/// Integer reading of a numeric answer.
///
/// Text yields its leading integer after trimming, so `"34 years"` reads as 34
/// and `"13.9"` as 13. Fractional numbers are truncated the same way.
pub fn parse_integer(value: &AnswerValue) -> Option<i64> {
    match value {
        AnswerValue::Text(text) => leading_integer(text),
        AnswerValue::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|float| float.is_finite())
                .map(|float| float.trunc() as i64)
        }),
        AnswerValue::List(_) => None,
    }
}

fn leading_integer(text: &str) -> Option<i64> {
    let text = text.trim();
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    let digits = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    if digits == 0 {
        return None;
    }
    let end = text.len() - unsigned.len() + digits;
    text[..end].parse::<i64>().ok()
}

fn choices_known(field: &FieldSpec, value: &AnswerValue) -> bool {
    match value {
        AnswerValue::Text(choice) => field.has_option(choice),
        AnswerValue::List(choices) => choices.iter().all(|choice| field.has_option(choice)),
        AnswerValue::Number(_) => false,
    }
}
