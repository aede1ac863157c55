use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::spec::field::{FieldKind, FieldSpec};
use crate::spec::section::SectionSpec;

/// Which answers are copied into the submission buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionRule {
    /// Compulsory answers are copied unfiltered; optional answers are dropped
    /// only when they are empty strings. Matches what the store endpoint has
    /// always received.
    #[default]
    SourceCompatible,
    /// Empty strings and empty lists are dropped from both buckets.
    Uniform,
}

/// Problems found while loading or checking a questionnaire definition.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to parse questionnaire: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("field id '{0}' is not snake_case")]
    InvalidId(String),
    #[error("field id '{0}' is defined more than once")]
    DuplicateField(String),
    #[error("section '{section}' references unknown field '{field}'")]
    UnknownField { section: String, field: String },
    #[error("field '{0}' appears in more than one section")]
    FieldInSeveralSections(String),
    #[error("field '{0}' is not placed in any section")]
    OrphanField(String),
    #[error("field '{0}': {1}")]
    InvalidField(String, String),
    #[error("questionnaire has no sections")]
    NoSections,
}

/// Top-level questionnaire definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QuestionnaireSpec {
    pub id: String,
    pub title: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub compulsory_fields: Vec<FieldSpec>,
    #[serde(default)]
    pub optional_fields: Vec<FieldSpec>,
    pub sections: Vec<SectionSpec>,
    #[serde(default)]
    pub submission_rule: SubmissionRule,
}

fn field_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("static field id pattern"))
}

impl QuestionnaireSpec {
    /// Parses a definition from JSON and checks its structural invariants.
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let spec: QuestionnaireSpec = serde_json::from_str(json)?;
        spec.check()?;
        Ok(spec)
    }

    /// Looks up a definition in either bucket.
    pub fn field(&self, id: &str) -> Option<&FieldSpec> {
        self.all_fields().find(|field| field.id == id)
    }

    pub fn all_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.compulsory_fields
            .iter()
            .chain(self.optional_fields.iter())
    }

    pub fn is_compulsory(&self, id: &str) -> bool {
        self.compulsory_fields.iter().any(|field| field.id == id)
    }

    pub fn total_fields(&self) -> usize {
        self.compulsory_fields.len() + self.optional_fields.len()
    }

    pub fn section(&self, index: usize) -> Option<&SectionSpec> {
        self.sections.get(index)
    }

    pub fn last_section_index(&self) -> usize {
        self.sections.len().saturating_sub(1)
    }

    /// Verifies ids are unique and that sections partition the field space.
    pub fn check(&self) -> Result<(), SchemaError> {
        if self.sections.is_empty() {
            return Err(SchemaError::NoSections);
        }

        let mut defined = BTreeSet::new();
        for field in self.all_fields() {
            if !field_id_pattern().is_match(&field.id) {
                return Err(SchemaError::InvalidId(field.id.clone()));
            }
            if !defined.insert(field.id.as_str()) {
                return Err(SchemaError::DuplicateField(field.id.clone()));
            }
            check_field(field)?;
        }

        let mut placed: BTreeMap<&str, &str> = BTreeMap::new();
        for section in &self.sections {
            for question in &section.questions {
                if !defined.contains(question.as_str()) {
                    return Err(SchemaError::UnknownField {
                        section: section.id.clone(),
                        field: question.clone(),
                    });
                }
                if placed
                    .insert(question.as_str(), section.id.as_str())
                    .is_some()
                {
                    return Err(SchemaError::FieldInSeveralSections(question.clone()));
                }
            }
        }

        if let Some(orphan) = defined.iter().find(|id| !placed.contains_key(*id)) {
            return Err(SchemaError::OrphanField((*orphan).to_string()));
        }

        Ok(())
    }
}

fn check_field(field: &FieldSpec) -> Result<(), SchemaError> {
    let invalid = |reason: &str| Err(SchemaError::InvalidField(field.id.clone(), reason.into()));

    if field.kind.is_choice() {
        if field.options.is_empty() {
            return invalid("choice fields need at least one option");
        }
        let mut values = BTreeSet::new();
        if !field
            .options
            .iter()
            .all(|option| values.insert(option.value.as_str()))
        {
            return invalid("option values must be unique");
        }
    } else if !field.options.is_empty() {
        return invalid("options are only allowed on choice fields");
    }

    if field.selection.is_some() && field.kind != FieldKind::MultiSelect {
        return invalid("selection bounds are only allowed on multi_select fields");
    }
    if let Some(bounds) = &field.selection
        && (bounds.limit() == 0 || bounds.limit() > field.options.len())
    {
        return invalid("selection bound must be between 1 and the number of options");
    }

    if field.numeric.is_some() && field.kind != FieldKind::Number {
        return invalid("numeric bounds are only allowed on number fields");
    }
    if let Some(bounds) = &field.numeric
        && bounds.min > bounds.max
    {
        return invalid("numeric minimum exceeds maximum");
    }

    if field.max_length.is_some() && !(field.kind.is_text() || field.kind == FieldKind::Number) {
        return invalid("max_length is only allowed on text and number fields");
    }

    Ok(())
}
