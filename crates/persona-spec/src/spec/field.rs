use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Input kinds supported by the questionnaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Single-line free text.
    Text,
    /// Multi-line free text.
    Textarea,
    /// Whole number entered as text and parsed at validation time.
    Number,
    /// Exactly one option value.
    SingleSelect,
    /// A list of option values.
    MultiSelect,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Textarea => "textarea",
            FieldKind::Number => "number",
            FieldKind::SingleSelect => "single_select",
            FieldKind::MultiSelect => "multi_select",
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, FieldKind::Text | FieldKind::Textarea)
    }

    pub fn is_choice(&self) -> bool {
        matches!(self, FieldKind::SingleSelect | FieldKind::MultiSelect)
    }
}

/// One selectable option of a choice field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ChoiceOption {
    pub value: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// How many options a multi-select field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SelectionBounds {
    Exact(usize),
    Max(usize),
}

impl SelectionBounds {
    /// Upper limit on the number of selected options.
    pub fn limit(&self) -> usize {
        match self {
            SelectionBounds::Exact(count) | SelectionBounds::Max(count) => *count,
        }
    }
}

/// Inclusive range accepted by a numeric field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NumericBounds {
    pub min: i64,
    pub max: i64,
    /// Noun used in the range error message, e.g. "age".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl NumericBounds {
    pub fn contains(&self, value: i64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or("number")
    }
}

/// A single question of the questionnaire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldSpec {
    pub id: String,
    pub question: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ChoiceOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<SelectionBounds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric: Option<NumericBounds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

impl FieldSpec {
    pub fn option(&self, value: &str) -> Option<&ChoiceOption> {
        self.options.iter().find(|option| option.value == value)
    }

    pub fn has_option(&self, value: &str) -> bool {
        self.option(value).is_some()
    }
}
