use serde_json::{Map, Value, json};

use crate::{
    answers::{AnswerValue, FieldError},
    engine::{EngineState, QuestionnaireEngine},
    spec::field::{ChoiceOption, FieldKind, FieldSpec, SelectionBounds},
};

/// Status labels returned by the renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// A section is waiting for input.
    NeedInput,
    /// The document is being sent.
    Submitting,
    /// The document was accepted.
    Complete,
    /// The last submission failed and can be retried.
    Error,
}

impl RenderStatus {
    /// Human-friendly label that matches the renderer requirements.
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStatus::NeedInput => "need_input",
            RenderStatus::Submitting => "submitting",
            RenderStatus::Complete => "complete",
            RenderStatus::Error => "error",
        }
    }
}

/// Section counters exposed to renderers.
#[derive(Debug, Clone)]
pub struct RenderProgress {
    pub position: usize,
    pub total: usize,
}

/// Describes a single field of the current section.
#[derive(Debug, Clone)]
pub struct RenderField {
    pub id: String,
    pub question: String,
    pub description: Option<String>,
    pub placeholder: Option<String>,
    pub kind: FieldKind,
    pub required: bool,
    pub options: Vec<ChoiceOption>,
    pub current_value: Option<AnswerValue>,
    pub error: Option<FieldError>,
    pub selection_hint: Option<String>,
    pub char_count: Option<String>,
}

/// Collected payload used by both text and JSON renderers.
#[derive(Debug, Clone)]
pub struct SectionPayload {
    pub questionnaire_id: String,
    pub questionnaire_title: String,
    pub status: RenderStatus,
    pub message: Option<String>,
    pub progress: RenderProgress,
    pub section_id: Option<String>,
    pub section_title: Option<String>,
    pub section_subtitle: Option<String>,
    pub section_icon: Option<String>,
    pub is_last_section: bool,
    pub fields: Vec<RenderField>,
}

/// Build the renderer payload for the section the engine is on.
pub fn build_section_payload(engine: &QuestionnaireEngine) -> SectionPayload {
    let spec = engine.spec();
    let (status, message) = match engine.state() {
        EngineState::Section(_) => (RenderStatus::NeedInput, None),
        EngineState::Submitting => (RenderStatus::Submitting, None),
        EngineState::Submitted => (RenderStatus::Complete, None),
        EngineState::Failed { message } => (RenderStatus::Error, Some(message.clone())),
    };
    let progress = engine.progress();
    let section = engine
        .current_section()
        .and_then(|index| spec.section(index));

    let fields = section
        .map(|section| {
            section
                .questions
                .iter()
                .filter_map(|id| spec.field(id))
                .map(|field| {
                    let current_value = engine.answers().get(&field.id).cloned();
                    RenderField {
                        id: field.id.clone(),
                        question: field.question.clone(),
                        description: field.description.clone(),
                        placeholder: field.placeholder.clone(),
                        kind: field.kind,
                        required: field.required,
                        options: field.options.clone(),
                        selection_hint: selection_hint(field, current_value.as_ref()),
                        char_count: char_count(field, current_value.as_ref()),
                        error: engine.errors().get(&field.id).cloned(),
                        current_value,
                    }
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    SectionPayload {
        questionnaire_id: spec.id.clone(),
        questionnaire_title: spec.title.clone(),
        status,
        message,
        progress: RenderProgress {
            position: progress.position,
            total: progress.total,
        },
        section_id: section.map(|section| section.id.clone()),
        section_title: section.map(|section| section.title.clone()),
        section_subtitle: section.and_then(|section| section.subtitle.clone()),
        section_icon: section.and_then(|section| section.icon.clone()),
        is_last_section: engine.is_last_section(),
        fields,
    }
}

/// Counter shown above multi-select options, e.g. `Select exactly 3 (2/3)`.
pub fn selection_hint(field: &FieldSpec, value: Option<&AnswerValue>) -> Option<String> {
    if field.kind != FieldKind::MultiSelect {
        return None;
    }
    let selected = value
        .and_then(AnswerValue::as_list)
        .map(<[String]>::len)
        .unwrap_or(0);
    Some(match field.selection {
        Some(SelectionBounds::Exact(count)) => {
            format!("Select exactly {} ({}/{})", count, selected, count)
        }
        Some(SelectionBounds::Max(count)) => {
            format!("Select up to {} ({}/{})", count, selected, count)
        }
        None => format!("Selected: {}", selected),
    })
}

fn char_count(field: &FieldSpec, value: Option<&AnswerValue>) -> Option<String> {
    let max_length = field.max_length?;
    let used = value
        .and_then(AnswerValue::as_str)
        .map(|text| text.chars().count())
        .unwrap_or(0);
    Some(format!("{}/{}", used, max_length))
}

/// Render the payload as a structured JSON-friendly value.
pub fn render_json_ui(payload: &SectionPayload) -> Value {
    let fields = payload
        .fields
        .iter()
        .map(|field| {
            let mut map = Map::new();
            map.insert("id".into(), Value::String(field.id.clone()));
            map.insert("question".into(), Value::String(field.question.clone()));
            map.insert(
                "description".into(),
                field
                    .description
                    .clone()
                    .map(Value::String)
                    .unwrap_or(Value::Null),
            );
            map.insert("type".into(), Value::String(field.kind.as_str().to_string()));
            map.insert("required".into(), Value::Bool(field.required));
            if let Some(placeholder) = &field.placeholder {
                map.insert("placeholder".into(), Value::String(placeholder.clone()));
            }
            if let Some(current_value) = &field.current_value {
                map.insert("current_value".into(), json!(current_value));
            }
            if !field.options.is_empty() {
                map.insert("options".into(), json!(field.options));
            }
            if let Some(hint) = &field.selection_hint {
                map.insert("selection_hint".into(), Value::String(hint.clone()));
            }
            if let Some(count) = &field.char_count {
                map.insert("char_count".into(), Value::String(count.clone()));
            }
            if let Some(error) = &field.error {
                map.insert("error".into(), json!(error));
            }
            Value::Object(map)
        })
        .collect::<Vec<_>>();

    json!({
        "questionnaire_id": payload.questionnaire_id,
        "questionnaire_title": payload.questionnaire_title,
        "status": payload.status.as_str(),
        "message": payload.message,
        "progress": {
            "position": payload.progress.position,
            "total": payload.progress.total,
        },
        "section": {
            "id": payload.section_id,
            "title": payload.section_title,
            "subtitle": payload.section_subtitle,
            "icon": payload.section_icon,
            "is_last": payload.is_last_section,
        },
        "fields": fields,
    })
}

/// Render the payload as human-friendly text.
pub fn render_text(payload: &SectionPayload) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} ({})",
        payload.questionnaire_title, payload.questionnaire_id
    ));
    lines.push(format!(
        "Status: {} ({} of {})",
        payload.status.as_str(),
        payload.progress.position,
        payload.progress.total
    ));
    if let Some(message) = &payload.message {
        lines.push(format!("Message: {}", message));
    }

    if let Some(title) = &payload.section_title {
        match &payload.section_icon {
            Some(icon) => lines.push(format!("{} {}", icon, title)),
            None => lines.push(title.clone()),
        }
    }
    if let Some(subtitle) = &payload.section_subtitle {
        lines.push(format!("  {}", subtitle));
    }

    for field in &payload.fields {
        let mut entry = format!(" - {} ({})", field.question, field.id);
        if field.required {
            entry.push_str(" [required]");
        }
        if let Some(value) = &field.current_value {
            entry.push_str(&format!(" = {}", value));
        }
        lines.push(entry);
        if let Some(hint) = &field.selection_hint {
            lines.push(format!("   {}", hint));
        }
        if let Some(count) = &field.char_count {
            lines.push(format!("   {}", count));
        }
        if let Some(error) = &field.error {
            lines.push(format!("   ! {}", error.message));
        }
    }

    lines.join("\n")
}
