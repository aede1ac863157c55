use serde_json::{Map, Value, json};

use crate::document::SubmissionDocument;
use crate::spec::field::{FieldKind, FieldSpec, SelectionBounds};
use crate::spec::questionnaire::QuestionnaireSpec;

/// JSON Schema describing a complete, valid answer object for `spec`.
pub fn generate(spec: &QuestionnaireSpec) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for field in spec.all_fields() {
        properties.insert(field.id.clone(), field_schema(field));
        if field.required {
            required.push(Value::String(field.id.clone()));
        }
    }

    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "$id": format!("urn:persona:{}:{}:answers", spec.id, spec.version),
        "title": format!("{} answers", spec.title),
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

/// Schema of the document produced at submit time.
pub fn submission_schema() -> Value {
    serde_json::to_value(schemars::schema_for!(SubmissionDocument)).unwrap_or(Value::Null)
}

fn field_schema(field: &FieldSpec) -> Value {
    let mut schema = Map::new();
    schema.insert("title".into(), Value::String(field.question.clone()));
    if let Some(description) = &field.description {
        schema.insert("description".into(), Value::String(description.clone()));
    }

    match field.kind {
        FieldKind::Text | FieldKind::Textarea => {
            schema.insert("type".into(), json!("string"));
            if field.required {
                schema.insert("minLength".into(), json!(1));
            }
            if let Some(max_length) = field.max_length {
                schema.insert("maxLength".into(), json!(max_length));
            }
        }
        FieldKind::Number => {
            let mut integer = json!({ "type": "integer" });
            let mut numeric_text = json!({ "type": "string", "pattern": r"^\s*-?\d+\s*$" });
            if let Some(bounds) = &field.numeric {
                integer["minimum"] = json!(bounds.min);
                integer["maximum"] = json!(bounds.max);
                numeric_text["description"] = json!(format!(
                    "whole number between {} and {}",
                    bounds.min, bounds.max
                ));
            }
            schema.insert("anyOf".into(), json!([integer, numeric_text]));
        }
        FieldKind::SingleSelect => {
            schema.insert("type".into(), json!("string"));
            schema.insert("enum".into(), option_values(field));
        }
        FieldKind::MultiSelect => {
            schema.insert("type".into(), json!("array"));
            schema.insert(
                "items".into(),
                json!({ "type": "string", "enum": option_values(field) }),
            );
            schema.insert("uniqueItems".into(), json!(true));
            match field.selection {
                Some(SelectionBounds::Exact(count)) => {
                    schema.insert("minItems".into(), json!(count));
                    schema.insert("maxItems".into(), json!(count));
                }
                Some(SelectionBounds::Max(count)) => {
                    if field.required {
                        schema.insert("minItems".into(), json!(1));
                    }
                    schema.insert("maxItems".into(), json!(count));
                }
                None if field.required => {
                    schema.insert("minItems".into(), json!(1));
                }
                None => {}
            }
        }
    }

    Value::Object(schema)
}

fn option_values(field: &FieldSpec) -> Value {
    Value::Array(
        field
            .options
            .iter()
            .map(|option| Value::String(option.value.clone()))
            .collect(),
    )
}
