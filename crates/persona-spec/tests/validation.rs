mod common;

use persona_spec::{
    AnswerState, AnswerValue, ErrorCode, QuestionnaireSpec, SchemaError, persona_questionnaire,
    validate_all, validate_section,
};
use serde_json::json;

use common::{compulsory_answers, engine};

#[test]
fn required_fields_reject_empty_values() {
    let spec = persona_questionnaire().expect("spec");
    for empty in [
        None,
        Some(AnswerValue::text("")),
        Some(AnswerValue::List(vec![])),
    ] {
        let mut answers = compulsory_answers();
        match &empty {
            Some(value) => {
                answers.insert("preferred_name", value.clone());
                answers.insert("current_priorities", value.clone());
            }
            None => {
                answers.remove("preferred_name");
                answers.remove("current_priorities");
            }
        }

        let basics = validate_section(&spec, 0, &answers).expect("section 0");
        let error = basics.errors.get("preferred_name").expect("name error");
        assert_eq!(error.code, ErrorCode::Required);
        assert_eq!(error.message, "This field is required");

        let context = validate_section(&spec, 2, &answers).expect("section 2");
        assert_eq!(
            context.errors["current_priorities"].message,
            "This field is required"
        );
    }
}

#[test]
fn required_fields_accept_non_empty_values() {
    let spec = persona_questionnaire().expect("spec");
    let answers = compulsory_answers();
    for index in 0..spec.sections.len() {
        let report = validate_section(&spec, index, &answers).expect("section");
        assert!(report.is_valid(), "section {} errors: {:?}", index, report.errors);
    }
}

#[test]
fn exact_selection_count_is_enforced() {
    let spec = persona_questionnaire().expect("spec");
    let mut answers = compulsory_answers();

    for picks in [
        vec!["career_growth", "mental_wellness"],
        vec![
            "career_growth",
            "mental_wellness",
            "physical_health",
            "personal_growth",
        ],
    ] {
        answers.insert("current_priorities", AnswerValue::list(picks));
        let report = validate_section(&spec, 2, &answers).expect("section");
        let error = &report.errors["current_priorities"];
        assert_eq!(error.code, ErrorCode::ExactSelections);
        assert_eq!(error.message, "Please select exactly 3 options");
    }

    answers.insert(
        "current_priorities",
        AnswerValue::list(["career_growth", "mental_wellness", "personal_growth"]),
    );
    assert!(validate_section(&spec, 2, &answers).expect("section").is_valid());
}

#[test]
fn max_selection_count_is_enforced() {
    let spec = persona_questionnaire().expect("spec");
    let mut answers = compulsory_answers();
    answers.insert(
        "support_preferences",
        AnswerValue::list(["empathy", "validation", "recognition", "creative_solutions"]),
    );
    let report = validate_section(&spec, 1, &answers).expect("section");
    assert_eq!(
        report.errors["support_preferences"].message,
        "Please select up to 3 options"
    );
}

#[test]
fn age_bounds_are_inclusive() {
    let spec = persona_questionnaire().expect("spec");
    let mut answers = compulsory_answers();

    for bad in ["12", "121", "abc", "twenty", "12.9", "age 34"] {
        answers.insert("age", AnswerValue::text(bad));
        let report = validate_section(&spec, 0, &answers).expect("section");
        assert_eq!(
            report.errors["age"].message,
            "Please enter a valid age between 13 and 120",
            "value {}",
            bad
        );
    }

    for good in [
        AnswerValue::text("13"),
        AnswerValue::text("120"),
        AnswerValue::from(64),
        AnswerValue::text("34 years"),
        AnswerValue::text("13.9"),
        AnswerValue::from_json(&json!(34.0)).expect("number"),
    ] {
        answers.insert("age", good);
        assert!(validate_section(&spec, 0, &answers).expect("section").is_valid());
    }
}

#[test]
fn long_text_and_unknown_options_are_rejected() {
    let spec = persona_questionnaire().expect("spec");
    let mut answers = compulsory_answers();
    answers.insert("biggest_challenge", AnswerValue::text("x".repeat(201)));
    answers.insert("stress_response", AnswerValue::text("panic"));

    let report = validate_section(&spec, 2, &answers).expect("section");
    assert_eq!(report.errors["biggest_challenge"].code, ErrorCode::TooLong);
    assert_eq!(report.errors["stress_response"].code, ErrorCode::UnknownOption);
}

#[test]
fn optional_section_passes_when_skipped() {
    let spec = persona_questionnaire().expect("spec");
    let report = validate_section(&spec, 4, &AnswerState::new()).expect("section");
    assert!(report.is_valid());
    assert!(validate_section(&spec, 5, &AnswerState::new()).is_none());
}

#[test]
fn validate_all_lists_only_failing_sections() {
    let spec = persona_questionnaire().expect("spec");
    let mut answers = compulsory_answers();
    answers.remove("goal_approach");
    let failing = validate_all(&spec, &answers);
    assert_eq!(failing.len(), 1);
    assert_eq!(failing[0].section, 3);
}

#[test]
fn section_errors_are_reported_together() {
    let mut engine = engine();
    assert!(!engine.validate_section(0).expect("section"));
    assert_eq!(engine.errors().len(), 5);
}

#[test]
fn revalidation_only_replaces_errors_of_that_section() {
    let mut engine = engine();
    engine.validate_section(0).expect("section 0");
    engine.validate_section(1).expect("section 1");
    assert_eq!(engine.errors().len(), 8);

    engine.set_answer("preferred_name", "Ada").expect("set");
    engine.set_answer("age", "40").expect("set");
    engine.validate_section(0).expect("section 0");

    assert!(engine.errors().get("preferred_name").is_none());
    assert!(engine.errors().get("gender").is_some());
    assert!(engine.errors().get("communication_style").is_some());
    assert_eq!(engine.errors().len(), 6);
}

#[test]
fn spec_check_rejects_overlapping_sections() {
    let spec: QuestionnaireSpec = serde_json::from_value(json!({
        "id": "broken",
        "title": "Broken",
        "version": "1.0",
        "compulsory_fields": [
            { "id": "name", "question": "Name?", "type": "text", "required": true }
        ],
        "sections": [
            { "id": "a", "title": "A", "questions": ["name"] },
            { "id": "b", "title": "B", "questions": ["name"] }
        ]
    }))
    .expect("deserialize");
    assert!(matches!(
        spec.check(),
        Err(SchemaError::FieldInSeveralSections(id)) if id == "name"
    ));
}

#[test]
fn spec_check_rejects_unknown_and_orphan_fields() {
    let unknown = json!({
        "id": "broken",
        "title": "Broken",
        "version": "1.0",
        "compulsory_fields": [
            { "id": "name", "question": "Name?", "type": "text", "required": true }
        ],
        "sections": [
            { "id": "a", "title": "A", "questions": ["name", "ghost"] }
        ]
    });
    assert!(matches!(
        QuestionnaireSpec::from_json(&unknown.to_string()),
        Err(SchemaError::UnknownField { field, .. }) if field == "ghost"
    ));

    let orphan = json!({
        "id": "broken",
        "title": "Broken",
        "version": "1.0",
        "compulsory_fields": [
            { "id": "name", "question": "Name?", "type": "text", "required": true }
        ],
        "optional_fields": [
            { "id": "nickname", "question": "Nickname?", "type": "text" }
        ],
        "sections": [
            { "id": "a", "title": "A", "questions": ["name"] }
        ]
    });
    assert!(matches!(
        QuestionnaireSpec::from_json(&orphan.to_string()),
        Err(SchemaError::OrphanField(id)) if id == "nickname"
    ));
}

#[test]
fn spec_check_rejects_bounds_on_wrong_kind() {
    let spec = json!({
        "id": "broken",
        "title": "Broken",
        "version": "1.0",
        "compulsory_fields": [
            {
                "id": "name",
                "question": "Name?",
                "type": "text",
                "required": true,
                "selection": { "exact": 2 }
            }
        ],
        "sections": [
            { "id": "a", "title": "A", "questions": ["name"] }
        ]
    });
    assert!(matches!(
        QuestionnaireSpec::from_json(&spec.to_string()),
        Err(SchemaError::InvalidField(id, _)) if id == "name"
    ));
}

#[test]
fn spec_check_limits_max_length_to_text_and_number_fields() {
    let spec_with = |kind: &str, options: serde_json::Value| {
        json!({
            "id": "lengths",
            "title": "Lengths",
            "version": "1.0",
            "compulsory_fields": [
                {
                    "id": "answer",
                    "question": "Answer?",
                    "type": kind,
                    "required": true,
                    "options": options,
                    "max_length": 3
                }
            ],
            "sections": [
                { "id": "a", "title": "A", "questions": ["answer"] }
            ]
        })
        .to_string()
    };

    assert!(QuestionnaireSpec::from_json(&spec_with("number", json!([]))).is_ok());
    assert!(QuestionnaireSpec::from_json(&spec_with("textarea", json!([]))).is_ok());

    let select = spec_with("single_select", json!([{ "value": "a", "label": "A" }]));
    assert!(matches!(
        QuestionnaireSpec::from_json(&select),
        Err(SchemaError::InvalidField(id, reason))
            if id == "answer" && reason == "max_length is only allowed on text and number fields"
    ));
}
