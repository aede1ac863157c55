use std::fmt::Write;

use persona_spec::{ChoiceOption, FieldKind, RenderField, SectionPayload, SubmissionDocument};

/// Controls which bits of state the wizard prints.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Verbosity {
    /// Clean output: section headers and prompts only.
    Clean,
    /// Verbose output: status, field list, option values, error codes.
    Verbose,
}

impl Verbosity {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

/// Prints section headers, prompts and outcomes for the text wizard.
pub struct WizardPresenter {
    verbosity: Verbosity,
    header_printed: bool,
    show_answers_json: bool,
}

impl WizardPresenter {
    pub fn new(verbosity: Verbosity, show_answers_json: bool) -> Self {
        Self {
            verbosity,
            header_printed: false,
            show_answers_json,
        }
    }

    pub fn show_header(&mut self, payload: &SectionPayload) {
        if self.header_printed {
            return;
        }
        println!("Questionnaire: {}", payload.questionnaire_title);
        println!("Type 'back' to return to the previous section or 'exit' to stop.");
        self.header_printed = true;
    }

    pub fn show_section(&self, payload: &SectionPayload) {
        println!();
        let title = payload.section_title.as_deref().unwrap_or("Section");
        match &payload.section_icon {
            Some(icon) => println!(
                "[{}/{}] {} {}",
                payload.progress.position, payload.progress.total, icon, title
            ),
            None => println!(
                "[{}/{}] {}",
                payload.progress.position, payload.progress.total, title
            ),
        }
        if let Some(subtitle) = &payload.section_subtitle {
            println!("{}", subtitle);
        }
        if self.verbosity.is_verbose() {
            println!("Status: {}", payload.status.as_str());
            for field in &payload.fields {
                let mut entry = format!(" - {} ({})", field.id, field.kind.as_str());
                if field.required {
                    entry.push_str(" [required]");
                }
                println!("{}", entry);
            }
        }
    }

    pub fn show_prompt(&self, prompt: &PromptContext) {
        let mut line = format!("{}/{} {}", prompt.index, prompt.total, prompt.question);
        if prompt.required {
            line.push_str(" *");
        }
        if let Some(hint) = &prompt.hint {
            line.push(' ');
            line.push_str(hint);
        }
        println!("{}", line);
        if let Some(description) = &prompt.description {
            println!("{}", description);
        }
        for (position, option) in prompt.options.iter().enumerate() {
            if self.verbosity.is_verbose() {
                println!("  {}) {} [{}]", position + 1, option.label, option.value);
            } else {
                println!("  {}) {}", position + 1, option.label);
            }
        }
        if let Some(selection) = &prompt.selection_hint {
            println!("{}", selection);
        }
        if let Some(count) = &prompt.char_count {
            println!("Characters: {}", count);
        }
        if let Some(current) = &prompt.current {
            println!("Current: {} (press enter to keep, '-' to clear)", current);
        }
    }

    pub fn show_parse_error(&self, error: &AnswerParseError) {
        eprintln!("Invalid answer: {}", error.user_message);
        if let Some(debug) = &error.debug_message {
            eprintln!("  Expected: {}", debug);
        }
    }

    /// Lists the fields that blocked the section from advancing.
    pub fn show_section_errors(&self, payload: &SectionPayload) {
        eprintln!("Please fix the following before continuing:");
        for field in &payload.fields {
            if let Some(error) = &field.error {
                if self.verbosity.is_verbose() {
                    eprintln!("  {} ({:?}): {}", field.id, error.code, error.message);
                } else {
                    eprintln!("  {}: {}", field.question, error.message);
                }
            }
        }
    }

    pub fn show_submission_failure(&self, message: &str) {
        eprintln!("Submission failed: {}", message);
        eprintln!("Your answers are kept.");
    }

    pub fn show_completion(&self, document: &SubmissionDocument, print_document: bool) {
        println!("Done ✅");
        println!(
            "Completion: {}% ({} optional answered)",
            document.metadata.completion_percentage, document.metadata.optional_completed
        );
        if self.verbosity.is_verbose() {
            match document.to_cbor() {
                Ok(bytes) => println!("Document (CBOR hex): {}", encode_hex(&bytes)),
                Err(err) => eprintln!("Failed to serialize document to CBOR: {}", err),
            }
        }
        if print_document || self.show_answers_json {
            match document.to_json_pretty() {
                Ok(pretty) => println!("{}", pretty),
                Err(err) => eprintln!("Failed to serialize document to JSON: {}", err),
            }
        }
    }
}

/// Context used to format a single field prompt.
pub struct PromptContext {
    pub index: usize,
    pub total: usize,
    pub question: String,
    pub description: Option<String>,
    pub required: bool,
    pub hint: Option<String>,
    pub options: Vec<ChoiceOption>,
    pub selection_hint: Option<String>,
    pub char_count: Option<String>,
    pub current: Option<String>,
}

impl PromptContext {
    pub fn new(field: &RenderField, index: usize, total: usize) -> Self {
        Self {
            index: index + 1,
            total,
            question: field.question.clone(),
            description: field.description.clone(),
            required: field.required,
            hint: kind_hint(field),
            options: field.options.clone(),
            selection_hint: field.selection_hint.clone(),
            char_count: field.char_count.clone(),
            current: field
                .current_value
                .as_ref()
                .filter(|value| !value.is_empty())
                .map(ToString::to_string),
        }
    }
}

fn kind_hint(field: &RenderField) -> Option<String> {
    match field.kind {
        FieldKind::Number => Some("(whole number)".to_string()),
        FieldKind::SingleSelect => Some("(pick one number or value)".to_string()),
        FieldKind::MultiSelect => Some("(comma separated numbers or values)".to_string()),
        FieldKind::Text | FieldKind::Textarea => field
            .placeholder
            .as_ref()
            .map(|placeholder| format!("(e.g. {})", placeholder)),
    }
}

/// Error produced when parsing answers from the user.
#[derive(Debug)]
pub struct AnswerParseError {
    pub user_message: String,
    pub debug_message: Option<String>,
}

impl AnswerParseError {
    pub fn new(user_message: impl Into<String>, debug_message: Option<String>) -> Self {
        Self {
            user_message: user_message.into(),
            debug_message,
        }
    }
}

pub fn encode_hex(bytes: &[u8]) -> String {
    let mut encoded = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(&mut encoded, "{:02x}", byte);
    }
    encoded
}
