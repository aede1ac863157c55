mod wizard;

use async_trait::async_trait;
use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use persona_client::{
    ClientConfig, ClientError, HttpPersonaBackend, PersonaBackend, PersonaRecord, Step, advance,
    resume,
};
use persona_spec::{
    AnswerState, AnswerValue, FieldKind, FieldSpec, QuestionnaireEngine, QuestionnaireSpec,
    SectionPayload, SectionReport, SubmissionDocument, answers_schema, build_section_payload,
    persona_questionnaire, render_json_ui, submission_schema, to_submission_document, validate,
    validate_all,
};
use serde_json::Value;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use wizard::{AnswerParseError, PromptContext, Verbosity, WizardPresenter, encode_hex};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Persona questionnaire wizard",
    long_about = "Walks the persona questionnaire section by section, validates answer files, and talks to the persona store"
)]
struct Cli {
    /// Show verbose output and debug logs.
    #[arg(long, global = true, alias = "debug")]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum RenderMode {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Answer the questionnaire in a text shell and submit it.
    Wizard(WizardArgs),
    /// Validate an answers file against every section.
    Validate {
        /// Path to the answers JSON file.
        #[arg(long, value_name = "ANSWERS")]
        answers: PathBuf,
        /// Questionnaire definition (defaults to the built-in persona questionnaire).
        #[arg(long, value_name = "SPEC")]
        spec: Option<PathBuf>,
    },
    /// Print the submission document an answers file would produce.
    Document {
        #[arg(long, value_name = "ANSWERS")]
        answers: PathBuf,
        /// Identifier of the person the document belongs to.
        #[arg(long, value_name = "ID")]
        subject: String,
        #[arg(long, value_name = "SPEC")]
        spec: Option<PathBuf>,
        /// Emit CBOR as hex instead of JSON.
        #[arg(long)]
        cbor: bool,
    },
    /// Print the answers JSON Schema, or the submission document schema.
    Schema {
        #[arg(long, value_name = "SPEC")]
        spec: Option<PathBuf>,
        #[arg(long)]
        submission: bool,
    },
    /// Fetch the stored document for a subject.
    Fetch {
        #[arg(long, value_name = "ID")]
        subject: String,
        /// Persona store base URL.
        #[arg(long, value_name = "URL", env = "PERSONA_API_BASE_URL")]
        api_url: Option<String>,
    },
}

#[derive(Args)]
struct WizardArgs {
    /// Identifier of the person answering.
    #[arg(long, value_name = "ID")]
    subject: String,
    /// Questionnaire definition (defaults to the built-in persona questionnaire).
    #[arg(long, value_name = "SPEC")]
    spec: Option<PathBuf>,
    /// JSON file with initial answers.
    #[arg(long, value_name = "ANSWERS", conflicts_with = "existing")]
    answers: Option<PathBuf>,
    /// Previously stored document to edit.
    #[arg(long, value_name = "DOCUMENT")]
    existing: Option<PathBuf>,
    /// Load the subject's stored document from the persona store before starting.
    #[arg(long, conflicts_with_all = ["answers", "existing"])]
    resume: bool,
    /// Persona store base URL.
    #[arg(long, value_name = "URL", env = "PERSONA_API_BASE_URL")]
    api_url: Option<String>,
    /// Print the document instead of sending it.
    #[arg(long)]
    dry_run: bool,
    /// Also print the submitted document as JSON.
    #[arg(long)]
    answers_json: bool,
    /// Render output mode for each section.
    #[arg(long, value_enum, default_value_t = RenderMode::Text)]
    format: RenderMode,
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Wizard(args) => run_wizard(args, cli.verbose).await,
        Command::Validate { answers, spec } => run_validate(&answers, spec.as_deref()),
        Command::Document {
            answers,
            subject,
            spec,
            cbor,
        } => run_document(&answers, &subject, spec.as_deref(), cbor),
        Command::Schema { spec, submission } => run_schema(spec.as_deref(), submission),
        Command::Fetch { subject, api_url } => run_fetch(&subject, api_url.as_deref()).await,
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "persona_qa={level},persona_spec={level},persona_client={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn load_spec(path: Option<&Path>) -> CliResult<QuestionnaireSpec> {
    let spec = match path {
        Some(path) => QuestionnaireSpec::from_json(&fs::read_to_string(path)?)?,
        None => persona_questionnaire()?,
    };
    debug!(id = %spec.id, version = %spec.version, "loaded questionnaire");
    Ok(spec)
}

fn load_answers(path: &Path) -> CliResult<AnswerState> {
    let value: Value = serde_json::from_str(&fs::read_to_string(path)?)?;
    if !value.is_object() {
        return Err(format!("{} must contain a JSON object", path.display()).into());
    }
    AnswerState::from_json(&value)
        .map_err(|err| format!("{}: {}", path.display(), err).into())
}

/// Accepts either the flat document or the nested record the store returns.
fn load_document(path: &Path) -> CliResult<SubmissionDocument> {
    let contents = fs::read_to_string(path)?;
    if let Ok(document) = serde_json::from_str::<SubmissionDocument>(&contents) {
        return Ok(document);
    }
    let record: PersonaRecord = serde_json::from_str(&contents)?;
    Ok(record.into())
}

fn client_config(api_url: Option<&str>) -> CliResult<ClientConfig> {
    let config = ClientConfig::from_env()?;
    Ok(match api_url {
        Some(url) => ClientConfig::new(url)?.with_timeout(config.timeout),
        None => config,
    })
}

/// Accepts every document without sending it anywhere.
struct DryRunBackend;

#[async_trait]
impl PersonaBackend for DryRunBackend {
    async fn store_persona(&self, document: &SubmissionDocument) -> Result<(), ClientError> {
        info!(subject = %document.subject_id, "dry run, document not sent");
        Ok(())
    }

    async fn get_persona(
        &self,
        _subject_id: &str,
    ) -> Result<Option<SubmissionDocument>, ClientError> {
        Ok(None)
    }
}

async fn run_wizard(args: WizardArgs, verbose: bool) -> CliResult<()> {
    let spec = load_spec(args.spec.as_deref())?;
    let backend: Box<dyn PersonaBackend> = if args.dry_run {
        Box::new(DryRunBackend)
    } else {
        Box::new(HttpPersonaBackend::new(client_config(
            args.api_url.as_deref(),
        )?)?)
    };
    let mut engine = start_engine(spec, &args, backend.as_ref()).await?;
    let mut presenter = WizardPresenter::new(Verbosity::from_verbose(verbose), args.answers_json);
    let mut resubmit = false;

    loop {
        if !resubmit {
            let payload = build_section_payload(&engine);
            presenter.show_header(&payload);
            print_render_output(args.format, &payload, &presenter)?;
            if let SectionInput::Back = collect_section(&mut engine, &payload, &presenter)? {
                let to = engine.retreat()?;
                debug!(section = to, "went back a section");
                continue;
            }
        }
        resubmit = false;

        match advance(&mut engine, backend.as_ref()).await? {
            Step::Moved(to) => debug!(section = to, "moved to next section"),
            Step::Blocked(_) => presenter.show_section_errors(&build_section_payload(&engine)),
            Step::Submitted(document) => {
                presenter.show_completion(&document, args.dry_run);
                return Ok(());
            }
            Step::Failed(message) => {
                presenter.show_submission_failure(&message);
                if !prompt_bool("Retry submission?", true)? {
                    return Err(format!("submission failed: {}", message).into());
                }
                engine.retry_from_failure()?;
                resubmit = true;
            }
        }
    }
}

async fn start_engine(
    spec: QuestionnaireSpec,
    args: &WizardArgs,
    backend: &dyn PersonaBackend,
) -> CliResult<QuestionnaireEngine> {
    if let Some(path) = &args.existing {
        let document = load_document(path)?;
        if document.subject_id != args.subject {
            return Err(format!(
                "document belongs to '{}', not '{}'",
                document.subject_id, args.subject
            )
            .into());
        }
        return Ok(QuestionnaireEngine::from_document(spec, &document)?);
    }
    if let Some(path) = &args.answers {
        let answers = load_answers(path)?;
        return Ok(QuestionnaireEngine::with_answers(
            spec,
            args.subject.as_str(),
            answers,
        )?);
    }
    if args.resume {
        return Ok(resume(spec, &args.subject, backend).await?);
    }
    Ok(QuestionnaireEngine::new(spec, args.subject.as_str())?)
}

enum SectionInput {
    Done,
    Back,
}

enum FieldInput {
    Set(AnswerValue),
    Clear,
    Keep,
    Back,
}

fn collect_section(
    engine: &mut QuestionnaireEngine,
    payload: &SectionPayload,
    presenter: &WizardPresenter,
) -> CliResult<SectionInput> {
    let total = payload.fields.len();
    for (index, field) in payload.fields.iter().enumerate() {
        let definition = engine
            .spec()
            .field(&field.id)
            .cloned()
            .ok_or_else(|| format!("field '{}' is not defined", field.id))?;
        let prompt = PromptContext::new(field, index, total);

        match prompt_field(&prompt, &definition, presenter)? {
            FieldInput::Set(value) => engine.set_answer(&field.id, value)?,
            FieldInput::Clear => engine.clear_answer(&field.id)?,
            FieldInput::Keep => {}
            FieldInput::Back => return Ok(SectionInput::Back),
        }
    }
    Ok(SectionInput::Done)
}

fn prompt_field(
    prompt: &PromptContext,
    field: &FieldSpec,
    presenter: &WizardPresenter,
) -> CliResult<FieldInput> {
    loop {
        presenter.show_prompt(prompt);
        let input = read_input()?;
        let trimmed = input.trim();

        if trimmed.eq_ignore_ascii_case("exit") {
            return Err("wizard aborted by user".into());
        }
        if trimmed.eq_ignore_ascii_case("back") {
            return Ok(FieldInput::Back);
        }
        if trimmed.is_empty() && prompt.current.is_some() {
            return Ok(FieldInput::Keep);
        }
        if trimmed == "-" {
            return Ok(FieldInput::Clear);
        }

        match parse_answer(field, trimmed) {
            Ok(Some(value)) => return Ok(FieldInput::Set(value)),
            Ok(None) => return Ok(FieldInput::Clear),
            Err(err) => presenter.show_parse_error(&err),
        }
    }
}

fn read_input() -> CliResult<String> {
    print!("> ");
    io::stdout().flush()?;
    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Err("input closed before the questionnaire was finished".into());
    }
    Ok(input)
}

fn prompt_bool(prompt: &str, default: bool) -> CliResult<bool> {
    let marker = if default { "Y/n" } else { "y/N" };
    println!("{} [{}]", prompt, marker);
    let input = read_input()?;
    match input.trim().to_lowercase().as_str() {
        "" => Ok(default),
        "y" | "yes" | "true" | "1" => Ok(true),
        _ => Ok(false),
    }
}

/// Converts one line of input into an answer; `Ok(None)` leaves an optional field unanswered.
fn parse_answer(field: &FieldSpec, raw: &str) -> Result<Option<AnswerValue>, AnswerParseError> {
    let value = raw.trim();
    if value.is_empty() {
        if field.required {
            return Err(AnswerParseError::new(
                "This question requires an answer.",
                None,
            ));
        }
        return Ok(None);
    }

    match field.kind {
        FieldKind::Text | FieldKind::Textarea => Ok(Some(AnswerValue::text(value))),
        FieldKind::Number => parse_whole_number(value).map(Some),
        FieldKind::SingleSelect => resolve_option(field, value)
            .map(AnswerValue::text)
            .map(Some),
        FieldKind::MultiSelect => parse_selection(field, value).map(Some),
    }
}

// Kept as text so the stored value matches what was typed.
fn parse_whole_number(raw: &str) -> Result<AnswerValue, AnswerParseError> {
    let value = AnswerValue::text(raw);
    match validate::parse_integer(&value) {
        Some(_) => Ok(value),
        None => Err(AnswerParseError::new(
            "Please enter a whole number.",
            Some("expected integer".to_string()),
        )),
    }
}

/// Matches a 1-based position, an option value, or an option label.
fn resolve_option(field: &FieldSpec, raw: &str) -> Result<String, AnswerParseError> {
    if let Ok(position) = raw.parse::<usize>()
        && let Some(option) = position
            .checked_sub(1)
            .and_then(|index| field.options.get(index))
    {
        return Ok(option.value.clone());
    }

    field
        .options
        .iter()
        .find(|option| {
            option.value.eq_ignore_ascii_case(raw) || option.label.eq_ignore_ascii_case(raw)
        })
        .map(|option| option.value.clone())
        .ok_or_else(|| {
            let allowed = field
                .options
                .iter()
                .map(|option| option.value.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            AnswerParseError::new(
                format!("Choose one of: {}.", allowed),
                Some(format!("allowed values: {}", allowed)),
            )
        })
}

fn parse_selection(field: &FieldSpec, raw: &str) -> Result<AnswerValue, AnswerParseError> {
    let mut selected: Vec<String> = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|part| !part.is_empty()) {
        let value = resolve_option(field, part)?;
        if !selected.contains(&value) {
            selected.push(value);
        }
    }
    Ok(AnswerValue::List(selected))
}

fn print_render_output(
    mode: RenderMode,
    payload: &SectionPayload,
    presenter: &WizardPresenter,
) -> CliResult<()> {
    match mode {
        RenderMode::Text => presenter.show_section(payload),
        RenderMode::Json => {
            println!("{}", serde_json::to_string_pretty(&render_json_ui(payload))?)
        }
    }
    Ok(())
}

fn run_validate(answers_path: &Path, spec_path: Option<&Path>) -> CliResult<()> {
    let spec = load_spec(spec_path)?;
    let answers = load_answers(answers_path)?;
    let reports = validate_all(&spec, &answers);
    let unknown = answers
        .iter()
        .map(|(id, _)| id.as_str())
        .filter(|id| spec.field(id).is_none())
        .collect::<Vec<_>>();

    let valid = reports.is_empty() && unknown.is_empty();
    println!(
        "Validation result: {}",
        if valid { "valid" } else { "invalid" }
    );
    describe_validation(&spec, &reports);
    if !unknown.is_empty() {
        println!("Unknown answer fields: {}", unknown.join(", "));
    }

    if valid {
        Ok(())
    } else {
        Err("validation failed".into())
    }
}

fn describe_validation(spec: &QuestionnaireSpec, reports: &[SectionReport]) {
    for report in reports {
        let title = spec
            .section(report.section)
            .map(|section| section.title.as_str())
            .unwrap_or("<unknown>");
        println!("Errors in {}:", title);
        for (id, error) in &report.errors {
            println!("  {} - {}", id, error.message);
        }
    }
}

fn run_document(
    answers_path: &Path,
    subject: &str,
    spec_path: Option<&Path>,
    cbor: bool,
) -> CliResult<()> {
    let spec = load_spec(spec_path)?;
    let answers = load_answers(answers_path)?;
    let document = to_submission_document(&spec, &answers, subject, Utc::now());

    if cbor {
        println!("{}", encode_hex(&document.to_cbor()?));
    } else {
        println!("{}", document.to_json_pretty()?);
    }
    Ok(())
}

fn run_schema(spec_path: Option<&Path>, submission: bool) -> CliResult<()> {
    let schema = if submission {
        submission_schema()
    } else {
        answers_schema(&load_spec(spec_path)?)
    };
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

async fn run_fetch(subject: &str, api_url: Option<&str>) -> CliResult<()> {
    let backend = HttpPersonaBackend::new(client_config(api_url)?)?;
    match backend.get_persona(subject).await? {
        Some(document) => println!("{}", document.to_json_pretty()?),
        None => println!("No persona stored for {}", subject),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(id: &str) -> FieldSpec {
        persona_questionnaire()
            .expect("builtin spec")
            .field(id)
            .cloned()
            .expect("field exists")
    }

    #[test]
    fn parse_answer_requires_compulsory_input() {
        let err = parse_answer(&field("preferred_name"), "   ").unwrap_err();
        assert_eq!(err.user_message, "This question requires an answer.");
    }

    #[test]
    fn parse_answer_leaves_optional_blank() {
        assert_eq!(parse_answer(&field("learning_style"), "").unwrap(), None);
    }

    #[test]
    fn parse_answer_number_keeps_typed_text() {
        assert_eq!(
            parse_answer(&field("age"), " 34 ").unwrap(),
            Some(AnswerValue::text("34"))
        );
        assert_eq!(
            parse_answer(&field("age"), "34 years").unwrap(),
            Some(AnswerValue::text("34 years"))
        );
        assert!(parse_answer(&field("age"), "thirty").is_err());
    }

    #[test]
    fn parse_answer_single_select_accepts_position_value_or_label() {
        let gender = field("gender");
        let first = gender.options[0].clone();
        assert_eq!(
            parse_answer(&gender, "1").unwrap(),
            Some(AnswerValue::text(first.value.clone()))
        );
        assert_eq!(
            parse_answer(&gender, &first.value.to_uppercase()).unwrap(),
            Some(AnswerValue::text(first.value.clone()))
        );
        assert_eq!(
            parse_answer(&gender, &first.label).unwrap(),
            Some(AnswerValue::text(first.value))
        );
        assert!(parse_answer(&gender, "99").is_err());
    }

    #[test]
    fn parse_answer_multi_select_splits_and_dedupes() {
        let priorities = field("current_priorities");
        let first = priorities.options[0].value.clone();
        let second = priorities.options[1].value.clone();
        let raw = format!("1, {second}, {first},");
        assert_eq!(
            parse_answer(&priorities, &raw).unwrap(),
            Some(AnswerValue::List(vec![first, second]))
        );
    }

    #[test]
    fn parse_answer_multi_select_rejects_unknown_option() {
        let err = parse_answer(&field("support_preferences"), "empathy, telepathy").unwrap_err();
        assert!(err.user_message.starts_with("Choose one of:"));
    }

    #[test]
    fn encode_hex_is_lowercase_pairs() {
        assert_eq!(encode_hex(&[0x00, 0xa4, 0xff]), "00a4ff");
    }
}
