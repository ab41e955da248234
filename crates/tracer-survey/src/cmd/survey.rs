use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Subcommand};
use serde::Serialize;
use survey_runtime::{
    DraftBundle, IntegrityIssue, RespondentRuntime, SurveyApi, SurveyBuilder, SurveyInit,
};
use survey_spec::{Progress, SurveyDocument, document_schema};
use tracing::warn;

use super::{block_on, http_api, print_json};
use crate::config::Config;

#[derive(Subcommand, Debug, Clone)]
pub enum SurveyCommand {
    /// Report structural problems in a survey package
    Check(FileArgs),
    /// Print what a respondent sees on one page
    Page(PageArgs),
    /// Apply answers to one page and report validation and progress
    Preview(PreviewArgs),
    /// Print the JSON Schema of survey packages
    Schema,
    /// Download a survey package from the configured backend
    Fetch(FetchArgs),
}

#[derive(Args, Debug, Clone)]
pub struct FileArgs {
    /// Survey package JSON
    pub file: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct PageArgs {
    pub file: PathBuf,
    /// Zero-based page index
    #[arg(long, default_value_t = 0)]
    pub index: usize,
}

#[derive(Args, Debug, Clone)]
pub struct PreviewArgs {
    pub file: PathBuf,
    #[arg(long, default_value_t = 0)]
    pub index: usize,
    /// Draft JSON with `answers` and optional `otherValues`
    #[arg(long, value_name = "FILE")]
    pub answers: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    pub survey_id: String,
    /// Write the package here instead of stdout
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PreviewReport {
    survey_id: Option<String>,
    page_index: usize,
    visible_questions: Vec<String>,
    answered: usize,
    progress: Progress,
    valid: bool,
    can_submit: bool,
    errors: BTreeMap<String, String>,
}

pub fn run(command: SurveyCommand, config: &Config) -> Result<()> {
    match command {
        SurveyCommand::Check(args) => check(&args.file),
        SurveyCommand::Page(args) => {
            let document = read_document(&args.file)?;
            let view = document.page_view(args.index).ok_or_else(|| {
                anyhow!(
                    "page {} out of range; {} has {} page(s)",
                    args.index,
                    args.file.display(),
                    document.page_count()
                )
            })?;
            print_json(&view)
        }
        SurveyCommand::Preview(args) => preview(&args),
        SurveyCommand::Schema => print_json(&document_schema()),
        SurveyCommand::Fetch(args) => fetch(&args, config),
    }
}

pub fn read_document(path: &Path) -> Result<SurveyDocument> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    SurveyDocument::from_json(&raw)
        .with_context(|| format!("{} is not a survey package", path.display()))
}

/// References the builder would silently drop on load, followed by the
/// builder's own findings on what it kept.
pub fn integrity_issues(document: &SurveyDocument) -> Vec<IntegrityIssue> {
    let known: BTreeSet<&str> = document.questions.iter().map(|q| q.id()).collect();
    let mut issues: Vec<IntegrityIssue> = document
        .pages
        .iter()
        .flat_map(|page| {
            page.question_ids
                .iter()
                .filter(|id| !known.contains(id.as_str()))
                .map(|id| IntegrityIssue::DanglingReference {
                    page_id: page.id.clone(),
                    question_id: id.clone(),
                })
        })
        .collect();
    issues.extend(SurveyBuilder::from_document(document.clone()).check_integrity());
    issues
}

fn check(path: &Path) -> Result<()> {
    let document = read_document(path)?;
    let issues = integrity_issues(&document);
    if issues.is_empty() {
        println!(
            "{}: {} question(s) on {} page(s), no issues",
            path.display(),
            document.questions.len(),
            document.page_count()
        );
        return Ok(());
    }
    print_json(&issues)?;
    bail!("{}: {} integrity issue(s)", path.display(), issues.len());
}

fn preview(args: &PreviewArgs) -> Result<()> {
    let document = read_document(&args.file)?;
    let view = document
        .page_view(args.index)
        .ok_or_else(|| anyhow!("page {} out of range", args.index))?;
    let bundle = match &args.answers {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str::<DraftBundle>(&raw)
                .with_context(|| format!("{} is not a draft", path.display()))?
        }
        None => DraftBundle::default(),
    };

    let mut runtime = RespondentRuntime::new();
    runtime.initialize_survey(SurveyInit {
        questions: view.questions,
        conditionals: view.conditionals,
        survey_id: document.id.clone().unwrap_or_default(),
        survey_title: document.title.clone().unwrap_or_default(),
        user_id: None,
        preserve_data: false,
    });
    for (question_id, value) in bundle.answers {
        runtime.set_answer(&question_id, value);
    }
    for (question_id, value) in bundle.other_values {
        runtime.set_other_value(&question_id, value);
    }
    let valid = runtime.validate_current_page();

    let state = runtime.state();
    let report = PreviewReport {
        survey_id: state.survey_id.clone(),
        page_index: args.index,
        visible_questions: runtime
            .visible_questions()
            .into_iter()
            .map(|question| question.id)
            .collect(),
        answered: runtime.answered_count(),
        progress: runtime.progress(),
        valid,
        can_submit: runtime.can_submit(),
        errors: state.errors.clone(),
    };
    print_json(&report)
}

fn fetch(args: &FetchArgs, config: &Config) -> Result<()> {
    let api = http_api(config)?;
    let document = block_on(api.fetch_survey(&args.survey_id))?
        .with_context(|| format!("failed to fetch survey {}", args.survey_id))?;
    let issues = integrity_issues(&document);
    if !issues.is_empty() {
        warn!(survey_id = %args.survey_id, issues = issues.len(), "fetched package has integrity issues");
    }
    match &args.out {
        Some(path) => {
            fs::write(path, document.to_json_pretty()?)
                .with_context(|| format!("failed to write {}", path.display()))?;
            Ok(())
        }
        None => print_json(&document),
    }
}
