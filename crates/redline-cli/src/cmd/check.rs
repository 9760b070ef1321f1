//! `rl check` — load a grammar-check batch and act on positioned issues.

use clap::Args;
use std::fs;
use std::path::PathBuf;
use tracing::info;

use redline_core::model::{Annotation, AnnotationId, Field};
use redline_core::stream::IssueBatch;
use redline_core::{ApplyOutcome, Engine, EngineError};

use crate::output::{bail, CliError, OutputMode};

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// File holding the article text to check.
    #[arg(long)]
    pub content_file: Option<PathBuf>,

    /// Which article field the checked text belongs to.
    #[arg(long, default_value = "content")]
    pub field: Field,

    /// Batch check response (JSON file) holding the positioned issues.
    #[arg(long)]
    pub issues: PathBuf,

    /// Apply one issue by number, splicing in a replacement.
    #[arg(long, value_name = "ID", conflicts_with = "dismiss")]
    pub apply: Option<u64>,

    /// Replacement text for `--apply`. Defaults to the issue's first
    /// candidate.
    #[arg(long, value_name = "TEXT", requires = "apply")]
    pub with: Option<String>,

    /// Dismiss one issue by number without touching the text.
    #[arg(long, value_name = "ID")]
    pub dismiss: Option<u64>,
}

pub fn run(args: &CheckArgs, mode: OutputMode, quiet: bool) -> anyhow::Result<()> {
    let text = super::read_field_file(args.content_file.as_ref())?;
    let mut engine = match args.field {
        Field::Title => Engine::new(text, String::new(), String::new()),
        Field::Summary => Engine::new(String::new(), text, String::new()),
        Field::Content => Engine::new(String::new(), String::new(), text),
    };

    let raw = fs::read_to_string(&args.issues)
        .map_err(|err| anyhow::anyhow!("cannot read {}: {err}", args.issues.display()))?;
    let batch: IssueBatch = serde_json::from_str(&raw)
        .map_err(|err| anyhow::anyhow!("invalid issue batch in {}: {err}", args.issues.display()))?;

    let loaded = engine.load_issue_batch(args.field, batch);
    info!(loaded = loaded.len(), "issue batch loaded");

    if let Some(n) = args.apply {
        let id = AnnotationId(n);
        let replacement = match &args.with {
            Some(text) => text.clone(),
            None => match first_candidate(&engine, id) {
                Ok(text) => text,
                Err(err) => return bail(mode, err),
            },
        };
        match engine.apply_positioned(id, &replacement) {
            Ok(outcome) => announce(mode, quiet, "applied", id, outcome),
            Err(err) => return bail(mode, CliError::coded(err.to_string(), err.code())),
        }
    }

    if let Some(n) = args.dismiss {
        let id = AnnotationId(n);
        match engine.dismiss(id) {
            Ok(outcome) => announce(mode, quiet, "dismissed", id, outcome),
            Err(err) => return bail(mode, CliError::coded(err.to_string(), err.code())),
        }
    }

    super::render_snapshot(mode, &engine.snapshot())
}

fn first_candidate(engine: &Engine, id: AnnotationId) -> Result<String, CliError> {
    let coded = |err: EngineError| CliError::coded(err.to_string(), err.code());
    match engine.annotation(id) {
        Some(Annotation::Issue(issue)) => issue.candidates.first().cloned().ok_or_else(|| {
            CliError::new(format!("issue {id} has no candidate; pass one with --with"))
        }),
        Some(Annotation::Suggestion(_)) => Err(coded(EngineError::WrongKind {
            id,
            expected: "positioned issue",
            actual: "search suggestion",
        })),
        None => Err(coded(EngineError::NotFound(id))),
    }
}

fn announce(mode: OutputMode, quiet: bool, verb: &str, id: AnnotationId, outcome: ApplyOutcome) {
    if quiet || mode.is_json() {
        return;
    }
    match outcome {
        ApplyOutcome::Resolved => println!("{verb} {id}"),
        ApplyOutcome::AlreadyResolved => println!("{id} already resolved, nothing to do"),
    }
}
