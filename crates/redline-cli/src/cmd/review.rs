//! `rl review` — run a refinement session over article fields.
//!
//! Ingests a captured refine stream into an engine, optionally reconciles
//! with the authoritative batch response, optionally applies every open
//! suggestion, then prints the snapshot.

use clap::Args;
use std::fs;
use std::path::PathBuf;
use tracing::info;

use redline_core::model::Annotation;
use redline_core::stream::{decode, Grammar, RefineBatch};
use redline_core::Engine;

use crate::output::OutputMode;

#[derive(Args, Debug)]
pub struct ReviewArgs {
    /// Recorded refine stream file. Reads stdin when omitted.
    pub stream: Option<PathBuf>,

    /// Article title.
    #[arg(long, default_value = "")]
    pub title: String,

    /// Article summary.
    #[arg(long, default_value = "")]
    pub summary: String,

    /// File holding the article content.
    #[arg(long)]
    pub content_file: Option<PathBuf>,

    /// Authoritative non-streaming batch response (JSON file). Replaces the
    /// streamed suggestions and scalars after ingestion.
    #[arg(long)]
    pub batch: Option<PathBuf>,

    /// Apply every open suggestion after ingesting.
    #[arg(long)]
    pub apply_all: bool,
}

pub fn run(args: &ReviewArgs, mode: OutputMode, quiet: bool) -> anyhow::Result<()> {
    let content = super::read_field_file(args.content_file.as_ref())?;
    let mut engine = Engine::new(args.title.clone(), args.summary.clone(), content);

    let source = super::open_source(args.stream.as_deref())?;
    let mut ingested = 0usize;
    for event in decode(source, Grammar::Refine) {
        engine.ingest(event);
        ingested += 1;
    }
    info!(ingested, "stream consumed");

    if let Some(path) = &args.batch {
        let raw = fs::read_to_string(path)
            .map_err(|err| anyhow::anyhow!("cannot read {}: {err}", path.display()))?;
        let batch: RefineBatch = serde_json::from_str(&raw)
            .map_err(|err| anyhow::anyhow!("invalid batch response in {}: {err}", path.display()))?;
        engine.reconcile_refine(batch);
    }

    if args.apply_all {
        let open: Vec<_> = engine
            .open_annotations()
            .filter(|a| matches!(a, Annotation::Suggestion(_)))
            .map(Annotation::id)
            .collect();
        for id in open {
            engine.apply_search(id)?;
            if !quiet && !mode.is_json() {
                println!("applied {id}");
            }
        }
    }

    super::render_snapshot(mode, &engine.snapshot())
}
