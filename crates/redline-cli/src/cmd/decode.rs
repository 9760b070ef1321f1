//! `rl decode` — decode a recorded feedback stream into typed events.

use clap::{Args, ValueEnum};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

use redline_core::stream::{decode, Event, Grammar};

use crate::output::OutputMode;

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Recorded stream file. Reads stdin when omitted.
    pub stream: Option<PathBuf>,

    /// Which payload shape the frames carry.
    #[arg(long, value_enum)]
    pub grammar: GrammarArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GrammarArg {
    Chat,
    Refine,
}

impl From<GrammarArg> for Grammar {
    fn from(arg: GrammarArg) -> Self {
        match arg {
            GrammarArg::Chat => Self::Chat,
            GrammarArg::Refine => Self::Refine,
        }
    }
}

/// JSON-lines row for one decoded event.
#[derive(Debug, Serialize)]
struct EventRow {
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
}

impl EventRow {
    fn from_event(event: &Event) -> Self {
        match event {
            Event::Content(text) => Self {
                kind: "content",
                data: Some(serde_json::Value::String(text.clone())),
            },
            Event::Progress(n) => Self {
                kind: "progress",
                data: Some(serde_json::json!(n)),
            },
            Event::SuggestionAdded(payload) => Self {
                kind: "suggestion",
                data: serde_json::to_value(payload).ok(),
            },
            Event::Score(score) => Self {
                kind: "score",
                data: Some(serde_json::json!(score)),
            },
            Event::Summary(text) => Self {
                kind: "summary",
                data: Some(serde_json::Value::String(text.clone())),
            },
            Event::Done => Self {
                kind: "done",
                data: None,
            },
            Event::Error(err) => Self {
                kind: "error",
                data: Some(serde_json::json!({
                    "code": err.code().code(),
                    "message": err.code().message(),
                    "detail": err.to_string(),
                })),
            },
        }
    }
}

pub fn run(args: &DecodeArgs, mode: OutputMode) -> anyhow::Result<()> {
    let source = super::open_source(args.stream.as_deref())?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut failed = false;

    for event in decode(source, args.grammar.into()) {
        if matches!(event, Event::Error(_)) {
            failed = true;
        }
        if mode.is_json() {
            serde_json::to_writer(&mut out, &EventRow::from_event(&event))?;
            writeln!(out)?;
        } else {
            writeln!(out, "{event}")?;
        }
    }

    if failed {
        anyhow::bail!("stream ended with a decode error");
    }
    Ok(())
}
