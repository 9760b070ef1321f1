//! Command handlers for the `rl` binary.

pub mod check;
pub mod decode;
pub mod review;

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use redline_core::model::Annotation;
use redline_core::Snapshot;

use crate::output::{kv, render, rule, section, OutputMode};

/// Open the stream source: a file if given, stdin otherwise.
pub fn open_source(path: Option<&Path>) -> anyhow::Result<Box<dyn Read>> {
    match path {
        Some(path) => Ok(Box::new(fs::File::open(path).map_err(|err| {
            anyhow::anyhow!("cannot open stream {}: {err}", path.display())
        })?)),
        None => Ok(Box::new(io::stdin())),
    }
}

/// Read an article field from a file, or return empty for a missing flag.
pub fn read_field_file(path: Option<&PathBuf>) -> anyhow::Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .map_err(|err| anyhow::anyhow!("cannot read {}: {err}", path.display())),
        None => Ok(String::new()),
    }
}

/// Render an engine snapshot in the selected mode.
pub fn render_snapshot(mode: OutputMode, snapshot: &Snapshot) -> anyhow::Result<()> {
    render(mode, snapshot, |snap, w| {
        section(w, "Review")?;
        if let Some(score) = snap.overall_score {
            kv(w, "score", format!("{score:.1}/10"))?;
        }
        if let Some(summary) = &snap.review_summary {
            kv(w, "summary", summary)?;
        }
        if let Some(error) = &snap.stream_error {
            kv(w, "stream", format!("failed: {error}"))?;
        } else {
            kv(w, "stream", if snap.completed { "complete" } else { "partial" })?;
        }
        writeln!(w)?;

        if snap.annotations.is_empty() {
            writeln!(w, "no open annotations")?;
        } else {
            section(w, "Open annotations")?;
            for annotation in &snap.annotations {
                match annotation {
                    Annotation::Issue(issue) => {
                        writeln!(
                            w,
                            "{}  [{}] {} @ {}+{}: {} ({})",
                            issue.id,
                            issue.severity,
                            issue.field,
                            issue.start,
                            issue.len,
                            issue.message,
                            issue.candidates.join(", "),
                        )?;
                    }
                    Annotation::Suggestion(s) => {
                        writeln!(
                            w,
                            "{}  [{}] {}: '{}' -> '{}' ({})",
                            s.id, s.category, s.field, s.original, s.suggested, s.explanation,
                        )?;
                    }
                }
            }
        }

        writeln!(w)?;
        section(w, "Fields")?;
        kv(w, "title", &snap.title)?;
        kv(w, "summary", &snap.summary)?;
        writeln!(w, "{}", snap.content)?;
        Ok(())
    })
}
