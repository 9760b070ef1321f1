#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{Parser, Subcommand};
use output::OutputMode;
use std::env;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "redline: streaming review feedback for article drafts",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Derive the output mode from flags.
    fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Decode a recorded feedback stream into events",
        after_help = "EXAMPLES:\n    # Decode a captured refine stream\n    rl decode --grammar refine refine.stream\n\n    # Decode a chat stream from stdin as JSON lines\n    cat chat.stream | rl decode --grammar chat --json"
    )]
    Decode(cmd::decode::DecodeArgs),

    #[command(
        about = "Run a refinement review session over article fields",
        after_help = "EXAMPLES:\n    # Ingest a captured refine stream and show the snapshot\n    rl review --title \"My Post\" --summary \"tl;dr\" --content-file draft.md refine.stream\n\n    # Apply every open suggestion after reconciling with a batch response\n    rl review --content-file draft.md refine.stream --batch refine.json --apply-all"
    )]
    Review(cmd::review::ReviewArgs),

    #[command(
        about = "Load a grammar-check batch and apply or dismiss issues",
        after_help = "EXAMPLES:\n    # List the issues against a draft\n    rl check --content-file draft.md --issues issues.json\n\n    # Apply issue 0 using its best candidate\n    rl check --content-file draft.md --issues issues.json --apply 0\n\n    # Check the title field instead of the content\n    rl check --field title --content-file title.txt --issues issues.json"
    )]
    Check(cmd::check::CheckArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("REDLINE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "redline=debug,info"
        } else {
            "redline=info,warn"
        })
    });

    let format = env::var("REDLINE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry.with(fmt::layer().json().with_ansi(false)).init();
        }
        _ => {
            registry.with(fmt::layer().compact()).init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mode = cli.output_mode();
    match cli.command {
        Commands::Decode(args) => cmd::decode::run(&args, mode),
        Commands::Review(args) => cmd::review::run(&args, mode, cli.quiet),
        Commands::Check(args) => cmd::check::run(&args, mode, cli.quiet),
    }
}
