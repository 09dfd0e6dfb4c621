//! CLI argument parsing for session regeneration.
use clap::Parser;
use proof_session::check::CheckIdentifier;
use std::path::PathBuf;

/// Regenerate and validate the proof session of a verification project.
#[derive(Parser, Debug)]
#[command(
    name = "prove-session",
    version,
    about = "Regenerate and validate the persisted proof session",
    after_help = "Without CHECK every entry of the worklist file (manual_proof.in) is regenerated.\n\nExamples:\n  prove-session\n  prove-session spark-big_integers.adb:412\n  prove-session --root lib/sparklib --json"
)]
pub struct RootArgs {
    /// Single check to regenerate: a check name or file:line
    #[arg(value_name = "CHECK")]
    pub check: Option<CheckIdentifier>,

    /// Project root holding the sources, proof tree and worklist
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Session config JSON (defaults to <root>/session.json when present)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Worklist file overriding the configured one
    #[arg(long, value_name = "PATH", conflicts_with = "check")]
    pub worklist: Option<PathBuf>,

    /// After the final phase, refresh context headers from the regenerated scripts.
    /// Drift validation still compares against the unmerged contexts
    #[arg(long)]
    pub refresh_contexts: bool,

    /// Keep the generated project file and source copy after the run
    #[arg(long)]
    pub keep_workspace: bool,

    /// Emit the session summary as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long)]
    pub verbose: bool,
}
