use anyhow::{Context, Result};
use clap::Parser;
use proof_session::check::Worklist;
use proof_session::config::{load_config, SessionLayout, ToolEnvironment};
use proof_session::runner::{preflight, ProcessRunner};
use proof_session::session::{SessionOrchestrator, SessionSummary};
use proof_session::workspace::ProjectWorkspace;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::RootArgs;

fn main() -> Result<()> {
    let args = RootArgs::parse();
    init_tracing(args.verbose);

    let root = args
        .root
        .canonicalize()
        .with_context(|| format!("resolve project root {}", args.root.display()))?;
    let config = load_config(&root, args.config.as_deref())?;
    let layout = SessionLayout::new(root.clone(), config);

    let worklist = match &args.check {
        Some(check) => Worklist::single(check.clone()),
        None => {
            let path = args
                .worklist
                .clone()
                .unwrap_or_else(|| layout.worklist_path());
            Worklist::load(&path)?
        }
    };

    preflight(
        &[
            layout.config().prover_program.as_str(),
            layout.config().build_program.as_str(),
        ],
        &root,
    )?;

    let env = ToolEnvironment::from_lookup(|name| std::env::var(name).ok());
    let workspace = ProjectWorkspace::prepare(&layout, args.keep_workspace)?;
    let mut runner = ProcessRunner::new(root);
    let summary = SessionOrchestrator::new(&layout, &mut runner, env)
        .refresh_contexts(args.refresh_contexts)
        .run(&worklist)?;
    drop(workspace);

    report_summary(&summary, args.json)
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn report_summary(summary: &SessionSummary, json: bool) -> Result<()> {
    tracing::info!(
        phases = summary.phases.len(),
        targeted_runs = summary.targeted_runs,
        drift_reports = summary.drift.reports.len(),
        removed_cache_files = summary.removed_cache_files.len(),
        "session regenerated"
    );
    for report in &summary.drift.reports {
        tracing::warn!(report = %report.display(), "drift report written");
    }
    if json {
        let text = serde_json::to_string_pretty(summary).context("serialize session summary")?;
        println!("{text}");
    }
    Ok(())
}
