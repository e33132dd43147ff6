pub mod history;
pub mod interactive;
pub mod run;
pub mod schema;

use crate::checkpoint::create_store;
use crate::config::{Config, Variant};
use crate::error::{PipelineError, TestPilotError};
use crate::output::write_run_report;
use crate::pipeline::{PipelineGraph, RunReport};
use crate::provider::create_generator;
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const DEFAULT_CONFIG: &str = "testpilot.yaml";

#[derive(Parser)]
#[command(name = "testpilot")]
#[command(
    author,
    version,
    about = "Plan, peer-review and risk-assess a project idea with a chain of LLM stages"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose/debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the pipeline once for a project description
    Run(RunArgs),

    /// Read project descriptions from stdin, one per line, in one session
    Interactive(InteractiveArgs),

    /// Print the stored conversation transcript for a session
    History(HistoryArgs),

    /// Print JSON Schema for config validation
    Schema,
}

/// Options shared by every command that builds a pipeline
#[derive(Args, Clone)]
pub struct PipelineArgs {
    /// Path to config file (default: testpilot.yaml if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the stage preset
    #[arg(long, value_enum)]
    pub variant: Option<Variant>,

    /// Override the model identifier
    #[arg(long)]
    pub model: Option<String>,

    /// Override output directory
    #[arg(long)]
    pub report_dir: Option<PathBuf>,

    /// Do not write report files
    #[arg(long)]
    pub no_report: bool,
}

#[derive(Parser, Clone)]
pub struct RunArgs {
    /// One-line project description
    #[arg(value_name = "IDEA")]
    pub idea: String,

    /// Session to accumulate the conversation into (default: new UUID)
    #[arg(long, env = "TESTPILOT_SESSION")]
    pub session: Option<String>,

    /// Print the final state as JSON instead of formatted text
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

#[derive(Parser, Clone)]
pub struct InteractiveArgs {
    /// Session shared by every submission (default: new UUID)
    #[arg(long, env = "TESTPILOT_SESSION")]
    pub session: Option<String>,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

#[derive(Parser, Clone)]
pub struct HistoryArgs {
    /// Session to show
    #[arg(long)]
    pub session: String,

    /// Path to config file (for the checkpoint directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Load config and apply CLI overrides
pub fn load_config(args: &PipelineArgs) -> anyhow::Result<Config> {
    let mut config = Config::load_or_default(args.config.as_deref(), Path::new(DEFAULT_CONFIG))?;

    if let Some(variant) = args.variant {
        config.variant = variant;
        // An explicit preset wins over a configured stage list
        config.stages.clear();
    }
    if let Some(ref model) = args.model {
        config.model = Some(model.clone());
    }
    if let Some(ref report_dir) = args.report_dir {
        config.report_dir = report_dir.clone();
    }
    if args.no_report {
        config.write_report = false;
    }

    config.validate()?;
    Ok(config)
}

/// Construct the generation backend, checkpoint store and stage graph.
pub fn build_pipeline(config: &Config) -> Result<PipelineGraph, TestPilotError> {
    let generator = create_generator(config)?;
    let store = create_store(&config.checkpoint);
    let graph = PipelineGraph::from_config(config, generator, store)?;

    info!(
        "Pipeline: {} via {} ({})",
        graph
            .stage_kinds()
            .iter()
            .map(|k| k.id())
            .collect::<Vec<_>>()
            .join(" -> "),
        config.provider,
        config.resolved_model()
    );
    Ok(graph)
}

/// Write the dated report if enabled; failures are logged, not fatal.
pub fn save_report(config: &Config, report: &RunReport) {
    if !config.write_report {
        return;
    }

    match write_dated_report(&config.report_dir, report) {
        Ok(path) => info!("Wrote report: {}", path.display()),
        Err(e) => warn!("Failed to write report: {}", e),
    }
}

fn write_dated_report(report_dir: &Path, report: &RunReport) -> Result<PathBuf, TestPilotError> {
    let date_str = Local::now().format("%Y-%m-%d").to_string();
    Ok(write_run_report(&report_dir.join(date_str), report)?)
}

/// Tell the user how far an aborted execution got. Nothing from it is
/// rendered as a result.
pub fn describe_failure(error: &PipelineError) {
    if let PipelineError::Stage { stage, state, .. } = error {
        let completed = state.populated();
        if completed.is_empty() {
            eprintln!("Stage '{}' failed before any stage completed.", stage);
        } else {
            eprintln!(
                "Stage '{}' failed; discarded partial output ({}).",
                stage,
                completed
                    .iter()
                    .map(|f| f.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }
}
