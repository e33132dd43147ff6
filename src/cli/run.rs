use crate::cli::{build_pipeline, describe_failure, load_config, save_report, RunArgs};
use crate::error::TestPilotError;
use crate::output::{build_snapshot, render_terminal};
use tracing::info;
use uuid::Uuid;

pub async fn execute(args: RunArgs) -> anyhow::Result<()> {
    let idea = args.idea.trim();
    if idea.is_empty() {
        anyhow::bail!("Please provide a project description");
    }

    let config = load_config(&args.pipeline)?;
    let graph = build_pipeline(&config)?;

    let session_id = args
        .session
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    info!("Session {}", session_id);

    let report = match graph.execute(idea, &session_id).await {
        Ok(report) => report,
        Err(e) => {
            describe_failure(&e);
            return Err(TestPilotError::from(e).into());
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&build_snapshot(&report))?);
    } else {
        print!("{}", render_terminal(&report));
    }

    save_report(&config, &report);
    Ok(())
}
