use crate::cli::{build_pipeline, describe_failure, load_config, save_report, InteractiveArgs};
use crate::output::render_terminal;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;
use uuid::Uuid;

pub async fn execute(args: InteractiveArgs) -> anyhow::Result<()> {
    let config = load_config(&args.pipeline)?;
    let graph = build_pipeline(&config)?;

    let session_id = args
        .session
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    println!("Session: {}", session_id);
    println!("Describe your project (e.g. Airline Cargo Delay Prediction). Type 'quit' to exit.");

    let mut submitted = 0usize;
    let mut failed = 0usize;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let idea = line.trim();

        if matches!(idea, "quit" | "exit") {
            break;
        }
        if idea.is_empty() {
            println!("Please enter a project description first.");
            continue;
        }

        debug!("Submitting '{}' to session {}", idea, session_id);
        submitted += 1;
        match graph.execute(idea, &session_id).await {
            Ok(report) => {
                print!("{}", render_terminal(&report));
                save_report(&config, &report);
            }
            Err(e) => {
                describe_failure(&e);
                eprintln!("Error: {}", e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} submissions failed", failed, submitted);
    }
    Ok(())
}
