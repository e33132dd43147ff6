use crate::checkpoint::{CheckpointStore, FileCheckpointStore};
use crate::cli::{HistoryArgs, DEFAULT_CONFIG};
use crate::config::{CheckpointBackend, Config};
use std::path::Path;
use tracing::warn;

pub fn execute(args: HistoryArgs) -> anyhow::Result<()> {
    let config = Config::load_or_default(args.config.as_deref(), Path::new(DEFAULT_CONFIG))?;
    if config.checkpoint.backend == CheckpointBackend::Memory {
        warn!("Checkpoint backend is 'memory'; only file-backed sessions outlive a run");
    }

    let store = FileCheckpointStore::new(&config.checkpoint.dir);
    let Some(checkpoint) = store.load(&args.session)? else {
        println!("No checkpoint for session {}", args.session);
        return Ok(());
    };

    println!(
        "Session {} (updated {}, {} messages)\n",
        checkpoint.session_id,
        checkpoint.updated_at.to_rfc3339(),
        checkpoint.state.message_log.len()
    );
    for (idx, message) in checkpoint.state.message_log.iter().enumerate() {
        println!("[{}] {}:\n{}\n", idx + 1, message.role, message.content.trim_end());
    }

    Ok(())
}
