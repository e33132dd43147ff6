use crate::checkpoint::CheckpointStore;
use crate::config::Config;
use crate::error::{ConfigError, PipelineError};
use crate::provider::Generator;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::{validate_order, PipelineState, Stage, StageKind};

/// Timing for one completed stage
#[derive(Debug, Clone, Serialize)]
pub struct StageResult {
    pub stage: StageKind,
    pub duration: Duration,
}

/// Outcome of a successful execution
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub session_id: String,
    /// Length of `message_log` carried in from the session checkpoint
    pub initial_log_len: usize,
    pub state: PipelineState,
    pub stages: Vec<StageResult>,
    pub total_duration: Duration,
}

/// START → stages in order → END. Fixed at construction; no branching.
pub struct PipelineGraph {
    stages: Vec<Stage>,
    generator: Arc<dyn Generator>,
    store: Arc<dyn CheckpointStore>,
}

impl PipelineGraph {
    pub fn new(
        stages: Vec<Stage>,
        generator: Arc<dyn Generator>,
        store: Arc<dyn CheckpointStore>,
    ) -> Result<Self, ConfigError> {
        let kinds: Vec<_> = stages.iter().map(|s| s.kind).collect();
        validate_order(&kinds)?;

        Ok(Self {
            stages,
            generator,
            store,
        })
    }

    pub fn from_config(
        config: &Config,
        generator: Arc<dyn Generator>,
        store: Arc<dyn CheckpointStore>,
    ) -> Result<Self, ConfigError> {
        let stages = config
            .resolved_stages()
            .iter()
            .map(Stage::from_config)
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(stages, generator, store)
    }

    pub fn stage_kinds(&self) -> Vec<StageKind> {
        self.stages.iter().map(|s| s.kind).collect()
    }

    /// Run every stage once against a fresh state seeded with the session's
    /// prior `message_log`. The session is checkpointed after each merged
    /// stage; the first failure aborts the walk.
    pub async fn execute(
        &self,
        project_idea: &str,
        session_id: &str,
    ) -> Result<RunReport, PipelineError> {
        let start = Instant::now();

        let prior_log = match self.store.load(session_id)? {
            Some(checkpoint) => {
                debug!(
                    "Resuming session {} with {} prior messages",
                    session_id,
                    checkpoint.state.message_log.len()
                );
                checkpoint.state.message_log
            }
            None => Vec::new(),
        };

        let mut state = PipelineState::new(project_idea, prior_log);
        let initial_log_len = state.message_log.len();

        info!(
            "Running {} stages via {} ({}) for session {}",
            self.stages.len(),
            self.generator.name(),
            self.generator.model(),
            session_id
        );

        let mut results = Vec::with_capacity(self.stages.len());
        for stage in &self.stages {
            let stage_start = Instant::now();
            debug!("Starting stage {}", stage.kind);

            let update = match stage.run(self.generator.as_ref(), &state).await {
                Ok(update) => update,
                Err(e) => {
                    warn!("Stage {} failed: {}", stage.kind, e);
                    return Err(e);
                }
            };

            state.merge(update);
            self.store.save(session_id, &state)?;
            debug!(
                "Checkpointed session {} ({} messages)",
                session_id,
                state.message_log.len()
            );

            let duration = stage_start.elapsed();
            info!("Completed {} in {:.1}s", stage.kind, duration.as_secs_f64());
            results.push(StageResult {
                stage: stage.kind,
                duration,
            });
        }

        Ok(RunReport {
            session_id: session_id.to_string(),
            initial_log_len,
            state,
            stages: results,
            total_duration: start.elapsed(),
        })
    }
}
