use crate::config::StageConfig;
use crate::error::{ConfigError, PipelineError};
use crate::provider::{Generator, Message};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use super::{PipelineState, StateField, StateUpdate};

// Embedded default task templates
const PLANNER_TEMPLATE: &str = include_str!("../../prompts/planner.md");
const REVIEWER_TEMPLATE: &str = include_str!("../../prompts/reviewer.md");
const RISK_ANALYST_TEMPLATE: &str = include_str!("../../prompts/risk_analyst.md");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Drafts the technical plan from the project idea
    Planner,
    /// Critiques the plan
    Reviewer,
    /// Assesses risk from the project idea alone
    RiskAnalyst,
}

impl StageKind {
    pub fn id(&self) -> &'static str {
        match self {
            StageKind::Planner => "planner",
            StageKind::Reviewer => "reviewer",
            StageKind::RiskAnalyst => "risk_analyst",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            StageKind::Planner => "Technical Plan",
            StageKind::Reviewer => "Peer Review Feedback",
            StageKind::RiskAnalyst => "Risk Assessment",
        }
    }

    /// Fields substituted into the task template. The risk analyst reads
    /// only the idea even though it runs after the reviewer.
    pub fn reads(&self) -> &'static [StateField] {
        match self {
            StageKind::Planner => &[StateField::ProjectIdea],
            StageKind::Reviewer => &[StateField::Plan],
            StageKind::RiskAnalyst => &[StateField::ProjectIdea],
        }
    }

    pub fn writes(&self) -> StateField {
        match self {
            StageKind::Planner => StateField::Plan,
            StageKind::Reviewer => StateField::ReviewFeedback,
            StageKind::RiskAnalyst => StateField::RiskScore,
        }
    }

    fn default_instruction(&self) -> &'static str {
        match self {
            StageKind::Planner => "Create a detailed technical plan.",
            StageKind::Reviewer => "Be critical. Find 2 improvements.",
            StageKind::RiskAnalyst => "You are a Senior Risk Management Consultant.",
        }
    }

    fn default_template(&self) -> &'static str {
        match self {
            StageKind::Planner => PLANNER_TEMPLATE,
            StageKind::Reviewer => REVIEWER_TEMPLATE,
            StageKind::RiskAnalyst => RISK_ANALYST_TEMPLATE,
        }
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Check a stage chain: non-empty, no repeats, and every field a stage
/// reads is written by an earlier stage or supplied as input.
pub fn validate_order(kinds: &[StageKind]) -> Result<(), ConfigError> {
    if kinds.is_empty() {
        return Err(ConfigError::EmptyPipeline);
    }

    let mut seen = HashSet::new();
    let mut written = HashSet::new();
    for kind in kinds {
        if !seen.insert(*kind) {
            return Err(ConfigError::DuplicateStage(*kind));
        }
        if let Some(missing) = kind
            .reads()
            .iter()
            .find(|f| !f.is_input() && !written.contains(*f))
        {
            return Err(ConfigError::StageOrder {
                stage: *kind,
                missing: *missing,
            });
        }
        written.insert(kind.writes());
    }

    Ok(())
}

/// One node of the pipeline: an instruction plus a task template.
#[derive(Debug, Clone)]
pub struct Stage {
    pub kind: StageKind,
    instruction: String,
    template: String,
}

impl Stage {
    pub fn new(kind: StageKind) -> Self {
        Self {
            kind,
            instruction: kind.default_instruction().to_string(),
            template: kind.default_template().to_string(),
        }
    }

    /// Build from config, reading `prompt_file` if one is set.
    pub fn from_config(config: &StageConfig) -> Result<Self, ConfigError> {
        let mut stage = Self::new(config.kind);

        if let Some(ref path) = config.prompt_file {
            stage.template =
                std::fs::read_to_string(path).map_err(|e| ConfigError::PromptFile {
                    path: path.clone(),
                    source: e,
                })?;
            debug!("Stage {} using prompt file {}", stage.kind, path.display());
        }
        if let Some(ref instruction) = config.instruction {
            stage.instruction = instruction.clone();
        }

        Ok(stage)
    }

    #[cfg(test)]
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// The instruction + task pair sent for this stage.
    pub fn build_request(&self, state: &PipelineState) -> Result<Vec<Message>, PipelineError> {
        let mut task = self.template.trim_end().to_string();
        for field in self.kind.reads() {
            let value = state
                .get(*field)
                .ok_or(PipelineError::Precondition {
                    stage: self.kind,
                    missing: *field,
                })?;
            task = task.replace(field.placeholder(), value);
        }

        Ok(vec![
            Message::instruction(self.instruction.clone()),
            Message::task(task),
        ])
    }

    /// Run against `state`, returning this stage's patch. A generation
    /// failure carries a copy of `state` as it stood before this stage.
    pub async fn run(
        &self,
        generator: &dyn Generator,
        state: &PipelineState,
    ) -> Result<StateUpdate, PipelineError> {
        let request = self.build_request(state)?;

        match generator.generate(&request).await {
            Ok(content) => Ok(StateUpdate::from_stage(self.kind, content)),
            Err(source) => Err(PipelineError::Stage {
                stage: self.kind,
                source,
                state: Box::new(state.clone()),
            }),
        }
    }
}
