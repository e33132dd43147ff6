use crate::pipeline::StageKind;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::defaults::*;

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Which generation backend serves every stage
    #[serde(default)]
    pub provider: Provider,

    /// Model identifier for the selected backend; when unset each backend
    /// uses its own `providers.<name>.model`
    #[serde(default)]
    pub model: Option<String>,

    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,

    /// Write markdown/JSON reports after each successful run
    #[serde(default = "default_true")]
    pub write_report: bool,

    /// Preset stage list used when `stages` is empty
    #[serde(default)]
    pub variant: Variant,

    /// Explicit ordered stage list; overrides `variant`
    #[serde(default)]
    pub stages: Vec<StageConfig>,

    #[serde(default)]
    pub checkpoint: CheckpointConfig,

    #[serde(default)]
    pub providers: ProvidersConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    #[default]
    Gemini,
    ClaudeCli,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Gemini => write!(f, "gemini"),
            Provider::ClaudeCli => write!(f, "claude_cli"),
        }
    }
}

/// Preset pipelines: `base` is planner → reviewer, `extended` adds the
/// risk analyst at the end.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Base,
    #[default]
    Extended,
}

impl Variant {
    pub fn stages(&self) -> Vec<StageKind> {
        match self {
            Variant::Base => vec![StageKind::Planner, StageKind::Reviewer],
            Variant::Extended => vec![
                StageKind::Planner,
                StageKind::Reviewer,
                StageKind::RiskAnalyst,
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct StageConfig {
    pub kind: StageKind,

    /// Task template overriding the embedded default
    #[serde(default)]
    pub prompt_file: Option<PathBuf>,

    /// Instruction text overriding the embedded default
    #[serde(default)]
    pub instruction: Option<String>,
}

impl StageConfig {
    pub fn new(kind: StageKind) -> Self {
        Self {
            kind,
            prompt_file: None,
            instruction: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointBackend {
    /// Lives as long as the process
    #[default]
    Memory,
    /// One JSON transcript per session under `dir`
    File,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct CheckpointConfig {
    #[serde(default)]
    pub backend: CheckpointBackend,

    #[serde(default = "default_checkpoint_dir")]
    pub dir: PathBuf,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            backend: CheckpointBackend::default(),
            dir: default_checkpoint_dir(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub gemini: GeminiConfig,

    #[serde(default)]
    pub claude_cli: ClaudeCliConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct GeminiConfig {
    /// Environment variable holding the API key
    #[serde(default = "default_gemini_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_gemini_model")]
    pub model: String,

    #[serde(default = "default_gemini_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub max_output_tokens: Option<u32>,

    #[serde(default)]
    pub temperature: Option<f32>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_gemini_api_key_env(),
            model: default_gemini_model(),
            endpoint: default_gemini_endpoint(),
            max_output_tokens: None,
            temperature: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ClaudeCliConfig {
    #[serde(default = "default_claude_binary")]
    pub binary: PathBuf,

    #[serde(default = "default_claude_model")]
    pub model: String,
}

impl Default for ClaudeCliConfig {
    fn default() -> Self {
        Self {
            binary: default_claude_binary(),
            model: default_claude_model(),
        }
    }
}
