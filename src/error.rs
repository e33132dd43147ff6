use crate::pipeline::{PipelineState, StageKind, StateField};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TestPilotError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Credential not set: environment variable {env_var} is missing")]
    MissingCredential { env_var: String },

    #[error("Credential in environment variable {env_var} is empty")]
    InvalidCredential { env_var: String },

    #[error("No stages configured")]
    EmptyPipeline,

    #[error("Stage '{0}' appears more than once")]
    DuplicateStage(StageKind),

    #[error("Stage '{stage}' reads '{missing}' but no earlier stage writes it")]
    StageOrder { stage: StageKind, missing: StateField },

    #[error("Failed to read prompt file '{path}': {source}")]
    PromptFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Generation endpoint unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),

    #[error("Rate limited by generation endpoint: {body}")]
    RateLimited { body: String },

    #[error("Request rejected ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Generation returned no text")]
    EmptyResponse,

    #[error("Malformed generation response: {0}")]
    MalformedResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Process failed with exit code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },
}

#[derive(Error, Debug)]
pub enum PipelineError {
    /// A stage's generation call failed. `state` holds everything merged
    /// before the failing stage; the failing stage contributed nothing.
    #[error("Stage '{stage}' failed: {source}")]
    Stage {
        stage: StageKind,
        #[source]
        source: GenerationError,
        state: Box<PipelineState>,
    },

    #[error("Stage '{stage}' requires '{missing}' which is not populated")]
    Precondition { stage: StageKind, missing: StateField },

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
}

#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to create output directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Failed to write report: {0}")]
    WriteReport(std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
