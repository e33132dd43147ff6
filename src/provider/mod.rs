//! Generation Port: turns role-tagged messages into generated text.
//!
//! Every stage talks to a `Generator`; the concrete backend is picked once
//! from config and shared for the life of the process.

mod claude;
mod gemini;
#[cfg(test)]
pub(crate) mod stub;

pub use claude::ClaudeCliGenerator;
pub use gemini::GeminiGenerator;

use crate::config::{Config, Provider};
use crate::error::{ConfigError, GenerationError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Who a message is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System-level instruction framing the request
    Instruction,
    /// The concrete task for this call
    Task,
    /// Text produced by the generation backend
    Model,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Instruction => write!(f, "instruction"),
            Role::Task => write!(f, "task"),
            Role::Model => write!(f, "model"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn instruction(content: impl Into<String>) -> Self {
        Self {
            role: Role::Instruction,
            content: content.into(),
        }
    }

    pub fn task(content: impl Into<String>) -> Self {
        Self {
            role: Role::Task,
            content: content.into(),
        }
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            content: content.into(),
        }
    }
}

#[async_trait]
pub trait Generator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Model identifier requests are sent to
    fn model(&self) -> &str;

    /// Produce a complete response for `messages`. One call, no retries.
    async fn generate(&self, messages: &[Message]) -> Result<String, GenerationError>;
}

/// Build the configured backend. Fails before any stage runs if the
/// backend's credential is unusable.
pub fn create_generator(config: &Config) -> Result<Arc<dyn Generator>, ConfigError> {
    match config.provider {
        Provider::Gemini => Ok(Arc::new(GeminiGenerator::from_config(config)?)),
        Provider::ClaudeCli => Ok(Arc::new(ClaudeCliGenerator {
            binary: config.providers.claude_cli.binary.clone(),
            model: config.resolved_model().to_string(),
        })),
    }
}

/// Split a request into its joined instruction text and the remaining
/// conversational messages.
fn split_instruction(messages: &[Message]) -> (Option<String>, Vec<&Message>) {
    let instructions: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == Role::Instruction)
        .map(|m| m.content.as_str())
        .collect();

    let rest = messages
        .iter()
        .filter(|m| m.role != Role::Instruction)
        .collect();

    let instruction = if instructions.is_empty() {
        None
    } else {
        Some(instructions.join("\n\n"))
    };

    (instruction, rest)
}
