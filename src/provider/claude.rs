use super::{split_instruction, Generator, Message};
use crate::error::GenerationError;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

/// Runs the local `claude` CLI in print mode for each request.
pub struct ClaudeCliGenerator {
    pub binary: PathBuf,
    pub model: String,
}

#[async_trait]
impl Generator for ClaudeCliGenerator {
    fn name(&self) -> &'static str {
        "claude_cli"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, messages: &[Message]) -> Result<String, GenerationError> {
        let (instruction, rest) = split_instruction(messages);
        let prompt = rest
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        // Use string for PATH lookup if not an absolute/relative path
        let binary_str = self.binary.to_string_lossy();
        let mut cmd = if binary_str.contains('/') || binary_str.contains('\\') {
            Command::new(&self.binary)
        } else {
            Command::new(binary_str.as_ref())
        };

        if let Some(ref system) = instruction {
            cmd.arg("--system-prompt").arg(system);
        }

        cmd.arg("-p")
            .arg(&prompt)
            .arg("--model")
            .arg(&self.model)
            .arg("--output-format")
            .arg("json");

        debug!("Invoking {} with {} byte prompt", self.name(), prompt.len());

        let output = cmd.output().await?;

        if !output.status.success() {
            return Err(GenerationError::NonZeroExit {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        parse_cli_output(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Claude wraps the answer in {"result": "...", ...}; fall back to raw stdout.
fn parse_cli_output(stdout: &str) -> Result<String, GenerationError> {
    #[derive(Deserialize)]
    struct ClaudeOutput {
        result: String,
    }

    let text = match serde_json::from_str::<ClaudeOutput>(stdout.trim()) {
        Ok(out) => out.result,
        Err(_) => stdout.trim().to_string(),
    };

    if text.trim().is_empty() {
        return Err(GenerationError::EmptyResponse);
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_result_wrapper() {
        let raw = r#"{"type":"result","result":"Risk Score: Medium","session_id":"abc"}"#;
        assert_eq!(parse_cli_output(raw).unwrap(), "Risk Score: Medium");
    }

    #[test]
    fn test_parse_plain_text() {
        assert_eq!(parse_cli_output("  plain answer\n").unwrap(), "plain answer");
    }

    #[test]
    fn test_parse_empty_result() {
        let err = parse_cli_output(r#"{"result": ""}"#).unwrap_err();
        assert!(matches!(err, GenerationError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_missing_binary_is_io_error() {
        let generator = ClaudeCliGenerator {
            binary: PathBuf::from("/nonexistent/testpilot-claude"),
            model: "sonnet".to_string(),
        };

        let err = generator
            .generate(&[Message::instruction("sys"), Message::task("hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Io(_)));
    }
}
