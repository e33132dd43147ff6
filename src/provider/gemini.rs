use super::{split_instruction, Generator, Message, Role};
use crate::config::Config;
use crate::error::{ConfigError, GenerationError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Hosted Gemini `generateContent` backend.
pub struct GeminiGenerator {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
    max_output_tokens: Option<u32>,
    temperature: Option<f32>,
}

impl GeminiGenerator {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            endpoint: crate::config::default_gemini_endpoint(),
            max_output_tokens: None,
            temperature: None,
        }
    }

    /// Read the API key from the environment variable named in config.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let gemini = &config.providers.gemini;
        let api_key = std::env::var(&gemini.api_key_env).map_err(|_| {
            ConfigError::MissingCredential {
                env_var: gemini.api_key_env.clone(),
            }
        })?;

        if api_key.trim().is_empty() {
            return Err(ConfigError::InvalidCredential {
                env_var: gemini.api_key_env.clone(),
            });
        }

        let mut generator = Self::new(api_key.trim(), config.resolved_model());
        generator.endpoint = gemini.endpoint.trim_end_matches('/').to_string();
        generator.max_output_tokens = gemini.max_output_tokens;
        generator.temperature = gemini.temperature;
        Ok(generator)
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    fn build_request(&self, messages: &[Message]) -> GenerateContentRequest {
        let (instruction, rest) = split_instruction(messages);

        let contents = rest
            .into_iter()
            .map(|m| Content {
                role: Some(
                    match m.role {
                        Role::Model => "model",
                        _ => "user",
                    }
                    .to_string(),
                ),
                parts: vec![Part {
                    text: m.content.clone(),
                }],
            })
            .collect();

        let generation_config = if self.max_output_tokens.is_some() || self.temperature.is_some() {
            Some(GenerationConfig {
                max_output_tokens: self.max_output_tokens,
                temperature: self.temperature,
            })
        } else {
            None
        };

        GenerateContentRequest {
            system_instruction: instruction.map(|text| Content {
                role: None,
                parts: vec![Part { text }],
            }),
            contents,
            generation_config,
        }
    }
}

#[async_trait]
impl Generator for GeminiGenerator {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, messages: &[Message]) -> Result<String, GenerationError> {
        let request = self.build_request(messages);

        debug!(
            "Sending {} message(s) to {} ({})",
            messages.len(),
            self.model,
            self.name()
        );

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(GenerationError::RateLimited { body });
            }
            return Err(GenerationError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        extract_text(&body)
    }
}

/// Concatenate the text parts of the first candidate.
fn extract_text(body: &str) -> Result<String, GenerationError> {
    let response: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

    let text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(GenerationError::EmptyResponse);
    }

    Ok(text)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_maps_instruction_to_system() {
        let generator = GeminiGenerator::new("key", "gemini-1.5-flash");
        let request = generator.build_request(&[
            Message::instruction("Create a detailed technical plan."),
            Message::task("Plan: cargo delays"),
        ]);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json["systemInstruction"]["parts"][0]["text"],
            "Create a detailed technical plan."
        );
        assert!(json["systemInstruction"].get("role").is_none());
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Plan: cargo delays");
        assert!(json.get("generationConfig").is_none());
    }

    #[test]
    fn test_request_includes_generation_config() {
        let mut generator = GeminiGenerator::new("key", "gemini-1.5-flash");
        generator.max_output_tokens = Some(2048);

        let json = serde_json::to_value(generator.build_request(&[Message::task("x")])).unwrap();
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 2048);
        assert!(json["generationConfig"].get("temperature").is_none());
    }

    #[test]
    fn test_url() {
        let generator = GeminiGenerator::new("key", "gemini-1.5-flash");
        assert_eq!(
            generator.url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let body = r#"{
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "Phase 1: "}, {"text": "collect data"}]},
                "finishReason": "STOP"
            }]
        }"#;

        assert_eq!(extract_text(body).unwrap(), "Phase 1: collect data");
    }

    #[test]
    fn test_extract_text_no_candidates() {
        let err = extract_text(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#).unwrap_err();
        assert!(matches!(err, GenerationError::EmptyResponse));
    }

    #[test]
    fn test_extract_text_malformed() {
        let err = extract_text("<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, GenerationError::MalformedResponse(_)));
    }

    #[test]
    fn test_from_config_missing_credential() {
        let mut config = Config::default();
        config.providers.gemini.api_key_env = "TESTPILOT_TEST_KEY_NEVER_SET".to_string();

        let err = GeminiGenerator::from_config(&config).err().unwrap();
        assert!(matches!(err, ConfigError::MissingCredential { .. }));
    }

    #[test]
    fn test_from_config_blank_credential() {
        std::env::set_var("TESTPILOT_TEST_KEY_BLANK", "   ");
        let mut config = Config::default();
        config.providers.gemini.api_key_env = "TESTPILOT_TEST_KEY_BLANK".to_string();

        let err = GeminiGenerator::from_config(&config).err().unwrap();
        assert!(matches!(err, ConfigError::InvalidCredential { .. }));
    }

    #[test]
    fn test_from_config_trims_endpoint() {
        std::env::set_var("TESTPILOT_TEST_KEY_SET", "abc123");
        let mut config = Config::default();
        config.providers.gemini.api_key_env = "TESTPILOT_TEST_KEY_SET".to_string();
        config.providers.gemini.endpoint = "http://localhost:8080/v1beta/".to_string();
        config.model = Some("gemini-pro".to_string());

        let generator = GeminiGenerator::from_config(&config).unwrap();
        assert_eq!(
            generator.url(),
            "http://localhost:8080/v1beta/models/gemini-pro:generateContent"
        );
    }
}
