mod defaults;
mod types;

pub use defaults::default_gemini_endpoint;
pub use types::*;

use crate::error::ConfigError;
use crate::pipeline::validate_order;
use defaults::*;
use std::path::Path;

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            provider: Provider::default(),
            model: None,
            report_dir: default_report_dir(),
            write_report: true,
            variant: Variant::default(),
            stages: Vec::new(),
            checkpoint: CheckpointConfig::default(),
            providers: ProvidersConfig::default(),
        }
    }
}

impl Config {
    /// Load config from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load `path` if given (it must exist), otherwise the default file if
    /// present, otherwise built-in defaults.
    pub fn load_or_default(path: Option<&Path>, default_path: &Path) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None if default_path.exists() => Self::load(default_path),
            None => Ok(Self::default()),
        }
    }

    /// The ordered stage list this config runs
    pub fn resolved_stages(&self) -> Vec<StageConfig> {
        if self.stages.is_empty() {
            self.variant
                .stages()
                .into_iter()
                .map(StageConfig::new)
                .collect()
        } else {
            self.stages.clone()
        }
    }

    /// Model identifier sent to the selected backend
    pub fn resolved_model(&self) -> &str {
        if let Some(ref model) = self.model {
            return model;
        }
        match self.provider {
            Provider::Gemini => &self.providers.gemini.model,
            Provider::ClaudeCli => &self.providers.claude_cli.model,
        }
    }

    /// Validate the config
    pub fn validate(&self) -> Result<(), ConfigError> {
        let kinds: Vec<_> = self.resolved_stages().iter().map(|s| s.kind).collect();
        validate_order(&kinds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{StageKind, StateField};

    #[test]
    fn test_defaults_resolve_extended_variant() {
        let config = Config::default();
        let kinds: Vec<_> = config.resolved_stages().iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![StageKind::Planner, StageKind::Reviewer, StageKind::RiskAnalyst]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_minimal_yaml() {
        let config: Config = serde_yaml::from_str("variant: base\nmodel: gemini-pro\n").unwrap();
        assert_eq!(config.variant, Variant::Base);
        assert_eq!(config.resolved_model(), "gemini-pro");
        assert_eq!(config.provider, Provider::Gemini);
        assert_eq!(config.providers.gemini.api_key_env, "GOOGLE_API_KEY");
        assert_eq!(config.checkpoint.backend, CheckpointBackend::Memory);
        assert_eq!(config.resolved_stages().len(), 2);
    }

    #[test]
    fn test_explicit_stages_override_variant() {
        let yaml = r#"
variant: extended
provider: claude_cli
stages:
  - kind: risk_analyst
    instruction: "You are an actuary."
checkpoint:
  backend: file
  dir: /tmp/sessions
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        let stages = config.resolved_stages();
        assert_eq!(stages.len(), 1);
        assert_eq!(stages[0].kind, StageKind::RiskAnalyst);
        assert_eq!(stages[0].instruction.as_deref(), Some("You are an actuary."));
        assert_eq!(config.provider, Provider::ClaudeCli);
        assert_eq!(config.checkpoint.backend, CheckpointBackend::File);
        // Risk analyst only reads the input, so it may run alone
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_reviewer_before_planner() {
        let mut config = Config::default();
        config.stages = vec![
            StageConfig::new(StageKind::Reviewer),
            StageConfig::new(StageKind::Planner),
        ];

        match config.validate() {
            Err(ConfigError::StageOrder { stage, missing }) => {
                assert_eq!(stage, StageKind::Reviewer);
                assert_eq!(missing, StateField::Plan);
            }
            other => panic!("expected StageOrder, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let mut config = Config::default();
        config.stages = vec![
            StageConfig::new(StageKind::Planner),
            StageConfig::new(StageKind::Planner),
        ];

        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateStage(StageKind::Planner))
        ));
    }

    #[test]
    fn test_load_or_default_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(None, &dir.path().join("testpilot.yaml")).unwrap();
        assert_eq!(config.resolved_model(), "gemini-1.5-flash");
    }

    #[test]
    fn test_model_defaults_follow_provider() {
        let mut config: Config = serde_yaml::from_str("provider: claude_cli\n").unwrap();
        assert_eq!(config.resolved_model(), "sonnet");

        config.provider = Provider::Gemini;
        assert_eq!(config.resolved_model(), "gemini-1.5-flash");

        config.model = Some("opus".to_string());
        assert_eq!(config.resolved_model(), "opus");
    }

    #[test]
    fn test_load_explicit_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        let err = Config::load_or_default(Some(&missing), &missing).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }
}
