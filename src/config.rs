use crate::error::{Result, SapwiseError};
use crate::error_ext::ResultExt;
use serde::Deserialize;
use std::path::Path;

/// Preset questions offered on the home screen when the config file
/// does not provide its own list. SAP message codes alternate with
/// representative message texts.
pub const DEFAULT_PRESET_QUESTIONS: &[&str] = &[
    "F5 101",
    "Posting period & is not open for G/L account &",
    "ME 027",
    "Batch & does not exist for material & in plant &",
    "PG 002",
    "No valid records exist for infotype &",
    "IDoc status 51",
    "Object & & & is locked by user &",
];

/// Central configuration for Sapwise
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SapwiseConfig {
    /// Project endpoint of the hosted agent service
    pub endpoint: Option<String>,
    /// Identifier of the agent to resolve at startup
    pub agent_id: Option<String>,
    /// Questions offered on the home screen
    pub preset_questions: Vec<String>,
    /// Character limit for session labels in the sidebar
    pub max_preview_length: usize,
    pub run_poll_interval_ms: u64,
    pub run_poll_max_attempts: u32,
}

impl Default for SapwiseConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            agent_id: None,
            preset_questions: DEFAULT_PRESET_QUESTIONS
                .iter()
                .map(|q| q.to_string())
                .collect(),
            max_preview_length: 48,
            run_poll_interval_ms: 750,
            run_poll_max_attempts: 120,
        }
    }
}

impl SapwiseConfig {
    /// Load configuration from a toml file, falling back to defaults when
    /// the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let mut config: SapwiseConfig = toml::from_str(&content).map_err(|e| {
            SapwiseError::Config(format!("Invalid config file {}: {}", path.display(), e))
        })?;

        if config.preset_questions.is_empty() {
            eprintln!("Warning: 'preset_questions' is empty, using the built-in list");
            config.preset_questions = DEFAULT_PRESET_QUESTIONS
                .iter()
                .map(|q| q.to_string())
                .collect();
        }

        if config.run_poll_max_attempts == 0 {
            return Err(SapwiseError::Config(
                "'run_poll_max_attempts' must be at least 1".to_string(),
            ));
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = SapwiseConfig::default();
        assert!(config.endpoint.is_none());
        assert!(config.agent_id.is_none());
        assert_eq!(config.preset_questions.len(), 8);
        assert_eq!(config.preset_questions[0], "F5 101");
        assert_eq!(config.max_preview_length, 48);
        assert_eq!(config.run_poll_interval_ms, 750);
        assert_eq!(config.run_poll_max_attempts, 120);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = SapwiseConfig::load(Path::new("/nonexistent/sapwise.toml")).unwrap();
        assert_eq!(config.preset_questions.len(), 8);
    }

    #[test]
    fn test_load_partial_override() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
endpoint = "https://example.services.ai.azure.com/api/projects/demo"
agent_id = "asst_123"
max_preview_length = 25
"#
        )
        .unwrap();

        let config = SapwiseConfig::load(file.path()).unwrap();
        assert_eq!(
            config.endpoint.as_deref(),
            Some("https://example.services.ai.azure.com/api/projects/demo")
        );
        assert_eq!(config.agent_id.as_deref(), Some("asst_123"));
        assert_eq!(config.max_preview_length, 25);
        // Untouched fields keep their defaults
        assert_eq!(config.preset_questions.len(), 8);
        assert_eq!(config.run_poll_interval_ms, 750);
    }

    #[test]
    fn test_load_custom_presets() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"preset_questions = ["VL 602", "KI 235"]"#).unwrap();

        let config = SapwiseConfig::load(file.path()).unwrap();
        assert_eq!(config.preset_questions, vec!["VL 602", "KI 235"]);
    }

    #[test]
    fn test_load_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "endpoint = [not toml").unwrap();

        let err = SapwiseConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, SapwiseError::Config(_)));
    }

    #[test]
    fn test_zero_poll_attempts_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "run_poll_max_attempts = 0").unwrap();

        assert!(SapwiseConfig::load(file.path()).is_err());
    }
}
