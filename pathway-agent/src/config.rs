//! Configuration for the generation pipelines.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use curriculum::RuleSet;

/// Tunables shared by every pipeline in a service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Full pathway generation
    pub generation: CallSiteConfig,
    /// Step or activity regeneration
    pub regeneration: CallSiteConfig,
    /// Brief drafting from a free-text idea
    pub details: CompletionConfig,
    /// Maximum candidate videos per request
    pub max_videos: usize,
    /// Deadline for one whole request (ms)
    pub request_timeout_ms: u64,
    /// Rule set rendered into generator prompts
    pub rule_set: RuleSet,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            generation: CallSiteConfig {
                top_k: 20,
                completion: CompletionConfig {
                    temperature: Some(0.8),
                    max_completion_tokens: Some(5000),
                },
            },
            regeneration: CallSiteConfig {
                top_k: 15,
                completion: CompletionConfig {
                    temperature: Some(0.7),
                    max_completion_tokens: Some(5000),
                },
            },
            details: CompletionConfig::default(),
            max_videos: 5,
            request_timeout_ms: 120_000,
            rule_set: RuleSet::Cited,
        }
    }
}

impl PipelineConfig {
    /// Load config from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Per-request deadline.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Retrieval and completion settings for one call site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallSiteConfig {
    /// Passages requested from vector search
    pub top_k: usize,
    #[serde(flatten)]
    pub completion: CompletionConfig,
}

/// Sampling settings for one completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Sampling temperature; backend default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Completion token cap; backend default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.generation.top_k, 20);
        assert_eq!(config.regeneration.top_k, 15);
        assert_eq!(config.generation.completion.temperature, Some(0.8));
        assert_eq!(config.regeneration.completion.temperature, Some(0.7));
        assert_eq!(config.max_videos, 5);
        assert_eq!(config.request_timeout(), Duration::from_secs(120));
        assert_eq!(config.rule_set, RuleSet::Cited);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = PipelineConfig::from_yaml(
            "generation:\n  top_k: 12\n  temperature: 0.5\nrule_set: core\n",
        )
        .unwrap();

        assert_eq!(config.generation.top_k, 12);
        assert_eq!(config.generation.completion.temperature, Some(0.5));
        assert_eq!(config.generation.completion.max_completion_tokens, None);
        assert_eq!(config.regeneration.top_k, 15);
        assert_eq!(config.rule_set, RuleSet::Core);
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = PipelineConfig::default();
        let yaml = config.to_yaml().unwrap();
        assert_eq!(PipelineConfig::from_yaml(&yaml).unwrap(), config);
    }
}
