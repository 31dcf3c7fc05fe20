//! Configuration for the pathway gateway
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::PathBuf;

use pathway_agent::PipelineConfig;

use crate::types::{GatewayError, Result};

/// Pathway gateway - learning pathway generation over HTTP
#[derive(Parser, Debug, Clone)]
#[command(name = "pathway-gateway")]
#[command(about = "HTTP gateway for retrieval-grounded learning pathway generation")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,

    /// Enable development mode (disables bearer authentication)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Comma-separated bearer tokens accepted on /api/* (required in production)
    #[arg(long, env = "API_TOKENS", value_delimiter = ',')]
    pub api_tokens: Vec<String>,

    /// API key for completions and embeddings
    #[arg(long, env = "OPENAI_API_KEY")]
    pub openai_api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub openai_base_url: String,

    /// Model used for structured completions
    #[arg(long, env = "COMPLETION_MODEL", default_value = "gpt-4o")]
    pub completion_model: String,

    /// Model used for query embeddings
    #[arg(long, env = "EMBEDDING_MODEL", default_value = "text-embedding-3-small")]
    pub embedding_model: String,

    /// Pinecone API key
    #[arg(long, env = "PINECONE_API_KEY")]
    pub pinecone_api_key: Option<String>,

    /// Pinecone index host (e.g. pathways-abc123.svc.pinecone.io)
    #[arg(long, env = "PINECONE_INDEX_HOST")]
    pub pinecone_index_host: Option<String>,

    /// Pinecone namespace
    #[arg(long, env = "PINECONE_NAMESPACE")]
    pub pinecone_namespace: Option<String>,

    /// YouTube Data API key
    #[arg(long, env = "YOUTUBE_API_KEY")]
    pub youtube_api_key: Option<String>,

    /// Largest accepted request body in bytes
    #[arg(long, env = "MAX_BODY_BYTES", default_value = "1048576")]
    pub max_body_bytes: usize,

    /// Path to a YAML pipeline configuration
    #[arg(long, env = "PIPELINE_CONFIG")]
    pub pipeline_config: Option<PathBuf>,
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !self.dev_mode && self.token_set().is_empty() {
            return Err("API_TOKENS is required in production mode".to_string());
        }

        if self.openai_api_key.is_none() {
            return Err("OPENAI_API_KEY is required".to_string());
        }

        if self.pinecone_api_key.is_none() || self.pinecone_index_host.is_none() {
            return Err("PINECONE_API_KEY and PINECONE_INDEX_HOST are required".to_string());
        }

        if self.youtube_api_key.is_none() {
            return Err("YOUTUBE_API_KEY is required".to_string());
        }

        if self.max_body_bytes == 0 {
            return Err("MAX_BODY_BYTES must be greater than zero".to_string());
        }

        Ok(())
    }

    /// Non-blank bearer tokens, trimmed.
    pub fn token_set(&self) -> HashSet<String> {
        self.api_tokens
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect()
    }

    /// Load the pipeline configuration, or defaults when no file is given.
    pub fn load_pipeline_config(&self) -> Result<PipelineConfig> {
        match &self.pipeline_config {
            Some(path) => {
                let yaml = std::fs::read_to_string(path)?;
                PipelineConfig::from_yaml(&yaml).map_err(|e| {
                    GatewayError::Config(format!("{}: {}", path.display(), e))
                })
            }
            None => Ok(PipelineConfig::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec![
            "pathway-gateway",
            "--openai-api-key",
            "sk-test",
            "--pinecone-api-key",
            "pc-key",
            "--pinecone-index-host",
            "pathways.svc.pinecone.io",
            "--youtube-api-key",
            "yt-key",
        ];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_production_requires_tokens() {
        assert!(args(&[]).validate().is_err());
        assert!(args(&["--dev-mode"]).validate().is_ok());
        assert!(args(&["--api-tokens", "alpha, beta"]).validate().is_ok());
    }

    #[test]
    fn test_token_set_trims_and_skips_blank() {
        let args = args(&["--api-tokens", "alpha, beta,,"]);
        let tokens = args.token_set();
        assert_eq!(tokens.len(), 2);
        assert!(tokens.contains("beta"));
    }

    #[test]
    fn test_body_limit() {
        assert_eq!(args(&["--dev-mode"]).max_body_bytes, 1024 * 1024);

        let small = args(&["--dev-mode", "--max-body-bytes", "4096"]);
        assert_eq!(small.max_body_bytes, 4096);
        assert!(small.validate().is_ok());

        assert!(args(&["--dev-mode", "--max-body-bytes", "0"]).validate().is_err());
    }

    #[test]
    fn test_missing_pipeline_config_uses_defaults() {
        let config = args(&["--dev-mode"]).load_pipeline_config().unwrap();
        assert_eq!(config, PipelineConfig::default());
    }
}
