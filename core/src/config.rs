use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct BuilderConfig {
    /// Minimum cosine / token-overlap score for a similarity edge.
    pub similarity_threshold: f32,
    /// Tokens shorter than this are ignored by the text-overlap fallback.
    pub min_token_chars: usize,
    /// Soft ceiling for the pairwise pass; larger inputs still build but log a warning.
    pub max_chunks: usize,
    /// Link consecutive chunks of the same document during rebuild.
    pub link_document_sequence: bool,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.6,
            min_token_chars: 1,
            max_chunks: 5000,
            link_document_sequence: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ImportanceWeights {
    pub degree: f64,
    pub betweenness: f64,
    pub closeness: f64,
    pub clustering: f64,
}

impl Default for ImportanceWeights {
    fn default() -> Self {
        Self {
            degree: 0.4,
            betweenness: 0.3,
            closeness: 0.2,
            clustering: 0.1,
        }
    }
}

impl ImportanceWeights {
    fn total(&self) -> f64 {
        self.degree + self.betweenness + self.closeness + self.clustering
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AnalyzerConfig {
    pub cluster_threshold: f32,
    pub min_cluster_size: usize,
    pub related_limit: usize,
    pub importance: ImportanceWeights,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            cluster_threshold: 0.6,
            min_cluster_size: 2,
            related_limit: 10,
            importance: ImportanceWeights::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 10_000,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct GraphConfig {
    pub builder: BuilderConfig,
    pub analyzer: AnalyzerConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigValidationError {
    #[error("builder.similarity_threshold must be in (0, 1], got {0}")]
    SimilarityThreshold(f32),
    #[error("analyzer.cluster_threshold must be in [0, 1], got {0}")]
    ClusterThreshold(f32),
    #[error("{0} must be at least 1")]
    ZeroLimit(&'static str),
    #[error("analyzer.importance weights must be non-negative with a positive sum")]
    ImportanceWeights,
}

impl GraphConfig {
    /// Layered load: `config/default`, `config/{RUN_MODE}`, then `CHUNKGRAPH_SECTION__KEY` env vars.
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        tracing::debug!(run_mode = %run_mode, "loading configuration");

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(env_source());

        Self::finish(builder.build()?)
    }

    /// Load `default.toml` (and the optional `{RUN_MODE}.toml`) from `dir`.
    pub fn load_from(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .add_source(File::from(dir.join("default")).required(false))
            .add_source(File::from(dir.join(run_mode)).required(false))
            .add_source(env_source());

        Self::finish(builder.build()?)
    }

    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let threshold = self.builder.similarity_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ConfigValidationError::SimilarityThreshold(threshold));
        }
        let cluster = self.analyzer.cluster_threshold;
        if !(0.0..=1.0).contains(&cluster) {
            return Err(ConfigValidationError::ClusterThreshold(cluster));
        }
        if self.builder.max_chunks == 0 {
            return Err(ConfigValidationError::ZeroLimit("builder.max_chunks"));
        }
        if self.analyzer.min_cluster_size == 0 {
            return Err(ConfigValidationError::ZeroLimit("analyzer.min_cluster_size"));
        }
        if self.analyzer.related_limit == 0 {
            return Err(ConfigValidationError::ZeroLimit("analyzer.related_limit"));
        }

        let weights = &self.analyzer.importance;
        let all_non_negative = [
            weights.degree,
            weights.betweenness,
            weights.closeness,
            weights.clustering,
        ]
        .iter()
        .all(|w| w.is_finite() && *w >= 0.0);
        if !all_non_negative || weights.total() <= 0.0 {
            return Err(ConfigValidationError::ImportanceWeights);
        }

        Ok(())
    }

    fn finish(config: Config) -> Result<Self, ConfigError> {
        let parsed: GraphConfig = config.try_deserialize()?;
        parsed
            .validate()
            .map_err(|err| ConfigError::Message(err.to_string()))?;
        Ok(parsed)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("CHUNKGRAPH")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
