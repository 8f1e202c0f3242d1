use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::{
    parameters::{MetadataError, NDArrayCacheSource},
    utils::env_utils::LoaderEnvVar,
};

pub const DEFAULT_CACHE_METADATA_FILE: &str = "ndarray-cache.json";
pub const DEFAULT_MODEL_METADATA_FILE: &str = "model-metadata.json";
pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024 * 1024;

fn default_cache_metadata_file() -> String {
    DEFAULT_CACHE_METADATA_FILE.to_string()
}

fn default_model_metadata_file() -> String {
    DEFAULT_MODEL_METADATA_FILE.to_string()
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

/// Where a model's shards live and how they are streamed into a manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    pub model_path: PathBuf,
    #[serde(default = "default_cache_metadata_file")]
    pub cache_metadata_file: String,
    #[serde(default = "default_model_metadata_file")]
    pub model_metadata_file: String,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl LoaderConfig {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            cache_metadata_file: default_cache_metadata_file(),
            model_metadata_file: default_model_metadata_file(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    pub fn chunk_size(
        mut self,
        chunk_size: usize,
    ) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn cache_metadata_file(
        mut self,
        cache_metadata_file: impl Into<String>,
    ) -> Self {
        self.cache_metadata_file = cache_metadata_file.into();
        self
    }

    pub fn model_metadata_file(
        mut self,
        model_metadata_file: impl Into<String>,
    ) -> Self {
        self.model_metadata_file = model_metadata_file.into();
        self
    }

    /// Applies `SHARDLOAD_CHUNK_SIZE` when it is set.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_chunk_size_override(
            LoaderEnvVar::ChunkSize.non_empty_value().as_deref(),
        )
    }

    pub fn with_chunk_size_override(
        self,
        value: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let Some(value) = value else {
            return Ok(self);
        };
        let chunk_size = value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidChunkSize(value.to_string()))?;
        let config = self.chunk_size(chunk_size);
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        Ok(())
    }

    pub fn cache_metadata_path(&self) -> PathBuf {
        self.model_path.join(&self.cache_metadata_file)
    }

    pub fn model_metadata_path(&self) -> PathBuf {
        self.model_path.join(&self.model_metadata_file)
    }

    /// Path of a shard file named by the manifest's `dataPath`.
    pub fn shard_path(
        &self,
        data_path: &str,
    ) -> PathBuf {
        self.model_path.join(data_path)
    }

    /// Reads the manifest, and the model metadata when the file exists.
    pub fn metadata_source(&self) -> Result<NDArrayCacheSource, MetadataError> {
        let model_metadata_path = self.model_metadata_path();
        NDArrayCacheSource::from_files(
            &self.cache_metadata_path(),
            model_metadata_path
                .is_file()
                .then_some(model_metadata_path.as_path()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config =
            LoaderConfig::from_json_str(r#"{"model_path": "models/mlp"}"#)
                .unwrap();
        assert_eq!(config, LoaderConfig::new("models/mlp"));
        assert_eq!(
            config.cache_metadata_path(),
            Path::new("models/mlp/ndarray-cache.json")
        );
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn test_zero_chunk_size_is_rejected() {
        let result = LoaderConfig::from_json_str(
            r#"{"model_path": "m", "chunk_size": 0}"#,
        );
        assert!(matches!(result, Err(ConfigError::ZeroChunkSize)));
    }

    #[test]
    fn test_chunk_size_override() {
        let config = LoaderConfig::new("m")
            .with_chunk_size_override(Some(" 4096 "))
            .unwrap();
        assert_eq!(config.chunk_size, 4096);

        let unchanged = LoaderConfig::new("m")
            .with_chunk_size_override(None)
            .unwrap();
        assert_eq!(unchanged.chunk_size, DEFAULT_CHUNK_SIZE);

        assert!(matches!(
            LoaderConfig::new("m").with_chunk_size_override(Some("lots")),
            Err(ConfigError::InvalidChunkSize(value)) if value == "lots"
        ));
    }
}
