use std::{collections::HashMap, fs, path::Path};

use serde::{Deserialize, Serialize};

use super::{
    Encoding, MetadataError, MetadataSource, ParameterDescriptor, ShardGroup,
    ShardMetadata,
};
use crate::DataType;

const RAW_SHARD_FORMAT: &str = "raw-shard";

fn default_shard_format() -> String {
    RAW_SHARD_FORMAT.to_string()
}

fn default_parameter_format() -> String {
    Encoding::Raw.to_string()
}

/// Shard manifest, conventionally stored as `ndarray-cache.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NDArrayCacheManifest {
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    pub records: Vec<FileRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub data_path: String,
    #[serde(default = "default_shard_format")]
    pub format: String,
    pub nbytes: usize,
    pub records: Vec<ParamRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md5sum: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamRecord {
    pub name: String,
    pub shape: Vec<usize>,
    pub dtype: DataType,
    #[serde(default = "default_parameter_format")]
    pub format: String,
    pub nbytes: usize,
    pub byte_offset: usize,
}

/// Model metadata listing the parameters a model consumes, in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_type: Option<String>,
    pub params: Vec<ModelParameter>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelParameter {
    pub name: String,
    #[serde(default)]
    pub shape: Vec<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dtype: Option<DataType>,
}

/// Metadata source backed by a shard manifest and optional model metadata.
/// Without model metadata every manifest record is declared, in manifest order.
#[derive(Debug, Clone)]
pub struct NDArrayCacheSource {
    manifest: NDArrayCacheManifest,
    model: Option<ModelMetadata>,
}

impl NDArrayCacheSource {
    pub fn new(
        manifest: NDArrayCacheManifest,
        model: Option<ModelMetadata>,
    ) -> Self {
        Self {
            manifest,
            model,
        }
    }

    pub fn from_json_str(
        manifest_json: &str,
        model_json: Option<&str>,
    ) -> Result<Self, MetadataError> {
        let manifest = serde_json::from_str(manifest_json)?;
        let model = model_json.map(serde_json::from_str).transpose()?;
        Ok(Self::new(manifest, model))
    }

    pub fn from_files(
        manifest_path: &Path,
        model_metadata_path: Option<&Path>,
    ) -> Result<Self, MetadataError> {
        let manifest_json = fs::read_to_string(manifest_path)?;
        let model_json = model_metadata_path.map(fs::read_to_string).transpose()?;
        Self::from_json_str(&manifest_json, model_json.as_deref())
    }

    pub fn manifest(&self) -> &NDArrayCacheManifest {
        &self.manifest
    }

    pub fn model(&self) -> Option<&ModelMetadata> {
        self.model.as_ref()
    }
}

impl MetadataSource for NDArrayCacheSource {
    fn shard_metadata(&self) -> Result<ShardMetadata, MetadataError> {
        let groups = self
            .manifest
            .records
            .iter()
            .enumerate()
            .map(|(index, file_record)| -> Result<_, MetadataError> {
                if file_record.format != RAW_SHARD_FORMAT {
                    return Err(MetadataError::UnknownFormat(
                        file_record.format.clone(),
                    ));
                }
                let parameters = file_record
                    .records
                    .iter()
                    .map(|record| -> Result<_, MetadataError> {
                        let encoding: Encoding = record.format.parse()?;
                        Ok(ParameterDescriptor::new(
                            record.name.clone(),
                            &record.shape,
                            record.dtype,
                            index,
                            record.byte_offset,
                            record.nbytes,
                        )
                        .with_encoding(encoding))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ShardGroup::new(index, parameters)
                    .with_data_path(file_record.data_path.clone())
                    .with_nbytes(file_record.nbytes))
            })
            .collect::<Result<Vec<_>, _>>()?;
        ShardMetadata::new(self.manifest.records.len(), groups)
    }

    fn declared_parameter_order(&self) -> Result<Vec<String>, MetadataError> {
        let order = match &self.model {
            Some(model) => {
                model.params.iter().map(|param| param.name.clone()).collect()
            },
            None => self
                .manifest
                .records
                .iter()
                .flat_map(|file_record| file_record.records.iter())
                .map(|record| record.name.clone())
                .collect(),
        };
        Ok(order)
    }
}
