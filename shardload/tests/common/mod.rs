#![allow(dead_code)]
use std::{fs, path::Path};

use serde_json::json;
use shardload::{
    DataType, Ingested, ParameterManager, backends::cpu::CpuContext,
    parameters::{
        ParameterDescriptor, ParameterError, ShardGroup, ShardMetadata,
        StaticMetadataSource,
    },
};

pub const PARAMETER_ORDER: [&str; 4] =
    ["fc1.weight", "fc1.bias", "fc2.weight", "fc2.bias"];

/// One parameter of the synthetic two-layer model.
pub struct SyntheticParameter {
    pub name: &'static str,
    pub shape: Vec<usize>,
    pub values: Vec<f32>,
    pub shard_index: usize,
    pub byte_offset: usize,
}

/// Two-layer perceptron split over three shard files:
/// `shard0 = fc1.weight`, `shard1 = fc1.bias`, `shard2 = fc2.weight ++ fc2.bias`.
pub struct SyntheticModel {
    pub parameters: Vec<SyntheticParameter>,
    pub shards: Vec<(String, Vec<u8>)>,
}

impl SyntheticModel {
    pub fn mlp() -> Self {
        let parameters = vec![
            SyntheticParameter {
                name: "fc1.weight",
                shape: vec![5, 5],
                values: (0..25).map(|i| i as f32 * 0.5).collect(),
                shard_index: 0,
                byte_offset: 0,
            },
            SyntheticParameter {
                name: "fc1.bias",
                shape: vec![1],
                values: vec![0.125],
                shard_index: 1,
                byte_offset: 0,
            },
            SyntheticParameter {
                name: "fc2.weight",
                shape: vec![10],
                values: (0..10).map(|i| i as f32 * -0.25).collect(),
                shard_index: 2,
                byte_offset: 0,
            },
            SyntheticParameter {
                name: "fc2.bias",
                shape: vec![1],
                values: vec![3.75],
                shard_index: 2,
                byte_offset: 40,
            },
        ];

        let mut shards: Vec<(String, Vec<u8>)> = (0..3)
            .map(|index| (format!("shard{index}"), Vec::new()))
            .collect();
        for parameter in &parameters {
            let bytes = &mut shards[parameter.shard_index].1;
            assert_eq!(bytes.len(), parameter.byte_offset);
            bytes.extend_from_slice(&f32_bytes(&parameter.values));
        }

        Self {
            parameters,
            shards,
        }
    }

    pub fn parameter(
        &self,
        name: &str,
    ) -> &SyntheticParameter {
        self.parameters
            .iter()
            .find(|parameter| parameter.name == name)
            .unwrap()
    }

    pub fn shard_metadata(&self) -> ShardMetadata {
        let groups = self.shards.iter().enumerate().map(|(index, (name, bytes))| {
            let descriptors = self
                .parameters
                .iter()
                .filter(|parameter| parameter.shard_index == index)
                .map(|parameter| {
                    ParameterDescriptor::new(
                        parameter.name,
                        &parameter.shape,
                        DataType::F32,
                        index,
                        parameter.byte_offset,
                        parameter.values.len() * 4,
                    )
                })
                .collect();
            ShardGroup::new(index, descriptors)
                .with_data_path(name.clone())
                .with_nbytes(bytes.len())
        });
        ShardMetadata::new(self.shards.len(), groups).unwrap()
    }

    pub fn source(&self) -> StaticMetadataSource {
        StaticMetadataSource::new(
            self.shard_metadata(),
            PARAMETER_ORDER.iter().map(|name| name.to_string()).collect(),
        )
    }

    pub fn manager(&self) -> ParameterManager<CpuContext> {
        ParameterManager::new(CpuContext::new(), &self.source()).unwrap()
    }

    pub fn shard(
        &self,
        index: usize,
    ) -> (&str, &[u8]) {
        let (name, bytes) = &self.shards[index];
        (name.as_str(), bytes.as_slice())
    }

    /// Writes `ndarray-cache.json`, `model-metadata.json` and the shard files
    /// into `directory`, naming shards `params_shard_<index>.bin`.
    pub fn write_ndarray_cache(
        &self,
        directory: &Path,
    ) {
        let records: Vec<_> = self
            .shards
            .iter()
            .enumerate()
            .map(|(index, (_, bytes))| {
                let data_path = format!("params_shard_{index}.bin");
                fs::write(directory.join(&data_path), bytes).unwrap();
                let parameters: Vec<_> = self
                    .parameters
                    .iter()
                    .filter(|parameter| parameter.shard_index == index)
                    .map(|parameter| {
                        json!({
                            "name": parameter.name,
                            "shape": parameter.shape,
                            "dtype": "float32",
                            "format": "raw",
                            "nbytes": parameter.values.len() * 4,
                            "byteOffset": parameter.byte_offset,
                        })
                    })
                    .collect();
                json!({
                    "dataPath": data_path,
                    "format": "raw-shard",
                    "nbytes": bytes.len(),
                    "records": parameters,
                })
            })
            .collect();
        let manifest = json!({
            "metadata": {"ParamSize": self.parameters.len()},
            "records": records,
        });
        fs::write(
            directory.join("ndarray-cache.json"),
            serde_json::to_string_pretty(&manifest).unwrap(),
        )
        .unwrap();

        let params: Vec<_> = PARAMETER_ORDER
            .iter()
            .map(|name| {
                let parameter = self.parameter(name);
                json!({"name": name, "shape": parameter.shape, "dtype": "float32"})
            })
            .collect();
        let model = json!({"model_type": "mlp", "params": params});
        fs::write(
            directory.join("model-metadata.json"),
            serde_json::to_string_pretty(&model).unwrap(),
        )
        .unwrap();
    }
}

pub fn f32_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|value| value.to_le_bytes()).collect()
}

/// Sends a whole shard as one final chunk.
pub fn ingest_whole(
    manager: &mut ParameterManager<CpuContext>,
    filename: &str,
    bytes: &[u8],
) -> Result<Ingested, ParameterError> {
    manager.ingest_chunk(filename, bytes, true)
}

/// Sends a shard in `chunk_size` pieces, the last one marked final.
pub fn ingest_chunked(
    manager: &mut ParameterManager<CpuContext>,
    filename: &str,
    bytes: &[u8],
    chunk_size: usize,
) -> Result<Ingested, ParameterError> {
    let chunks: Vec<&[u8]> = bytes.chunks(chunk_size).collect();
    let Some((last, head)) = chunks.split_last() else {
        return manager.ingest_chunk(filename, &[], true);
    };
    for chunk in head {
        manager.ingest_chunk(filename, chunk, false)?;
    }
    manager.ingest_chunk(filename, last, true)
}
