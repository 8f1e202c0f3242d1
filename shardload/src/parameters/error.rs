use thiserror::Error;

use super::Encoding;
use crate::{DataType, DeviceError, data_type::UnknownDataType};

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Shard metadata describes no shard files.")]
    NoShards,
    #[error(
        "Shard metadata declares {declared} shard files but describes {described}."
    )]
    ShardCountMismatch {
        declared: usize,
        described: usize,
    },
    #[error("Shard index {0} is described more than once.")]
    DuplicateShardIndex(usize),
    #[error("Parameter \"{0}\" is described by more than one descriptor.")]
    DuplicateParameter(String),
    #[error(
        "Parameter \"{name}\" claims shard {claimed}, but is listed in shard {group}."
    )]
    MisplacedDescriptor {
        name: String,
        claimed: usize,
        group: usize,
    },
    #[error("Parameter \"{name}\" uses encoding {encoding} with data type {data_type:?}.")]
    UnsupportedEncoding {
        name: String,
        encoding: Encoding,
        data_type: DataType,
    },
    #[error(transparent)]
    UnknownDataType(#[from] UnknownDataType),
    #[error("Unknown format \"{0}\".")]
    UnknownFormat(String),
    #[error("Failed to read metadata")]
    Io(#[from] std::io::Error),
    #[error("Couldn't deserialize the metadata JSON.")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ShardParseError {
    #[error("Shard filename \"{0}\" has no numeric shard index.")]
    MalformedFilename(String),
    #[error("No shard metadata for index {index} (file \"{filename}\").")]
    UnknownShardIndex {
        filename: String,
        index: usize,
    },
    #[error("Shard {index} is expected to be {expected} bytes, got {actual} bytes.")]
    ShardSizeMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },
    #[error(
        "Parameter \"{name}\" spans bytes {begin}..{end}, but shard {index} is only {shard_size} bytes long."
    )]
    OutOfBounds {
        name: String,
        index: usize,
        begin: usize,
        end: usize,
        shard_size: usize,
    },
    #[error(
        "Size mismatch: parameter \"{name}\" of shape {shape:?} and data type \
        {data_type:?} expected to be {expected_size} bytes, got {actual_size} bytes."
    )]
    SizeMismatch {
        name: String,
        data_type: DataType,
        shape: Box<[usize]>,
        expected_size: usize,
        actual_size: usize,
    },
    #[error("Failed to materialize shard tensor")]
    Device(#[from] DeviceError),
}

#[derive(Debug, Error)]
pub enum ParameterError {
    #[error("Shard file \"{filename}\" was already completed.")]
    DuplicateCompletion {
        filename: String,
    },
    #[error("Shard file \"{filename}\" is already being written.")]
    ShardInProgress {
        filename: String,
    },
    #[error("Failed to parse shard")]
    ShardParse(#[from] ShardParseError),
    #[error("Parameter \"{0}\" is declared by the model but no shard provided it.")]
    MissingParameter(String),
    #[error("Parameters are not materialized yet.")]
    NotReady,
    #[error("Parameter \"{0}\" is not part of the declared parameter set.")]
    NotFound(String),
    #[error("Parameters are already materialized.")]
    AlreadyMaterialized,
    #[error("Parameter loading failed; the session can't be used anymore.")]
    LoadingFailed,
    #[error(
        "Replacement for \"{name}\" has shape {actual_shape:?} and data type {actual_data_type:?}, \
        expected shape {expected_shape:?} and data type {expected_data_type:?}."
    )]
    IncompatibleReplacement {
        name: String,
        expected_shape: Box<[usize]>,
        expected_data_type: DataType,
        actual_shape: Box<[usize]>,
        actual_data_type: DataType,
    },
    #[error("Invalid shard metadata")]
    Metadata(#[from] MetadataError),
}
