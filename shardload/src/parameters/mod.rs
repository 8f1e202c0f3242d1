mod descriptor;
mod error;
mod materializer;
mod metadata_source;
mod ndarray_cache;
mod parameter_store;
mod shard_buffer;
mod shard_parser;
mod tensor_cache;

pub use descriptor::{Encoding, ParameterDescriptor, ShardGroup, ShardMetadata};
pub use error::{MetadataError, ParameterError, ShardParseError};
pub use materializer::materialize;
pub use metadata_source::{MetadataSource, StaticMetadataSource};
pub use ndarray_cache::{
    FileRecord, ModelMetadata, ModelParameter, NDArrayCacheManifest,
    NDArrayCacheSource, ParamRecord,
};
pub use parameter_store::ParameterStore;
pub use shard_buffer::{ShardBuffer, shard_index_from_filename};
pub use shard_parser::{ShardParser, resolve_shard};
pub use tensor_cache::NamedTensorCache;
