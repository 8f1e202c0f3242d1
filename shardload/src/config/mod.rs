mod error;
mod loader_config;

pub use error::ConfigError;
pub use loader_config::{
    DEFAULT_CACHE_METADATA_FILE, DEFAULT_CHUNK_SIZE,
    DEFAULT_MODEL_METADATA_FILE, LoaderConfig,
};
