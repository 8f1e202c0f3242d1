pub mod array;
pub use array::Array;

pub mod backends;

pub mod config;
pub use config::LoaderConfig;

pub mod data_type;
pub use data_type::{ArrayElement, DataType};

pub mod device_context;
pub use device_context::{DeviceContext, DeviceError};

pub mod manager;
pub use manager::{
    Ingested, LoadState, ParameterManager, ShardWriter, SharedParameterManager,
};

pub mod parameters;
pub mod training;
pub mod utils;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
