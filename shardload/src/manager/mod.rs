mod load_state;
mod parameter_manager;
mod shared_parameter_manager;

pub use load_state::{Ingested, LoadState};
pub use parameter_manager::ParameterManager;
pub use shared_parameter_manager::{ShardWriter, SharedParameterManager};

use std::collections::HashSet;

use tracing::warn;

use crate::parameters::{MetadataError, MetadataSource, ShardMetadata};

/// Reads the shard layout and declared order once and checks that the
/// declared order names every parameter at most once.
fn read_metadata(
    source: &impl MetadataSource
) -> Result<(ShardMetadata, Box<[String]>), MetadataError> {
    let metadata = source.shard_metadata()?;
    let parameter_order = source.declared_parameter_order()?;

    let described: HashSet<&str> = metadata
        .descriptors()
        .map(|descriptor| descriptor.name.as_str())
        .collect();
    let mut seen = HashSet::with_capacity(parameter_order.len());
    for name in &parameter_order {
        if !seen.insert(name.as_str()) {
            return Err(MetadataError::DuplicateParameter(name.clone()));
        }
        if !described.contains(name.as_str()) {
            warn!(
                parameter = %name,
                "declared parameter is not described by any shard"
            );
        }
    }

    Ok((metadata, parameter_order.into_boxed_slice()))
}
