use super::{MetadataError, ShardMetadata};

/// Supplies the shard layout and the declared parameter order of one model.
pub trait MetadataSource {
    fn shard_metadata(&self) -> Result<ShardMetadata, MetadataError>;

    /// Parameter names in the order the model consumes them.
    fn declared_parameter_order(&self) -> Result<Vec<String>, MetadataError>;
}

/// Metadata that is already in memory.
#[derive(Debug, Clone)]
pub struct StaticMetadataSource {
    metadata: ShardMetadata,
    parameter_order: Vec<String>,
}

impl StaticMetadataSource {
    pub fn new(
        metadata: ShardMetadata,
        parameter_order: Vec<String>,
    ) -> Self {
        Self {
            metadata,
            parameter_order,
        }
    }

    /// Declares every described parameter, in shard then descriptor order.
    pub fn from_metadata(metadata: ShardMetadata) -> Self {
        let parameter_order = metadata
            .descriptors()
            .map(|descriptor| descriptor.name.clone())
            .collect();
        Self::new(metadata, parameter_order)
    }
}

impl MetadataSource for StaticMetadataSource {
    fn shard_metadata(&self) -> Result<ShardMetadata, MetadataError> {
        Ok(self.metadata.clone())
    }

    fn declared_parameter_order(&self) -> Result<Vec<String>, MetadataError> {
        Ok(self.parameter_order.clone())
    }
}
