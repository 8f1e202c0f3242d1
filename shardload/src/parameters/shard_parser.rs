use half::bf16;
use tracing::debug;

use super::{
    Encoding, ParameterDescriptor, ShardGroup, ShardMetadata, ShardParseError,
    shard_index_from_filename,
};
use crate::DeviceContext;

/// Finds the shard group a file name refers to.
pub fn resolve_shard<'metadata>(
    metadata: &'metadata ShardMetadata,
    filename: &str,
) -> Result<&'metadata ShardGroup, ShardParseError> {
    let index = shard_index_from_filename(filename)?;
    metadata.group(index).ok_or_else(|| ShardParseError::UnknownShardIndex {
        filename: filename.to_string(),
        index,
    })
}

/// Turns complete shard bytes into named device arrays.
///
/// Encoded parameters are decoded through a host staging buffer that is
/// reused across descriptors and shards.
#[derive(Debug, Default)]
pub struct ShardParser {
    staging: Vec<u8>,
}

impl ShardParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse_shard<C: DeviceContext>(
        &mut self,
        context: &C,
        metadata: &ShardMetadata,
        filename: &str,
        bytes: &[u8],
    ) -> Result<Vec<(String, C::DeviceArray)>, ShardParseError> {
        let group = resolve_shard(metadata, filename)?;
        self.parse_group(context, group, bytes)
    }

    /// Produces every tensor of the group, or none of them.
    pub fn parse_group<C: DeviceContext>(
        &mut self,
        context: &C,
        group: &ShardGroup,
        bytes: &[u8],
    ) -> Result<Vec<(String, C::DeviceArray)>, ShardParseError> {
        if let Some(expected) = group.nbytes {
            if expected != bytes.len() {
                return Err(ShardParseError::ShardSizeMismatch {
                    index: group.index,
                    expected,
                    actual: bytes.len(),
                });
            }
        }

        let mut tensors = Vec::with_capacity(group.parameters.len());
        for descriptor in &group.parameters {
            let source = Self::slice(group.index, descriptor, bytes)?;
            let tensor = self.load(context, descriptor, source)?;
            debug!(
                shard = group.index,
                parameter = %descriptor.name,
                bytes = descriptor.byte_length,
                "loaded parameter"
            );
            tensors.push((descriptor.name.clone(), tensor));
        }
        Ok(tensors)
    }

    fn slice<'bytes>(
        shard_index: usize,
        descriptor: &ParameterDescriptor,
        bytes: &'bytes [u8],
    ) -> Result<&'bytes [u8], ShardParseError> {
        let expected_size = descriptor.expected_stored_size();
        if expected_size != Some(descriptor.byte_length) {
            return Err(ShardParseError::SizeMismatch {
                name: descriptor.name.clone(),
                data_type: descriptor.data_type,
                shape: descriptor.shape.clone(),
                expected_size: expected_size.unwrap_or(usize::MAX),
                actual_size: descriptor.byte_length,
            });
        }

        let begin = descriptor.byte_offset;
        let end = begin.checked_add(descriptor.byte_length);
        match end {
            Some(end) if end <= bytes.len() => Ok(&bytes[begin..end]),
            _ => Err(ShardParseError::OutOfBounds {
                name: descriptor.name.clone(),
                index: shard_index,
                begin,
                end: end.unwrap_or(usize::MAX),
                shard_size: bytes.len(),
            }),
        }
    }

    fn load<C: DeviceContext>(
        &mut self,
        context: &C,
        descriptor: &ParameterDescriptor,
        source: &[u8],
    ) -> Result<C::DeviceArray, ShardParseError> {
        let mut array = context.array(
            &descriptor.shape,
            descriptor.data_type,
            descriptor.name.clone(),
        )?;
        match descriptor.encoding {
            Encoding::Raw => context.copy_bytes_into(&mut array, source)?,
            Encoding::F32ToBF16 => {
                self.decode_bf16(source);
                context.copy_bytes_into(&mut array, &self.staging)?;
            },
        }
        Ok(array)
    }

    fn decode_bf16(
        &mut self,
        source: &[u8],
    ) {
        self.staging.clear();
        self.staging.reserve(source.len() * 2);
        for pair in source.chunks_exact(2) {
            let value = bf16::from_bits(u16::from_le_bytes([pair[0], pair[1]]));
            self.staging.extend_from_slice(&value.to_f32().to_le_bytes());
        }
    }
}
