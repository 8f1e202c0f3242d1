use std::{
    collections::{BTreeMap, HashSet},
    fmt,
    str::FromStr,
};

use super::MetadataError;
use crate::{DataType, array::checked_size_for_shape};

/// How a parameter's bytes are stored inside its shard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// Bytes are the tensor's bytes.
    #[default]
    Raw,
    /// Stored as bfloat16, materialized as float32.
    F32ToBF16,
}

impl Encoding {
    /// Number of bytes a tensor of this shape occupies inside the shard,
    /// or `None` if that overflows `usize`.
    pub fn stored_size(
        &self,
        shape: &[usize],
        data_type: DataType,
    ) -> Option<usize> {
        match self {
            Encoding::Raw => checked_size_for_shape(shape, data_type),
            Encoding::F32ToBF16 => checked_size_for_shape(shape, DataType::BF16),
        }
    }
}

impl FromStr for Encoding {
    type Err = MetadataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raw" => Ok(Encoding::Raw),
            "f32-to-bf16" => Ok(Encoding::F32ToBF16),
            _ => Err(MetadataError::UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Encoding::Raw => f.write_str("raw"),
            Encoding::F32ToBF16 => f.write_str("f32-to-bf16"),
        }
    }
}

/// Location and layout of one named tensor inside a shard file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDescriptor {
    pub name: String,
    pub shape: Box<[usize]>,
    pub data_type: DataType,
    pub encoding: Encoding,
    pub shard_index: usize,
    pub byte_offset: usize,
    pub byte_length: usize,
}

impl ParameterDescriptor {
    pub fn new(
        name: impl Into<String>,
        shape: &[usize],
        data_type: DataType,
        shard_index: usize,
        byte_offset: usize,
        byte_length: usize,
    ) -> Self {
        Self {
            name: name.into(),
            shape: shape.into(),
            data_type,
            encoding: Encoding::Raw,
            shard_index,
            byte_offset,
            byte_length,
        }
    }

    pub fn with_encoding(
        mut self,
        encoding: Encoding,
    ) -> Self {
        self.encoding = encoding;
        self
    }

    /// Size of the materialized tensor in bytes.
    pub fn tensor_size(&self) -> Option<usize> {
        checked_size_for_shape(&self.shape, self.data_type)
    }

    /// Size the descriptor's shape and encoding imply for the stored bytes.
    pub fn expected_stored_size(&self) -> Option<usize> {
        self.encoding.stored_size(&self.shape, self.data_type)
    }
}

/// Descriptors of a single shard file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardGroup {
    pub index: usize,
    pub data_path: Option<String>,
    pub nbytes: Option<usize>,
    pub parameters: Box<[ParameterDescriptor]>,
}

impl ShardGroup {
    pub fn new(
        index: usize,
        parameters: Vec<ParameterDescriptor>,
    ) -> Self {
        Self {
            index,
            data_path: None,
            nbytes: None,
            parameters: parameters.into_boxed_slice(),
        }
    }

    pub fn with_data_path(
        mut self,
        data_path: impl Into<String>,
    ) -> Self {
        self.data_path = Some(data_path.into());
        self
    }

    pub fn with_nbytes(
        mut self,
        nbytes: usize,
    ) -> Self {
        self.nbytes = Some(nbytes);
        self
    }
}

/// Every shard group of a model, keyed by shard index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardMetadata {
    groups: BTreeMap<usize, ShardGroup>,
}

impl ShardMetadata {
    pub fn new(
        total_shard_count: usize,
        groups: impl IntoIterator<Item = ShardGroup>,
    ) -> Result<Self, MetadataError> {
        if total_shard_count == 0 {
            return Err(MetadataError::NoShards);
        }

        let mut by_index = BTreeMap::new();
        let mut names = HashSet::new();
        for group in groups {
            for descriptor in &group.parameters {
                if descriptor.shard_index != group.index {
                    return Err(MetadataError::MisplacedDescriptor {
                        name: descriptor.name.clone(),
                        claimed: descriptor.shard_index,
                        group: group.index,
                    });
                }
                if descriptor.encoding == Encoding::F32ToBF16
                    && descriptor.data_type != DataType::F32
                {
                    return Err(MetadataError::UnsupportedEncoding {
                        name: descriptor.name.clone(),
                        encoding: descriptor.encoding,
                        data_type: descriptor.data_type,
                    });
                }
                if !names.insert(descriptor.name.clone()) {
                    return Err(MetadataError::DuplicateParameter(
                        descriptor.name.clone(),
                    ));
                }
            }
            let index = group.index;
            if by_index.insert(index, group).is_some() {
                return Err(MetadataError::DuplicateShardIndex(index));
            }
        }

        if by_index.len() != total_shard_count {
            return Err(MetadataError::ShardCountMismatch {
                declared: total_shard_count,
                described: by_index.len(),
            });
        }

        Ok(Self {
            groups: by_index,
        })
    }

    pub fn total_shard_count(&self) -> usize {
        self.groups.len()
    }

    pub fn group(
        &self,
        index: usize,
    ) -> Option<&ShardGroup> {
        self.groups.get(&index)
    }

    pub fn groups(&self) -> impl Iterator<Item = &ShardGroup> {
        self.groups.values()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &ParameterDescriptor> {
        self.groups.values().flat_map(|group| group.parameters.iter())
    }

    pub fn descriptor(
        &self,
        name: &str,
    ) -> Option<&ParameterDescriptor> {
        self.descriptors().find(|descriptor| descriptor.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(
        name: &str,
        shard_index: usize,
    ) -> ParameterDescriptor {
        ParameterDescriptor::new(name, &[1], DataType::F32, shard_index, 0, 4)
    }

    #[test]
    fn test_rejects_empty_metadata() {
        assert!(matches!(
            ShardMetadata::new(0, []),
            Err(MetadataError::NoShards)
        ));
    }

    #[test]
    fn test_rejects_count_mismatch() {
        let result =
            ShardMetadata::new(2, [ShardGroup::new(0, vec![descriptor("a", 0)])]);
        assert!(matches!(
            result,
            Err(MetadataError::ShardCountMismatch {
                declared: 2,
                described: 1,
            })
        ));
    }

    #[test]
    fn test_rejects_duplicate_names_across_shards() {
        let result = ShardMetadata::new(
            2,
            [
                ShardGroup::new(0, vec![descriptor("a", 0)]),
                ShardGroup::new(1, vec![descriptor("a", 1)]),
            ],
        );
        assert!(matches!(result, Err(MetadataError::DuplicateParameter(name)) if name == "a"));
    }

    #[test]
    fn test_rejects_misplaced_descriptor() {
        let result =
            ShardMetadata::new(1, [ShardGroup::new(0, vec![descriptor("a", 3)])]);
        assert!(matches!(
            result,
            Err(MetadataError::MisplacedDescriptor {
                claimed: 3,
                group: 0,
                ..
            })
        ));
    }

    #[test]
    fn test_bf16_encoding_requires_f32() {
        let half_descriptor =
            ParameterDescriptor::new("h", &[2], DataType::F16, 0, 0, 4)
                .with_encoding(Encoding::F32ToBF16);
        let result =
            ShardMetadata::new(1, [ShardGroup::new(0, vec![half_descriptor])]);
        assert!(matches!(
            result,
            Err(MetadataError::UnsupportedEncoding { .. })
        ));
    }

    #[test]
    fn test_stored_size_follows_encoding() {
        let encoded = ParameterDescriptor::new("w", &[4, 8], DataType::F32, 0, 0, 64)
            .with_encoding(Encoding::F32ToBF16);
        assert_eq!(encoded.expected_stored_size(), Some(64));
        assert_eq!(encoded.tensor_size(), Some(128));

        let huge =
            ParameterDescriptor::new("w", &[1 << 62, 4], DataType::F32, 0, 0, 0);
        assert_eq!(huge.expected_stored_size(), None);
    }

    #[test]
    fn test_lookup_by_index_and_name() {
        let metadata = ShardMetadata::new(
            2,
            [
                ShardGroup::new(1, vec![descriptor("b", 1)]),
                ShardGroup::new(0, vec![descriptor("a", 0)]),
            ],
        )
        .unwrap();
        assert_eq!(metadata.total_shard_count(), 2);
        assert_eq!(metadata.group(1).unwrap().parameters[0].name, "b");
        assert_eq!(metadata.descriptor("a").unwrap().shard_index, 0);
        assert!(metadata.group(2).is_none());
    }
}
