use std::{fmt, str::FromStr};

use bytemuck::Pod;
use half::{bf16, f16};
use num_traits::NumCast;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown data type \"{0}\".")]
pub struct UnknownDataType(pub String);

#[derive(
    Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Copy, Clone, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub enum DataType {
    // Floating point
    BF16,
    F16,
    F32,
    F64,
    // Sub-byte integers
    I4,
    U4,
    // Normal integers
    Bool,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
}

impl DataType {
    pub fn size_in_bits(&self) -> usize {
        match self {
            DataType::BF16 => 16,
            DataType::F16 => 16,
            DataType::F32 => 32,
            DataType::F64 => 64,
            DataType::I4 => 4,
            DataType::U4 => 4,
            DataType::Bool => 8,
            DataType::I8 => 8,
            DataType::U8 => 8,
            DataType::I16 => 16,
            DataType::U16 => 16,
            DataType::I32 => 32,
            DataType::U32 => 32,
            DataType::I64 => 64,
            DataType::U64 => 64,
        }
    }

    pub fn size_in_bytes(&self) -> usize {
        self.size_in_bits().div_ceil(8)
    }

    /// Name used for this type in shard manifests.
    pub fn manifest_name(&self) -> &'static str {
        match self {
            DataType::BF16 => "bfloat16",
            DataType::F16 => "float16",
            DataType::F32 => "float32",
            DataType::F64 => "float64",
            DataType::I4 => "int4",
            DataType::U4 => "uint4",
            DataType::Bool => "bool",
            DataType::I8 => "int8",
            DataType::U8 => "uint8",
            DataType::I16 => "int16",
            DataType::U16 => "uint16",
            DataType::I32 => "int32",
            DataType::U32 => "uint32",
            DataType::I64 => "int64",
            DataType::U64 => "uint64",
        }
    }
}

impl FromStr for DataType {
    type Err = UnknownDataType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let data_type = match s {
            "bfloat16" | "bf16" => DataType::BF16,
            "float16" | "f16" => DataType::F16,
            "float32" | "f32" => DataType::F32,
            "float64" | "f64" => DataType::F64,
            "int4" | "i4" => DataType::I4,
            "uint4" | "u4" => DataType::U4,
            "bool" => DataType::Bool,
            "int8" | "i8" => DataType::I8,
            "uint8" | "u8" => DataType::U8,
            "int16" | "i16" => DataType::I16,
            "uint16" | "u16" => DataType::U16,
            "int32" | "i32" => DataType::I32,
            "uint32" | "u32" => DataType::U32,
            "int64" | "i64" => DataType::I64,
            "uint64" | "u64" => DataType::U64,
            _ => return Err(UnknownDataType(s.to_string())),
        };
        Ok(data_type)
    }
}

impl TryFrom<String> for DataType {
    type Error = UnknownDataType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DataType> for String {
    fn from(data_type: DataType) -> Self {
        data_type.manifest_name().to_string()
    }
}

impl fmt::Display for DataType {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.manifest_name())
    }
}

pub trait ArrayElement: NumCast + Pod {
    fn data_type() -> DataType;
}

impl ArrayElement for f16 {
    fn data_type() -> DataType {
        DataType::F16
    }
}

impl ArrayElement for bf16 {
    fn data_type() -> DataType {
        DataType::BF16
    }
}

impl ArrayElement for f32 {
    fn data_type() -> DataType {
        DataType::F32
    }
}

impl ArrayElement for f64 {
    fn data_type() -> DataType {
        DataType::F64
    }
}

impl ArrayElement for i8 {
    fn data_type() -> DataType {
        DataType::I8
    }
}

impl ArrayElement for u8 {
    fn data_type() -> DataType {
        DataType::U8
    }
}

impl ArrayElement for i16 {
    fn data_type() -> DataType {
        DataType::I16
    }
}

impl ArrayElement for u16 {
    fn data_type() -> DataType {
        DataType::U16
    }
}

impl ArrayElement for i32 {
    fn data_type() -> DataType {
        DataType::I32
    }
}

impl ArrayElement for u32 {
    fn data_type() -> DataType {
        DataType::U32
    }
}

impl ArrayElement for i64 {
    fn data_type() -> DataType {
        DataType::I64
    }
}

impl ArrayElement for u64 {
    fn data_type() -> DataType {
        DataType::U64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_names_round_trip() {
        for data_type in [
            DataType::BF16,
            DataType::F32,
            DataType::U4,
            DataType::Bool,
            DataType::I64,
        ] {
            assert_eq!(
                data_type.manifest_name().parse::<DataType>(),
                Ok(data_type)
            );
        }
    }

    #[test]
    fn test_unknown_name_is_rejected() {
        assert_eq!(
            "float8_e4m3".parse::<DataType>(),
            Err(UnknownDataType("float8_e4m3".to_string()))
        );
    }

    #[test]
    fn test_deserialize_from_json_string() {
        let data_type: DataType = serde_json::from_str("\"float16\"").unwrap();
        assert_eq!(data_type, DataType::F16);
        assert_eq!(serde_json::to_string(&DataType::U8).unwrap(), "\"uint8\"");
    }

    #[test]
    fn test_sub_byte_sizes_round_up() {
        assert_eq!(DataType::I4.size_in_bytes(), 1);
        assert_eq!(DataType::BF16.size_in_bytes(), 2);
    }
}
