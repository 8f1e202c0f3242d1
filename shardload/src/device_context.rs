use std::sync::Arc;

use thiserror::Error;

use crate::{Array, DataType};

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("Failed to allocate {size} bytes for array \"{label}\".")]
    AllocationFailed {
        label: String,
        size: usize,
    },
    #[error(
        "Copy size mismatch: array \"{label}\" holds {expected} bytes, got {actual} bytes."
    )]
    CopySizeMismatch {
        label: String,
        expected: usize,
        actual: usize,
    },
}

/// Allocator and copier for the arrays of one compute device.
pub trait DeviceContext {
    type DeviceArray: Array;

    /// Allocate a new zero-initialized array with the given shape and data type.
    fn array(
        &self,
        shape: &[usize],
        data_type: DataType,
        label: String,
    ) -> Result<Self::DeviceArray, DeviceError>;

    /// Copy raw bytes into an already allocated array.
    /// The byte count must match the array size exactly.
    fn copy_bytes_into(
        &self,
        array: &mut Self::DeviceArray,
        bytes: &[u8],
    ) -> Result<(), DeviceError>;

    /// Allocate an array and populate it with the given bytes.
    fn array_from_bytes(
        &self,
        shape: &[usize],
        data_type: DataType,
        label: String,
        bytes: &[u8],
    ) -> Result<Self::DeviceArray, DeviceError> {
        let mut array = self.array(shape, data_type, label)?;
        self.copy_bytes_into(&mut array, bytes)?;
        Ok(array)
    }
}

impl<C: DeviceContext> DeviceContext for &C {
    type DeviceArray = C::DeviceArray;

    fn array(
        &self,
        shape: &[usize],
        data_type: DataType,
        label: String,
    ) -> Result<Self::DeviceArray, DeviceError> {
        (**self).array(shape, data_type, label)
    }

    fn copy_bytes_into(
        &self,
        array: &mut Self::DeviceArray,
        bytes: &[u8],
    ) -> Result<(), DeviceError> {
        (**self).copy_bytes_into(array, bytes)
    }
}

impl<C: DeviceContext> DeviceContext for Arc<C> {
    type DeviceArray = C::DeviceArray;

    fn array(
        &self,
        shape: &[usize],
        data_type: DataType,
        label: String,
    ) -> Result<Self::DeviceArray, DeviceError> {
        self.as_ref().array(shape, data_type, label)
    }

    fn copy_bytes_into(
        &self,
        array: &mut Self::DeviceArray,
        bytes: &[u8],
    ) -> Result<(), DeviceError> {
        self.as_ref().copy_bytes_into(array, bytes)
    }
}
