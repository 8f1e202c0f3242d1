use std::sync::atomic::{AtomicUsize, Ordering};

use super::CpuArray;
use crate::{
    Array, DataType, DeviceContext, DeviceError, array::checked_size_for_shape,
};

/// Allocates arrays in host memory.
#[derive(Debug, Default)]
pub struct CpuContext {
    allocation_limit: Option<usize>,
    allocated: AtomicUsize,
}

impl CpuContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context that refuses allocations once `limit` bytes have been handed out.
    pub fn with_allocation_limit(limit: usize) -> Self {
        Self {
            allocation_limit: Some(limit),
            allocated: AtomicUsize::new(0),
        }
    }

    /// Total bytes allocated through this context.
    pub fn allocated_bytes(&self) -> usize {
        self.allocated.load(Ordering::Relaxed)
    }

    fn reserve(
        &self,
        size: usize,
    ) -> bool {
        let Some(limit) = self.allocation_limit else {
            self.allocated.fetch_add(size, Ordering::Relaxed);
            return true;
        };
        self.allocated
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                current.checked_add(size).filter(|total| *total <= limit)
            })
            .is_ok()
    }
}

impl DeviceContext for CpuContext {
    type DeviceArray = CpuArray;

    fn array(
        &self,
        shape: &[usize],
        data_type: DataType,
        label: String,
    ) -> Result<CpuArray, DeviceError> {
        let Some(size) = checked_size_for_shape(shape, data_type) else {
            return Err(DeviceError::AllocationFailed {
                label,
                size: usize::MAX,
            });
        };
        if !self.reserve(size) {
            return Err(DeviceError::AllocationFailed {
                label,
                size,
            });
        }
        Ok(CpuArray::zeroed(shape, data_type, label))
    }

    fn copy_bytes_into(
        &self,
        array: &mut CpuArray,
        bytes: &[u8],
    ) -> Result<(), DeviceError> {
        if array.size_in_bytes() != bytes.len() {
            return Err(DeviceError::CopySizeMismatch {
                label: array.label().to_string(),
                expected: array.size_in_bytes(),
                actual: bytes.len(),
            });
        }
        array.buffer_mut().copy_from_slice(bytes);
        Ok(())
    }
}
