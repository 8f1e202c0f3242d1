use crate::{Array, DataType, array::size_for_shape};

/// Host-memory array. Storage is kept in 8-byte words so that typed views
/// are aligned for every [`ArrayElement`](crate::ArrayElement).
#[derive(Debug, Clone, PartialEq)]
pub struct CpuArray {
    storage: Box<[u64]>,
    size: usize,
    shape: Box<[usize]>,
    data_type: DataType,
    label: String,
}

impl CpuArray {
    pub(super) fn zeroed(
        shape: &[usize],
        data_type: DataType,
        label: String,
    ) -> Self {
        let size = size_for_shape(shape, data_type);
        let words = size.div_ceil(size_of::<u64>());
        Self {
            storage: vec![0u64; words].into_boxed_slice(),
            size,
            shape: shape.into(),
            data_type,
            label,
        }
    }

    pub fn buffer_mut(&mut self) -> &mut [u8] {
        &mut bytemuck::cast_slice_mut::<u64, u8>(&mut self.storage)[..self.size]
    }
}

impl Array for CpuArray {
    fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn data_type(&self) -> DataType {
        self.data_type
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn buffer(&self) -> &[u8] {
        &bytemuck::cast_slice::<u64, u8>(&self.storage)[..self.size]
    }
}
