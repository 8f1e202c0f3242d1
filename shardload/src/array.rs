use ndarray::{ArrayView, IxDyn, ShapeError};
use thiserror::Error;

use crate::{ArrayElement, DataType};

#[derive(Error, Debug)]
pub enum ArrayConversionError {
    #[error("Invalid data type, expected {expected:?}, actual {actual:?}")]
    InvalidDataType {
        expected: DataType,
        actual: DataType,
    },
    #[error("Array of shape {0:?} is not a scalar")]
    NotAScalar(Box<[usize]>),
    #[error("Buffer does not match the array shape")]
    Shape(#[from] ShapeError),
}

/// Calculate the number of bytes required to store an array with a given shape and DataType.
/// Takes into account alignment of packed sub-byte data types.
/// Returns `None` when the size does not fit in `usize`.
pub fn checked_size_for_shape(
    shape: &[usize],
    data_type: DataType,
) -> Option<usize> {
    let Some(last_dim) = shape.last() else {
        return Some(data_type.size_in_bytes());
    };

    let bits_per_row = last_dim.checked_mul(data_type.size_in_bits())?;
    let padded_bytes_per_row = bits_per_row.div_ceil(8);

    shape
        .iter()
        .rev()
        .skip(1)
        .try_fold(padded_bytes_per_row, |size, dim| size.checked_mul(*dim))
}

/// Like [`checked_size_for_shape`], saturating at `usize::MAX`.
pub fn size_for_shape(
    shape: &[usize],
    data_type: DataType,
) -> usize {
    checked_size_for_shape(shape, data_type).unwrap_or(usize::MAX)
}

/// Backend-agnostic tensor handle produced by a [`DeviceContext`](crate::DeviceContext).
pub trait Array {
    fn shape(&self) -> &[usize];

    fn num_elements(&self) -> usize {
        self.shape().iter().product()
    }

    fn data_type(&self) -> DataType;

    fn label(&self) -> &str;

    /// Host-visible bytes of the array.
    fn buffer(&self) -> &[u8];

    fn size_in_bytes(&self) -> usize {
        size_for_shape(self.shape(), self.data_type())
    }

    fn is_scalar(&self) -> bool {
        self.shape().is_empty()
    }

    /// Returns the scalar value contained in the array.
    fn item<T: ArrayElement>(&self) -> Result<T, ArrayConversionError> {
        if !self.is_scalar() {
            return Err(ArrayConversionError::NotAScalar(self.shape().into()));
        }
        self.as_slice::<T>()?.first().copied().ok_or_else(|| {
            ArrayConversionError::NotAScalar(self.shape().into())
        })
    }

    /// Returns a typed slice referring to the underlying buffer.
    /// Returns an error if the requested type does not match the array's data type.
    fn as_slice<T: ArrayElement>(&self) -> Result<&[T], ArrayConversionError> {
        if T::data_type() != self.data_type() {
            return Err(ArrayConversionError::InvalidDataType {
                expected: T::data_type(),
                actual: self.data_type(),
            });
        }
        Ok(bytemuck::cast_slice(self.buffer()))
    }

    /// Returns an ndarray::ArrayView of the underlying buffer.
    fn as_view<T: ArrayElement>(
        &self
    ) -> Result<ArrayView<'_, T, IxDyn>, ArrayConversionError> {
        Ok(ArrayView::from_shape(IxDyn(self.shape()), self.as_slice()?)?)
    }
}
