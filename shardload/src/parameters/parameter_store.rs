use std::collections::HashMap;

use super::ParameterError;
use crate::Array;

/// Materialized parameters, index-aligned with the declared parameter order.
#[derive(Debug)]
pub struct ParameterStore<A> {
    names: Box<[String]>,
    tensors: Box<[A]>,
    index: HashMap<String, usize>,
}

impl<A> ParameterStore<A> {
    pub(crate) fn new(
        names: Box<[String]>,
        tensors: Box<[A]>,
    ) -> Self {
        debug_assert_eq!(names.len(), tensors.len());
        let index = names
            .iter()
            .enumerate()
            .map(|(position, name)| (name.clone(), position))
            .collect();
        Self {
            names,
            tensors,
            index,
        }
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn position(
        &self,
        name: &str,
    ) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn get(
        &self,
        name: &str,
    ) -> Result<&A, ParameterError> {
        self.position(name)
            .map(|position| &self.tensors[position])
            .ok_or_else(|| ParameterError::NotFound(name.to_string()))
    }

    /// Tensors in declared order.
    pub fn tensors(&self) -> &[A] {
        &self.tensors
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &A)> {
        self.names.iter().map(String::as_str).zip(self.tensors.iter())
    }
}

impl<A: Array> ParameterStore<A> {
    /// Swaps in a new tensor for `name` and returns the previous one.
    /// The replacement must keep the parameter's shape and data type.
    pub fn replace(
        &mut self,
        name: &str,
        tensor: A,
    ) -> Result<A, ParameterError> {
        let position = self
            .position(name)
            .ok_or_else(|| ParameterError::NotFound(name.to_string()))?;
        let current = &self.tensors[position];
        if current.shape() != tensor.shape()
            || current.data_type() != tensor.data_type()
        {
            return Err(ParameterError::IncompatibleReplacement {
                name: name.to_string(),
                expected_shape: current.shape().into(),
                expected_data_type: current.data_type(),
                actual_shape: tensor.shape().into(),
                actual_data_type: tensor.data_type(),
            });
        }
        Ok(std::mem::replace(&mut self.tensors[position], tensor))
    }

    pub fn total_size_in_bytes(&self) -> usize {
        self.tensors.iter().map(Array::size_in_bytes).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        DataType, DeviceContext,
        backends::cpu::{CpuArray, CpuContext},
    };

    fn store(context: &CpuContext) -> ParameterStore<CpuArray> {
        let weight = context
            .array(&[2, 2], DataType::F32, String::from("weight"))
            .unwrap();
        let bias = context
            .array(&[2], DataType::F32, String::from("bias"))
            .unwrap();
        ParameterStore::new(
            vec![String::from("weight"), String::from("bias")].into(),
            vec![weight, bias].into(),
        )
    }

    #[test]
    fn test_lookup_follows_declared_order() {
        let context = CpuContext::new();
        let store = store(&context);
        assert_eq!(store.len(), 2);
        assert_eq!(store.position("bias"), Some(1));
        assert_eq!(store.get("weight").unwrap().shape(), &[2, 2]);
        assert_eq!(store.total_size_in_bytes(), 24);
        let names: Vec<_> = store.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["weight", "bias"]);
    }

    #[test]
    fn test_unknown_name() {
        let context = CpuContext::new();
        let store = store(&context);
        assert!(matches!(
            store.get("fc3.weight"),
            Err(ParameterError::NotFound(name)) if name == "fc3.weight"
        ));
    }

    #[test]
    fn test_replace_swaps_tensor() {
        let context = CpuContext::new();
        let mut store = store(&context);
        let updated = context
            .array_from_bytes(
                &[2],
                DataType::F32,
                String::from("bias"),
                bytemuck::cast_slice(&[0.5f32, 0.25]),
            )
            .unwrap();
        let previous = store.replace("bias", updated).unwrap();
        assert_eq!(previous.as_slice::<f32>().unwrap(), &[0.0, 0.0]);
        assert_eq!(
            store.get("bias").unwrap().as_slice::<f32>().unwrap(),
            &[0.5, 0.25]
        );
    }

    #[test]
    fn test_replace_rejects_other_layout() {
        let context = CpuContext::new();
        let mut store = store(&context);
        let wrong = context
            .array(&[3], DataType::F32, String::from("bias"))
            .unwrap();
        assert!(matches!(
            store.replace("bias", wrong),
            Err(ParameterError::IncompatibleReplacement { .. })
        ));
    }
}
