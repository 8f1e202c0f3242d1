use std::collections::HashMap;

use super::StepOutput;

/// Gradients of a training step, keyed by parameter name.
#[derive(Debug, Clone, PartialEq)]
pub enum GradientResult<A> {
    Success(HashMap<String, A>),
    UnexpectedShape(String),
}

impl<A> GradientResult<A> {
    /// Reads the gradients out of a step output shaped
    /// `tuple(loss, tuple(grad_input_0, .., grad_param_0, ..))`, where the
    /// gradient tuple holds one entry per step input followed by one entry
    /// per parameter.
    pub fn from_step_output(
        output: StepOutput<A>,
        parameter_names: &[String],
        num_inputs: usize,
    ) -> Self {
        let description = output.describe();
        let unexpected = || {
            GradientResult::UnexpectedShape(format!(
                "expected tuple(loss, tuple of {} gradients), got {description}",
                num_inputs + parameter_names.len()
            ))
        };

        let Some(mut outputs) = output.into_tuple() else {
            return unexpected();
        };
        if outputs.len() != 2 {
            return unexpected();
        }
        let Some(gradients) = outputs.pop().and_then(StepOutput::into_tuple)
        else {
            return unexpected();
        };
        if gradients.len() != num_inputs + parameter_names.len() {
            return unexpected();
        }

        let mut by_name = HashMap::with_capacity(parameter_names.len());
        for (name, gradient) in
            parameter_names.iter().zip(gradients.into_iter().skip(num_inputs))
        {
            let Some(tensor) = gradient.into_tensor() else {
                return unexpected();
            };
            by_name.insert(name.clone(), tensor);
        }
        GradientResult::Success(by_name)
    }

    pub fn success(self) -> Option<HashMap<String, A>> {
        match self {
            GradientResult::Success(gradients) => Some(gradients),
            GradientResult::UnexpectedShape(_) => None,
        }
    }
}
