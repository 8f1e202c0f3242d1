/// Value returned by a compiled training or inference step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutput<A> {
    Tensor(A),
    Tuple(Vec<StepOutput<A>>),
}

impl<A> StepOutput<A> {
    pub fn into_tensor(self) -> Option<A> {
        match self {
            StepOutput::Tensor(tensor) => Some(tensor),
            StepOutput::Tuple(_) => None,
        }
    }

    pub fn into_tuple(self) -> Option<Vec<StepOutput<A>>> {
        match self {
            StepOutput::Tensor(_) => None,
            StepOutput::Tuple(items) => Some(items),
        }
    }

    /// Short structural description, e.g. `tuple(tensor, tuple(tensor))`.
    pub fn describe(&self) -> String {
        match self {
            StepOutput::Tensor(_) => String::from("tensor"),
            StepOutput::Tuple(items) => {
                let inner: Vec<String> =
                    items.iter().map(StepOutput::describe).collect();
                format!("tuple({})", inner.join(", "))
            },
        }
    }
}
