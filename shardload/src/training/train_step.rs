use super::StepOutput;

/// Externally compiled training step, called with the step inputs followed by
/// every model parameter in declared order.
pub trait TrainStep<A> {
    fn call(
        &self,
        inputs: &[&A],
        parameters: &[&A],
    ) -> StepOutput<A>;
}

impl<A, F> TrainStep<A> for F
where
    F: Fn(&[&A], &[&A]) -> StepOutput<A>,
{
    fn call(
        &self,
        inputs: &[&A],
        parameters: &[&A],
    ) -> StepOutput<A> {
        self(inputs, parameters)
    }
}
