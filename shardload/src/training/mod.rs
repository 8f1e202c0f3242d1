mod gradient_result;
mod step_output;
mod train_step;

pub use gradient_result::GradientResult;
pub use step_output::StepOutput;
pub use train_step::TrainStep;
