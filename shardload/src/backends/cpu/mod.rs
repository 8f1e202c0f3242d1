mod array;
mod context;

pub use array::CpuArray;
pub use context::CpuContext;
