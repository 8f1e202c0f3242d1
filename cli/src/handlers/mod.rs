mod inspect;
mod load;

pub use inspect::handle_inspect;
pub use load::handle_load;
