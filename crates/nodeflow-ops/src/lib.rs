pub mod builtin;
pub mod library;
pub mod registry;

pub use library::OpLibrary;
pub use registry::{OpRegistry, RegisteredOp};
