//! Domain module containing pure value types with no I/O.

pub mod accelerator;

pub use accelerator::{Accelerator, AcceleratorError};
