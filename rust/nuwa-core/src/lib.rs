//! NuwaScript Core
//!
//! The shared runtime value model used by the compiler, interpreter, and
//! tool layer.

pub mod values;

pub use values::Value;
