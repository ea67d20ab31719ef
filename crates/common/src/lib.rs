//! Common types, output keys, and errors shared across `mtls-stacks` crates.

pub mod error;
pub mod outputs;
pub mod protocol;

pub use error::StackError;
pub use outputs::OutputKey;
