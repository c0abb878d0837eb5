//! # Switchboard Core Kernel
//!
//! Crate-wide plumbing shared by every subsystem:
//!
//! - **Error Handling**: the kernel [`Error`](error::Error) wrapping each
//!   subsystem's typed error, and the `Result` alias in the `error` submodule.
//! - **Core Constants**: engine name and plugin API version in `constants`.
pub mod constants;
pub mod error;

pub use error::{Error, Result};
// Test module declaration
#[cfg(test)]
mod tests;
