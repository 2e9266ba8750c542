#![allow(
    non_camel_case_types,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions
)]

pub mod cache;
pub mod command;
pub mod config;
pub mod directory;
pub mod error;
pub mod fifo;
pub mod invariants;
pub mod memory;
pub mod processor;
pub mod sim;
pub mod sync;

#[cfg(test)]
pub mod testing;

pub use cache::{block::State, Cache};
pub use config::Config;
pub use directory::{Directory, Transaction};
pub use error::{Error, Result};
pub use memory::Memory;
pub use processor::Processor;
pub use sim::Simulation;

/// Index into main memory and tag of a cache line.
pub type address = u64;

/// A memory word.
pub type value = u64;

pub type ProcessorId = usize;

pub struct Optional<T>(Option<T>);

impl<T> From<Option<T>> for Optional<T> {
    fn from(value: Option<T>) -> Self {
        Self(value)
    }
}

impl<T> std::fmt::Display for Optional<T>
where
    T: std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(ref value) => write!(f, "{value}"),
            None => write!(f, "-"),
        }
    }
}
