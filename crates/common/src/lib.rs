//! Shared error utilities used across all donna crates.

pub mod error;

pub use error::FromMessage;
