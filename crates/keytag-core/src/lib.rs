//! Shared types for the keytag access terminal.
//!
//! - [`TagId`]: canonical identifier of a proximity tag
//! - [`Error`]: errors shared by the terminal crates
//! - [`constants`]: tag format, timing and display defaults

pub mod constants;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{TagId, TagPayload};

/// Crate version, reported at startup
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
