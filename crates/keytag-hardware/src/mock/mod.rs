//! Mock device implementations for testing and development.
//!
//! This module provides simulated device implementations that can be controlled
//! programmatically without requiring physical hardware.

pub mod display;
pub mod input;
pub mod tag_reader;

// Re-export commonly used types
pub use display::{DisplayOp, MockDisplay, MockDisplayHandle};
pub use input::{MockInput, MockInputHandle};
pub use tag_reader::{MockTagReader, MockTagReaderHandle};
