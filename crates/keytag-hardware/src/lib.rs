//! Hardware device abstraction layer for the keytag access terminal.
//!
//! This crate provides trait-based abstractions for the terminal's
//! peripherals: the character display, the proximity tag reader and the
//! keypad/button input. These traits enable easy substitution between mock
//! implementations (for development and testing) and real hardware drivers.
//!
//! # Design Philosophy
//!
//! - **Async-first**: All I/O operations are asynchronous using native `async fn`
//!   in traits (Rust 1.90 + Edition 2024 RPITIT).
//! - **Thread-safe**: All traits require `Send + Sync` for use with Tokio.
//! - **Error-aware**: All operations return `Result<T>` with detailed error information.
//! - **Cancel-safe reads**: `TagReader::read` and `InputDevice::read_line` may
//!   be raced against each other and against timeouts.
//!
//! # Example
//!
//! ```
//! use keytag_core::TagId;
//! use keytag_hardware::mock::MockTagReader;
//! use keytag_hardware::traits::TagReader;
//!
//! #[tokio::main]
//! async fn main() -> keytag_hardware::Result<()> {
//!     let (mut reader, handle) = MockTagReader::new();
//!     reader.init().await?;
//!
//!     handle.present_tag([0x04, 0xA1, 0xB2, 0xC3]).await?;
//!     let tag = TagId::from_payload(reader.read().await?);
//!
//!     assert_eq!(tag.as_str(), "04A1B2C3");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod mock;
pub mod traits;

// Re-export commonly used types for convenience
pub use error::{Device, HardwareError, Result};
pub use traits::{DisplayDevice, InputDevice, TagReader};
