//! Storage layer for the keytag access terminal.
//!
//! This crate persists the set of enrolled users as a single JSON document
//! on a storage mount (the on-board flash filesystem on the device, a
//! directory on a host).
//!
//! # Architecture
//!
//! - [`Storage`] - whole-document read/replace over a mount
//!   ([`FileStorage`] for directories, [`MemoryStorage`] for tests)
//! - [`codec`] - the document format: a JSON array of
//!   `{"name": ..., "nfc_id": ...}` objects in insertion order
//! - [`UserRegistry`] - in-memory user list mirrored to the document after
//!   every mutation, rolled back when the write fails
//!
//! # Examples
//!
//! ```no_run
//! use keytag_core::TagId;
//! use keytag_storage::{FileStorage, UserRegistry};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut registry = UserRegistry::open(FileStorage::new("/spiffs"), "users.json")?;
//!
//! registry.add("Alice", TagId::parse("04A1B2C3")?)?;
//!
//! for user in registry.list() {
//!     println!("{user}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod error;
pub mod models;
pub mod mount;
pub mod registry;

pub use error::{StorageError, StorageResult};
pub use models::User;
pub use mount::{FileStorage, MemoryStorage, Storage};
pub use registry::UserRegistry;
