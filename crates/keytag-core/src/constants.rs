//! Core constants for the keytag access terminal.
//!
//! Timing defaults are expressed in milliseconds so they can be passed to
//! `Duration::from_millis` or exposed directly as command-line defaults.
//!
//! # Usage
//!
//! ```
//! use keytag_core::constants::*;
//! use std::time::Duration;
//!
//! assert_eq!(TAG_PAYLOAD_LENGTH * 2, TAG_ID_LENGTH);
//!
//! let timeout = Duration::from_millis(DEFAULT_TAG_TIMEOUT_MS);
//! assert!(timeout.as_secs() > 0);
//! ```

// ============================================================================
// Tag Format
// ============================================================================

/// Number of bytes returned by a single tag read.
pub const TAG_PAYLOAD_LENGTH: usize = 4;

/// Length of the canonical tag id (two hex digits per payload byte).
pub const TAG_ID_LENGTH: usize = TAG_PAYLOAD_LENGTH * 2;

// ============================================================================
// Timing
// ============================================================================

/// How long the terminal waits for keypad input before returning to idle.
pub const DEFAULT_INPUT_TIMEOUT_MS: u64 = 15_000;

/// How long the terminal waits for a tag before returning to idle.
pub const DEFAULT_TAG_TIMEOUT_MS: u64 = 10_000;

/// How long a result message stays on the display.
pub const DEFAULT_MESSAGE_HOLD_MS: u64 = 2_000;

/// Pause after a device fault before the next loop iteration.
pub const DEFAULT_FAULT_BACKOFF_MS: u64 = 1_000;

// ============================================================================
// Display
// ============================================================================

/// Rows on the character LCD (HD44780 16x2 module).
pub const DEFAULT_DISPLAY_ROWS: usize = 2;

/// Columns on the character LCD (HD44780 16x2 module).
pub const DEFAULT_DISPLAY_COLUMNS: usize = 16;

// ============================================================================
// Storage
// ============================================================================

/// Mount point of the flash filesystem.
pub const DEFAULT_STORAGE_ROOT: &str = "spiffs";

/// Registry document name, relative to the storage root.
pub const DEFAULT_REGISTRY_FILE: &str = "users.json";
