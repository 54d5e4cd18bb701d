//! Terminal configuration.

use std::path::PathBuf;
use std::time::Duration;

use keytag_core::constants::{
    DEFAULT_DISPLAY_COLUMNS, DEFAULT_DISPLAY_ROWS, DEFAULT_FAULT_BACKOFF_MS,
    DEFAULT_INPUT_TIMEOUT_MS, DEFAULT_MESSAGE_HOLD_MS, DEFAULT_REGISTRY_FILE,
    DEFAULT_TAG_TIMEOUT_MS,
};
use keytag_core::{Error, Result};

/// Timing and layout settings for a [`StateController`](crate::StateController).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use keytag_terminal::TerminalConfig;
///
/// let config = TerminalConfig::new("users.json")
///     .tag_timeout(Duration::from_secs(5))
///     .display_size(4, 20);
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.display_columns, 20);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalConfig {
    /// Registry document path, relative to the storage root
    pub registry_path: PathBuf,

    /// How long a prompt waits for a line of input
    pub input_timeout: Duration,

    /// How long the terminal waits for a tag
    pub tag_timeout: Duration,

    /// How long a result stays on the display
    pub message_hold: Duration,

    /// Pause after a device fault
    pub fault_backoff: Duration,

    /// Rows on the display
    pub display_rows: usize,

    /// Columns on the display
    pub display_columns: usize,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            registry_path: PathBuf::from(DEFAULT_REGISTRY_FILE),
            input_timeout: Duration::from_millis(DEFAULT_INPUT_TIMEOUT_MS),
            tag_timeout: Duration::from_millis(DEFAULT_TAG_TIMEOUT_MS),
            message_hold: Duration::from_millis(DEFAULT_MESSAGE_HOLD_MS),
            fault_backoff: Duration::from_millis(DEFAULT_FAULT_BACKOFF_MS),
            display_rows: DEFAULT_DISPLAY_ROWS,
            display_columns: DEFAULT_DISPLAY_COLUMNS,
        }
    }
}

impl TerminalConfig {
    /// Create a configuration with the given registry path
    pub fn new(registry_path: impl Into<PathBuf>) -> Self {
        Self {
            registry_path: registry_path.into(),
            ..Default::default()
        }
    }

    /// Set the input prompt timeout
    pub fn input_timeout(mut self, timeout: Duration) -> Self {
        self.input_timeout = timeout;
        self
    }

    /// Set the tag wait timeout
    pub fn tag_timeout(mut self, timeout: Duration) -> Self {
        self.tag_timeout = timeout;
        self
    }

    /// Set how long results stay on the display
    pub fn message_hold(mut self, hold: Duration) -> Self {
        self.message_hold = hold;
        self
    }

    /// Set the pause after a device fault
    pub fn fault_backoff(mut self, backoff: Duration) -> Self {
        self.fault_backoff = backoff;
        self
    }

    /// Set the display size
    pub fn display_size(mut self, rows: usize, columns: usize) -> Self {
        self.display_rows = rows;
        self.display_columns = columns;
        self
    }

    /// Check that every setting is usable.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if a timeout is zero, the display has
    /// no cells, or the registry path is empty.
    pub fn validate(&self) -> Result<()> {
        if self.registry_path.as_os_str().is_empty() {
            return Err(Error::InvalidConfig("registry path is empty".to_string()));
        }

        for (name, value) in [
            ("input_timeout", self.input_timeout),
            ("tag_timeout", self.tag_timeout),
        ] {
            if value.is_zero() {
                return Err(Error::InvalidConfig(format!("{name} must be non-zero")));
            }
        }

        if self.display_rows == 0 || self.display_columns == 0 {
            return Err(Error::InvalidConfig(format!(
                "display must have at least one cell, got {}x{}",
                self.display_rows, self.display_columns
            )));
        }

        Ok(())
    }
}
