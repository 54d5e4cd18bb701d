//! Command-line argument parsing.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use keytag_core::constants::{
    DEFAULT_DISPLAY_COLUMNS, DEFAULT_DISPLAY_ROWS, DEFAULT_INPUT_TIMEOUT_MS,
    DEFAULT_MESSAGE_HOLD_MS, DEFAULT_REGISTRY_FILE, DEFAULT_STORAGE_ROOT, DEFAULT_TAG_TIMEOUT_MS,
};
use keytag_terminal::TerminalConfig;

/// Keytag access terminal emulator.
///
/// Type `tag <8 hex digits>` to present a tag. Any other line is keypad
/// input: `enroll`, `revoke` or `scan` while idle, then the name or tag id
/// the terminal asks for.
#[derive(Parser, Debug, Clone)]
#[command(name = "keytag")]
#[command(about = "Keytag access terminal emulator")]
#[command(version)]
pub struct Cli {
    /// Storage root holding the registry document.
    #[arg(long, default_value = DEFAULT_STORAGE_ROOT)]
    pub data_dir: PathBuf,

    /// Registry document name, relative to the storage root.
    #[arg(long, default_value = DEFAULT_REGISTRY_FILE)]
    pub registry_file: PathBuf,

    /// How long a prompt waits for input, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_INPUT_TIMEOUT_MS)]
    pub input_timeout_ms: u64,

    /// How long the terminal waits for a tag, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_TAG_TIMEOUT_MS)]
    pub tag_timeout_ms: u64,

    /// How long results stay on the display, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_MESSAGE_HOLD_MS)]
    pub message_hold_ms: u64,

    /// Display rows.
    #[arg(long, default_value_t = DEFAULT_DISPLAY_ROWS)]
    pub rows: usize,

    /// Display columns.
    #[arg(long, default_value_t = DEFAULT_DISPLAY_COLUMNS)]
    pub cols: usize,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Print the enrolled users and exit.
    #[arg(long)]
    pub list: bool,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Terminal configuration described by the arguments.
    pub fn terminal_config(&self) -> TerminalConfig {
        TerminalConfig::new(&self.registry_file)
            .input_timeout(Duration::from_millis(self.input_timeout_ms))
            .tag_timeout(Duration::from_millis(self.tag_timeout_ms))
            .message_hold(Duration::from_millis(self.message_hold_ms))
            .display_size(self.rows, self.cols)
    }
}
