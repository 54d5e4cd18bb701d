//! Display messages shown by the terminal.
//!
//! Every message fits one row of the 16-column LCD and is plain ASCII.
//!
//! # Usage
//!
//! ```
//! use keytag_terminal::messages::{DisplayMessages, Screen};
//!
//! let screen = Screen::new(DisplayMessages::ACCESS_GRANTED, "Alice");
//! assert_eq!(screen.headline, "Access granted");
//! ```

use crate::state_machine::{Notice, PendingCommand, TerminalState};

/// Text constants for every screen the terminal shows.
pub struct DisplayMessages;

impl DisplayMessages {
    // Prompts shown when a state is entered

    /// Idle, waiting for a tag or a command
    pub const WAITING_FOR_TAG: &'static str = "Waiting for tag";

    /// Enrollment started, waiting for the user name
    pub const ENTER_NAME: &'static str = "Enter name";

    /// Revocation started, waiting for a typed tag id (blank to scan)
    pub const ENTER_TAG_ID: &'static str = "Enter tag id";

    /// Hint shown under [`Self::ENTER_TAG_ID`]
    pub const BLANK_TO_SCAN: &'static str = "Blank to scan";

    /// Waiting for a tag to look up
    pub const SCANNING: &'static str = "Scanning";

    /// Waiting for the tag of a user being enrolled
    pub const ENROLLING: &'static str = "Enrolling";

    /// Hint shown while a tag is expected
    pub const PRESENT_TAG: &'static str = "Present tag";

    /// Waiting for (or applying) a revocation
    pub const REVOKING: &'static str = "Revoking";

    // Results of registry operations

    /// Tag belongs to an enrolled user
    pub const ACCESS_GRANTED: &'static str = "Access granted";

    /// Tag is not enrolled
    pub const UNKNOWN_TAG: &'static str = "Unknown tag";

    /// Enrollment persisted
    pub const USER_ADDED: &'static str = "User added";

    /// Enrollment rejected, the tag is enrolled to someone else
    pub const TAG_IN_USE: &'static str = "Tag in use";

    /// Enrollment rejected, the name is blank
    pub const INVALID_NAME: &'static str = "Invalid name";

    /// Typed tag id is not 8 hex digits
    pub const INVALID_TAG_ID: &'static str = "Invalid tag id";

    /// The registry document could not be written
    pub const STORAGE_ERROR: &'static str = "Storage error";

    /// Revocation persisted
    pub const USER_REMOVED: &'static str = "User removed";

    /// Revocation of a tag that is not enrolled
    pub const NOT_ENROLLED: &'static str = "Not enrolled";

    /// No event arrived in time
    pub const TIMED_OUT: &'static str = "Timed out";

    /// The reader or input device failed
    pub const READER_ERROR: &'static str = "Reader error";
}

/// Two-row screen content: a headline on row 0 and a detail on row 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pub headline: String,
    pub detail: String,
}

impl Screen {
    pub fn new(headline: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            headline: headline.into(),
            detail: detail.into(),
        }
    }

    /// Screen with an empty detail row
    pub fn headline(headline: impl Into<String>) -> Self {
        Self::new(headline, "")
    }

    /// Prompt shown when `state` is entered.
    pub fn for_state(state: &TerminalState) -> Self {
        match state {
            TerminalState::Idle => Self::headline(DisplayMessages::WAITING_FOR_TAG),
            TerminalState::AwaitingUserInput {
                command: PendingCommand::Enroll,
            } => Self::headline(DisplayMessages::ENTER_NAME),
            TerminalState::AwaitingUserInput {
                command: PendingCommand::Revoke,
            } => Self::new(DisplayMessages::ENTER_TAG_ID, DisplayMessages::BLANK_TO_SCAN),
            TerminalState::AwaitingTag { .. } => Self::headline(DisplayMessages::SCANNING),
            TerminalState::CreatingUser { .. } => {
                Self::new(DisplayMessages::ENROLLING, DisplayMessages::PRESENT_TAG)
            }
            TerminalState::DeletingUser { tag_id: None } => {
                Self::new(DisplayMessages::REVOKING, DisplayMessages::PRESENT_TAG)
            }
            TerminalState::DeletingUser { tag_id: Some(_) } => {
                Self::headline(DisplayMessages::REVOKING)
            }
        }
    }

    /// Screen for a notice produced by a transition.
    pub fn for_notice(notice: Notice) -> Self {
        let headline = match notice {
            Notice::TimedOut => DisplayMessages::TIMED_OUT,
            Notice::ReaderError => DisplayMessages::READER_ERROR,
            Notice::InvalidName => DisplayMessages::INVALID_NAME,
            Notice::InvalidTagId => DisplayMessages::INVALID_TAG_ID,
        };
        Self::headline(headline)
    }
}
