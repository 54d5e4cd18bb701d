use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Credential errors
    #[error("Invalid tag id: {0}")]
    InvalidTagId(String),

    // State machine errors
    #[error("Invalid state transition from {from} on {event}")]
    InvalidStateTransition { from: String, event: String },

    // Display errors
    #[error("Invalid display line {line} (max {max})")]
    InvalidLine { line: usize, max: usize },

    // Configuration errors
    #[error("Configuration error: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            Error::InvalidTagId("XYZ".to_string()).to_string(),
            "Invalid tag id: XYZ"
        );
        assert_eq!(
            Error::InvalidStateTransition {
                from: "Idle".to_string(),
                event: "Timeout".to_string(),
            }
            .to_string(),
            "Invalid state transition from Idle on Timeout"
        );
        assert_eq!(
            Error::InvalidLine { line: 3, max: 1 }.to_string(),
            "Invalid display line 3 (max 1)"
        );
    }
}
