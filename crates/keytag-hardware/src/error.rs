//! Error types for the terminal peripherals.

use std::fmt;

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Peripheral an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Device {
    Display,
    TagReader,
    Input,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Device::Display => "display",
            Device::TagReader => "tag reader",
            Device::Input => "input",
        };
        f.write_str(name)
    }
}

/// Errors raised by display, tag reader and input devices.
///
/// The controller treats reader and input errors as device faults (the
/// terminal returns to idle) and display errors as non-fatal.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// The device is gone; later calls will fail the same way.
    #[error("{device} disconnected")]
    Disconnected { device: Device },

    /// The device did not answer or answered garbage.
    #[error("{device} not responding: {message}")]
    Communication { device: Device, message: String },

    /// A request or a reading was malformed.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// `init()` failed.
    #[error("{device} failed to initialize: {message}")]
    InitializationFailed { device: Device, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HardwareError {
    pub fn disconnected(device: Device) -> Self {
        Self::Disconnected { device }
    }

    pub fn communication(device: Device, message: impl Into<String>) -> Self {
        Self::Communication {
            device,
            message: message.into(),
        }
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    pub fn initialization_failed(device: Device, message: impl Into<String>) -> Self {
        Self::InitializationFailed {
            device,
            message: message.into(),
        }
    }

    /// Whether the device is permanently gone.
    pub fn is_disconnected(&self) -> bool {
        matches!(self, Self::Disconnected { .. })
    }
}

impl From<keytag_core::Error> for HardwareError {
    fn from(error: keytag_core::Error) -> Self {
        Self::invalid_data(error.to_string())
    }
}
