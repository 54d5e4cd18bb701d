//! Mock keypad/button input for testing and development.

use crate::{Device, HardwareError, Result, traits::InputDevice};
use tokio::sync::mpsc;

/// Mock input device fed by a [`MockInputHandle`].
///
/// # Examples
///
/// ```
/// use keytag_hardware::mock::MockInput;
/// use keytag_hardware::traits::InputDevice;
///
/// #[tokio::main]
/// async fn main() -> keytag_hardware::Result<()> {
///     let (mut input, handle) = MockInput::new();
///
///     handle.send_line("enroll").await?;
///     assert_eq!(input.read_line().await?, "enroll");
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockInput {
    /// Channel receiver for simulated lines
    line_rx: mpsc::Receiver<String>,
}

impl MockInput {
    /// Create a new mock input device and its control handle.
    pub fn new() -> (Self, MockInputHandle) {
        let (line_tx, line_rx) = mpsc::channel(32);
        (Self { line_rx }, MockInputHandle { line_tx })
    }
}

impl InputDevice for MockInput {
    async fn read_line(&mut self) -> Result<String> {
        self.line_rx
            .recv()
            .await
            .ok_or_else(|| HardwareError::disconnected(Device::Input))
    }
}

/// Handle for sending lines to a [`MockInput`]. It can be cloned and shared
/// across tasks.
#[derive(Debug, Clone)]
pub struct MockInputHandle {
    line_tx: mpsc::Sender<String>,
}

impl MockInputHandle {
    /// Send one line of input.
    ///
    /// # Errors
    ///
    /// Returns an error if the input device has been dropped.
    pub async fn send_line(&self, line: impl Into<String>) -> Result<()> {
        self.line_tx
            .send(line.into())
            .await
            .map_err(|_| HardwareError::disconnected(Device::Input))
    }

    /// Wait until the device has read every line sent so far.
    ///
    /// # Errors
    ///
    /// Returns an error if the input device has been dropped.
    pub async fn wait_until_read(&self) -> Result<()> {
        self.line_tx
            .reserve_many(self.line_tx.max_capacity())
            .await
            .map(drop)
            .map_err(|_| HardwareError::disconnected(Device::Input))
    }
}
