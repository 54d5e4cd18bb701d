//! Recording display for testing and development.
//!
//! [`MockDisplay`] does not render anything: it records every operation so
//! tests can assert on what the core asked the display to do, and it can be
//! told to fail in order to exercise error paths.

use crate::{Device, HardwareError, Result, traits::DisplayDevice};
use std::sync::{Arc, Mutex, MutexGuard};

/// One operation received by a [`MockDisplay`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayOp {
    Clear,
    Write(String),
    SetCursor(usize, usize),
}

#[derive(Debug, Default)]
struct Shared {
    ops: Vec<DisplayOp>,
    failing: bool,
}

/// Display that records operations instead of driving hardware.
///
/// # Examples
///
/// ```
/// use keytag_hardware::mock::{DisplayOp, MockDisplay};
/// use keytag_hardware::traits::DisplayDevice;
///
/// #[tokio::main]
/// async fn main() -> keytag_hardware::Result<()> {
///     let (mut display, handle) = MockDisplay::new();
///
///     display.clear().await?;
///     display.write("Scanning").await?;
///
///     assert_eq!(
///         handle.ops(),
///         vec![DisplayOp::Clear, DisplayOp::Write("Scanning".to_string())]
///     );
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockDisplay {
    shared: Arc<Mutex<Shared>>,
}

impl MockDisplay {
    /// Create a new recording display and its inspection handle.
    pub fn new() -> (Self, MockDisplayHandle) {
        let shared = Arc::new(Mutex::new(Shared::default()));
        (
            Self {
                shared: shared.clone(),
            },
            MockDisplayHandle { shared },
        )
    }

    fn record(&self, op: DisplayOp) -> Result<()> {
        let mut shared = lock(&self.shared);
        if shared.failing {
            return Err(HardwareError::communication(Device::Display, "no acknowledge"));
        }
        shared.ops.push(op);
        Ok(())
    }
}

impl DisplayDevice for MockDisplay {
    async fn clear(&mut self) -> Result<()> {
        self.record(DisplayOp::Clear)
    }

    async fn write(&mut self, text: &str) -> Result<()> {
        self.record(DisplayOp::Write(text.to_string()))
    }

    async fn set_cursor(&mut self, row: usize, col: usize) -> Result<()> {
        self.record(DisplayOp::SetCursor(row, col))
    }
}

/// Handle for inspecting a [`MockDisplay`] after it has been moved into the
/// code under test.
#[derive(Debug, Clone)]
pub struct MockDisplayHandle {
    shared: Arc<Mutex<Shared>>,
}

impl MockDisplayHandle {
    /// All operations recorded so far, oldest first.
    pub fn ops(&self) -> Vec<DisplayOp> {
        lock(&self.shared).ops.clone()
    }

    /// Text of every `write` recorded so far, oldest first.
    pub fn writes(&self) -> Vec<String> {
        lock(&self.shared)
            .ops
            .iter()
            .filter_map(|op| match op {
                DisplayOp::Write(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Make every subsequent operation fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        lock(&self.shared).failing = failing;
    }
}

// A poisoned lock only means a test thread panicked mid-record; the log is
// still usable.
fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_display_records_operations() {
        let (mut display, handle) = MockDisplay::new();

        display.clear().await.unwrap();
        display.set_cursor(1, 0).await.unwrap();
        display.write("Access granted").await.unwrap();

        assert_eq!(
            handle.ops(),
            vec![
                DisplayOp::Clear,
                DisplayOp::SetCursor(1, 0),
                DisplayOp::Write("Access granted".to_string()),
            ]
        );
        assert_eq!(handle.writes(), vec!["Access granted".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_display_failure_injection() {
        let (mut display, handle) = MockDisplay::new();

        handle.set_failing(true);
        assert!(display.write("lost").await.is_err());

        handle.set_failing(false);
        display.write("kept").await.unwrap();

        assert_eq!(handle.writes(), vec!["kept".to_string()]);
    }
}
