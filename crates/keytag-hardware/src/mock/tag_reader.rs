//! Mock tag reader implementation for testing and development.
//!
//! This module provides a simulated proximity reader that can be controlled
//! programmatically for testing without requiring physical hardware.

use crate::{Device, HardwareError, Result, traits::TagReader};
use keytag_core::{TagId, TagPayload};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;

/// Mock tag reader for testing and development.
///
/// Payloads presented through the paired [`MockTagReaderHandle`] are queued
/// and returned by [`TagReader::read`] in order.
///
/// # Examples
///
/// ```
/// use keytag_hardware::mock::MockTagReader;
/// use keytag_hardware::traits::TagReader;
///
/// #[tokio::main]
/// async fn main() -> keytag_hardware::Result<()> {
///     let (mut reader, handle) = MockTagReader::new();
///     reader.init().await?;
///
///     handle.present_tag([0x04, 0xA1, 0xB2, 0xC3]).await?;
///
///     let payload = reader.read().await?;
///     assert_eq!(payload, [0x04, 0xA1, 0xB2, 0xC3]);
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockTagReader {
    /// Channel receiver for presented tags
    tag_rx: mpsc::Receiver<TagPayload>,

    /// Whether `init()` has completed
    initialized: bool,

    /// Shared switch making `init()` fail
    fail_init: Arc<AtomicBool>,
}

impl MockTagReader {
    /// Create a new mock reader and its control handle.
    pub fn new() -> (Self, MockTagReaderHandle) {
        let (tag_tx, tag_rx) = mpsc::channel(32);
        let fail_init = Arc::new(AtomicBool::new(false));

        let reader = Self {
            tag_rx,
            initialized: false,
            fail_init: fail_init.clone(),
        };

        (reader, MockTagReaderHandle { tag_tx, fail_init })
    }

    /// Check whether `init()` has completed successfully.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

impl TagReader for MockTagReader {
    async fn init(&mut self) -> Result<()> {
        if self.fail_init.load(Ordering::SeqCst) {
            return Err(HardwareError::initialization_failed(
                Device::TagReader,
                "did not acknowledge init",
            ));
        }
        self.initialized = true;
        Ok(())
    }

    async fn read(&mut self) -> Result<TagPayload> {
        self.tag_rx
            .recv()
            .await
            .ok_or_else(|| HardwareError::disconnected(Device::TagReader))
    }
}

/// Handle for controlling a mock tag reader.
///
/// Dropping every handle disconnects the reader: pending and later reads
/// fail with [`HardwareError::Disconnected`].
#[derive(Debug, Clone)]
pub struct MockTagReaderHandle {
    /// Channel sender for presented tags
    tag_tx: mpsc::Sender<TagPayload>,

    fail_init: Arc<AtomicBool>,
}

impl MockTagReaderHandle {
    /// Present a tag payload to the reader.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped.
    pub async fn present_tag(&self, payload: TagPayload) -> Result<()> {
        self.tag_tx
            .send(payload)
            .await
            .map_err(|_| HardwareError::disconnected(Device::TagReader))
    }

    /// Wait until the reader has consumed every tag presented so far.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader has been dropped.
    pub async fn wait_until_read(&self) -> Result<()> {
        self.tag_tx
            .reserve_many(self.tag_tx.max_capacity())
            .await
            .map(drop)
            .map_err(|_| HardwareError::disconnected(Device::TagReader))
    }

    /// Present the tag whose canonical id is `tag_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if `tag_id` is not a canonical 8-digit id or the
    /// reader has been dropped.
    pub async fn present_tag_id(&self, tag_id: &TagId) -> Result<()> {
        let payload = tag_id.to_payload().ok_or_else(|| {
            HardwareError::invalid_data(format!("Tag id {tag_id} has no payload form"))
        })?;
        self.present_tag(payload).await
    }

    /// Make subsequent `init()` calls fail (or succeed again).
    pub fn set_fail_init(&self, fail: bool) {
        self.fail_init.store(fail, Ordering::SeqCst);
    }
}
