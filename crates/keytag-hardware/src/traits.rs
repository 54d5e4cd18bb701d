//! Hardware device trait definitions.
//!
//! This module defines the contract between the terminal core and its three
//! peripherals: the character display, the proximity tag reader and the
//! keypad/button input. Mock implementations live in [`crate::mock`].
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use keytag_core::TagPayload;

use crate::error::Result;

/// Character display abstraction.
///
/// The core treats the display as an opaque status sink: it clears it,
/// positions the cursor and writes text. How bytes reach the controller
/// (4-bit I2C backpack, parallel bus, ...) is up to the implementation.
///
/// # Object Safety
///
/// This trait is NOT object-safe because `async fn` methods return
/// `impl Future`. Use generic type parameters:
///
/// ```no_run
/// use keytag_hardware::traits::DisplayDevice;
/// use keytag_hardware::error::Result;
///
/// async fn banner<D: DisplayDevice>(display: &mut D) -> Result<()> {
///     display.clear().await?;
///     display.set_cursor(0, 0).await?;
///     display.write("Waiting for tag").await
/// }
/// ```
pub trait DisplayDevice: Send + Sync {
    /// Clear every row and move the cursor home.
    ///
    /// # Errors
    ///
    /// Returns an error if the display cannot be reached.
    async fn clear(&mut self) -> Result<()>;

    /// Write text at the current cursor position.
    ///
    /// Text past the end of the row is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the display cannot be reached.
    async fn write(&mut self, text: &str) -> Result<()>;

    /// Move the cursor to `row`, `col` (both 0-based).
    ///
    /// # Errors
    ///
    /// Returns an error if the position is outside the display or the
    /// display cannot be reached.
    async fn set_cursor(&mut self, row: usize, col: usize) -> Result<()>;
}

/// Proximity tag reader abstraction.
///
/// # Examples
///
/// ```no_run
/// use keytag_core::TagId;
/// use keytag_hardware::traits::TagReader;
/// use keytag_hardware::error::Result;
///
/// async fn scan<R: TagReader>(reader: &mut R) -> Result<TagId> {
///     let payload = reader.read().await?;
///     Ok(TagId::from_payload(payload))
/// }
/// ```
pub trait TagReader: Send + Sync {
    /// Prepare the reader for use.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader does not respond.
    async fn init(&mut self) -> Result<()>;

    /// Wait for a tag and return its 4-byte payload.
    ///
    /// This method blocks asynchronously until a tag is presented. Callers
    /// bound the wait with a timeout; the future must be cancel-safe.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The device is disconnected
    /// - A communication error occurs
    async fn read(&mut self) -> Result<TagPayload>;
}

/// Keypad/button input abstraction.
///
/// Physical input is abstracted as free-form text lines: a command word
/// while idle, a user name or a tag id when prompted.
pub trait InputDevice: Send + Sync {
    /// Wait for the next complete line of input.
    ///
    /// The future must be cancel-safe; callers bound the wait with a timeout
    /// and may race it against the tag reader.
    ///
    /// # Errors
    ///
    /// Returns an error if the input source is closed or unreadable.
    async fn read_line(&mut self) -> Result<String>;
}
