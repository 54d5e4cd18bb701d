//! Registry document codec.
//!
//! The persisted document is a JSON array of `{"name", "nfc_id"}` objects.
//! An empty (or whitespace-only) document is an empty registry.

use crate::error::{StorageError, StorageResult};
use crate::models::User;

/// Decode a registry document.
///
/// # Errors
///
/// Returns `StorageError::Decode` if the text is not a JSON array of users or
/// an entry is missing a required field.
///
/// # Examples
///
/// ```
/// use keytag_storage::codec;
///
/// let users = codec::load(r#"[{"name": "Alice", "nfc_id": "04A1B2C3"}]"#).unwrap();
/// assert_eq!(users[0].name, "Alice");
///
/// assert!(codec::load("").unwrap().is_empty());
/// ```
pub fn load(text: &str) -> StorageResult<Vec<User>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    Ok(serde_json::from_str(text)?)
}

/// Encode users as a registry document, preserving order.
///
/// # Errors
///
/// Returns `StorageError::Encode` if serialization fails.
pub fn to_text(users: &[User]) -> StorageResult<String> {
    serde_json::to_string_pretty(users).map_err(|e| StorageError::Encode(e.to_string()))
}
