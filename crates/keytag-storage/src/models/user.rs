use keytag_core::TagId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// User entity representing one enrolled credential
///
/// This model matches one object of the persisted registry document. The
/// tag id is stored under the `nfc_id` key so documents written by earlier
/// firmware load unchanged.
///
/// # Fields
///
/// * `name` - Human-readable label, non-empty
/// * `tag_id` - Canonical id of the enrolled tag (unique in a registry)
///
/// # Examples
///
/// ```
/// use keytag_core::TagId;
/// use keytag_storage::models::User;
///
/// let user = User::new("Alice", TagId::parse("04A1B2C3").unwrap());
/// let json = serde_json::to_string(&user).unwrap();
///
/// assert_eq!(json, r#"{"name":"Alice","nfc_id":"04A1B2C3"}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Human-readable label
    pub name: String,

    /// Enrolled tag id
    #[serde(rename = "nfc_id")]
    pub tag_id: TagId,
}

impl User {
    /// Create a new user record
    pub fn new(name: impl Into<String>, tag_id: TagId) -> Self {
        Self {
            name: name.into(),
            tag_id,
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name: {}, NFC ID: {}", self.name, self.tag_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_deserializes_legacy_shape() {
        let user: User = serde_json::from_str(r#"{"name": "Bob", "nfc_id": "04D4E5F6"}"#).unwrap();

        assert_eq!(user.name, "Bob");
        assert_eq!(user.tag_id, TagId::parse("04D4E5F6").unwrap());
    }

    #[test]
    fn test_user_missing_field_is_rejected() {
        assert!(serde_json::from_str::<User>(r#"{"name": "Bob"}"#).is_err());
        assert!(serde_json::from_str::<User>(r#"{"nfc_id": "04D4E5F6"}"#).is_err());
    }

    #[test]
    fn test_user_display() {
        let user = User::new("Alice", TagId::parse("04A1B2C3").unwrap());
        assert_eq!(user.to_string(), "Name: Alice, NFC ID: 04A1B2C3");
    }
}
