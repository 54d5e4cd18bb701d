use crate::{
    Result,
    constants::{TAG_ID_LENGTH, TAG_PAYLOAD_LENGTH},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// Raw payload returned by a single tag read.
pub type TagPayload = [u8; TAG_PAYLOAD_LENGTH];

/// Canonical tag identifier (8 uppercase hex digits).
///
/// Ids built from a reader payload or from typed input are always canonical.
/// Ids decoded from a persisted document are kept verbatim, so registries
/// written by older firmware keep working unchanged.
///
/// # Security
/// This type implements constant-time comparison so that lookups do not leak
/// how many leading characters of a presented tag matched an enrolled one.
///
/// # Examples
///
/// ```
/// use keytag_core::TagId;
///
/// let tag = TagId::from_payload([0x04, 0xA1, 0xB2, 0xC3]);
/// assert_eq!(tag.as_str(), "04A1B2C3");
///
/// let typed: TagId = " 04a1b2c3 ".parse().unwrap();
/// assert_eq!(typed, tag);
/// ```
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagId(String);

impl TagId {
    /// Build the canonical id for a reader payload.
    #[must_use]
    pub fn from_payload(payload: TagPayload) -> Self {
        TagId(payload.iter().map(|b| format!("{b:02X}")).collect())
    }

    /// Parse a typed tag id.
    ///
    /// The input is normalized (trimmed and converted to uppercase) before
    /// validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidTagId` if the normalized text is not exactly
    /// 8 hexadecimal digits.
    pub fn parse(text: &str) -> Result<Self> {
        let normalized = text.trim().to_ascii_uppercase();

        if normalized.len() != TAG_ID_LENGTH {
            return Err(Error::InvalidTagId(format!(
                "Tag id must be {TAG_ID_LENGTH} hex digits, got {:?}",
                text.trim()
            )));
        }

        if !normalized.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidTagId(format!(
                "Tag id must be hexadecimal, got {:?}",
                text.trim()
            )));
        }

        Ok(TagId(normalized))
    }

    /// Get the tag id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the id back into a reader payload, if it is canonical.
    #[must_use]
    pub fn to_payload(&self) -> Option<TagPayload> {
        if self.0.len() != TAG_ID_LENGTH {
            return None;
        }

        let mut payload = [0u8; TAG_PAYLOAD_LENGTH];
        for (i, byte) in payload.iter_mut().enumerate() {
            *byte = u8::from_str_radix(self.0.get(i * 2..i * 2 + 2)?, 16).ok()?;
        }
        Some(payload)
    }
}

impl From<TagPayload> for TagId {
    fn from(payload: TagPayload) -> Self {
        TagId::from_payload(payload)
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TagId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        TagId::parse(s)
    }
}

/// Constant-time comparison implementation for TagId
impl PartialEq for TagId {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl std::hash::Hash for TagId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case([0x04, 0xA1, 0xB2, 0xC3], "04A1B2C3")]
    #[case([0x00, 0x00, 0x00, 0x00], "00000000")]
    #[case([0xFF, 0x10, 0x0A, 0x01], "FF100A01")]
    fn test_tag_id_from_payload(#[case] payload: TagPayload, #[case] expected: &str) {
        assert_eq!(TagId::from_payload(payload).as_str(), expected);
    }

    #[rstest]
    #[case("04A1B2C3", "04A1B2C3")]
    #[case("04a1b2c3", "04A1B2C3")]
    #[case("  04D4E5F6\n", "04D4E5F6")]
    fn test_tag_id_parse_valid(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(TagId::parse(input).unwrap().as_str(), expected);
    }

    #[rstest]
    #[case("")] // empty
    #[case("04A1B2")] // too short
    #[case("04A1B2C3D4")] // too long
    #[case("04A1B2CG")] // non-hex
    #[case("04A1 2C3")] // inner whitespace
    fn test_tag_id_parse_invalid(#[case] input: &str) {
        assert!(matches!(TagId::parse(input), Err(Error::InvalidTagId(_))));
    }

    #[test]
    fn test_tag_id_payload_round_trip() {
        let payload = [0x04, 0xD4, 0xE5, 0xF6];
        assert_eq!(TagId::from_payload(payload).to_payload(), Some(payload));
    }

    #[test]
    fn test_tag_id_legacy_value_has_no_payload() {
        let legacy: TagId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(legacy.as_str(), "abc");
        assert_eq!(legacy.to_payload(), None);
    }

    #[test]
    fn test_tag_id_equality_is_exact() {
        let a = TagId::parse("04A1B2C3").unwrap();
        let b = TagId::from_payload([0x04, 0xA1, 0xB2, 0xC3]);
        let c = TagId::from_payload([0x04, 0xA1, 0xB2, 0xC4]);

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_tag_id_serializes_as_plain_string() {
        let tag = TagId::parse("04A1B2C3").unwrap();
        assert_eq!(serde_json::to_string(&tag).unwrap(), "\"04A1B2C3\"");
    }
}
