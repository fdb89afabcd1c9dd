use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Identifier of an immutable object: the 32-byte digest of its canonical
/// content.
///
/// Equality is identity. The all-zero value is reserved as [`ObjectId::NULL`]
/// and never names a stored object. Ids serialize as lowercase hex strings so
/// that they read the same in canonical object payloads and on the wire.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; ObjectId::LEN]);

impl ObjectId {
    /// Digest length in bytes.
    pub const LEN: usize = 32;

    /// Length of the hex form.
    pub const HEX_LEN: usize = Self::LEN * 2;

    /// The reserved "no object" id.
    pub const NULL: ObjectId = ObjectId([0u8; Self::LEN]);

    /// Wrap a digest computed elsewhere.
    pub const fn from_hash(hash: [u8; Self::LEN]) -> Self {
        Self(hash)
    }

    /// Build an id from a raw byte slice, as found at the head of an object
    /// upload body.
    pub fn from_raw(bytes: &[u8]) -> Result<Self, TypeError> {
        let arr: [u8; Self::LEN] = bytes.try_into().map_err(|_| TypeError::InvalidLength {
            expected: Self::LEN,
            actual: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    pub fn is_null(&self) -> bool {
        self.0 == [0u8; Self::LEN]
    }

    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 8 hex characters, for logs.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        if s.len() != Self::HEX_LEN {
            return Err(TypeError::InvalidLength {
                expected: Self::HEX_LEN,
                actual: s.len(),
            });
        }
        let mut arr = [0u8; Self::LEN];
        hex::decode_to_slice(s, &mut arr).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Ok(Self(arr))
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.short_hex())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s.trim())
    }
}

impl From<[u8; ObjectId::LEN]> for ObjectId {
    fn from(bytes: [u8; ObjectId::LEN]) -> Self {
        Self(bytes)
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct HexVisitor;

        impl Visitor<'_> for HexVisitor {
            type Value = ObjectId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a {}-character hex object id", ObjectId::HEX_LEN)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<ObjectId, E> {
                ObjectId::from_hex(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_str(HexVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn null_is_reserved() {
        assert!(ObjectId::NULL.is_null());
        assert!(ObjectId::default().is_null());
        assert!(!ObjectId::from_hash([7; 32]).is_null());
    }

    #[test]
    fn display_is_full_hex_and_debug_is_short() {
        let id = ObjectId::from_hash([0xab; 32]);
        assert_eq!(format!("{id}"), "ab".repeat(32));
        assert_eq!(format!("{id:?}"), "ObjectId(abababab)");
    }

    #[test]
    fn from_hex_rejects_bad_input() {
        assert_eq!(
            ObjectId::from_hex("abcd"),
            Err(TypeError::InvalidLength { expected: 64, actual: 4 })
        );
        let not_hex = "zz".repeat(32);
        assert!(matches!(
            ObjectId::from_hex(&not_hex),
            Err(TypeError::InvalidHex(_))
        ));
    }

    #[test]
    fn from_str_tolerates_trailing_newline() {
        let id = ObjectId::from_hash([3; 32]);
        let parsed: ObjectId = format!("{id}\n").parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn from_raw_checks_length() {
        assert!(ObjectId::from_raw(&[1u8; 31]).is_err());
        assert_eq!(
            ObjectId::from_raw(&[1u8; 32]).unwrap(),
            ObjectId::from_hash([1; 32])
        );
    }

    #[test]
    fn serializes_as_hex_string() {
        let id = ObjectId::from_hash([0x10; 32]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", "10".repeat(32)));
        let back: ObjectId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<ObjectId>("\"10\"").is_err());
    }

    proptest! {
        #[test]
        fn hex_form_parses_back(bytes in proptest::array::uniform32(any::<u8>())) {
            let id = ObjectId::from_hash(bytes);
            prop_assert_eq!(ObjectId::from_hex(&id.to_hex()).unwrap(), id);
        }
    }
}
