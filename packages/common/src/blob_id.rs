use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Prefix marking an image that was saved to the local fallback store.
pub const LOCAL_PREFIX: &str = "idb-";

/// Identifier of a stored image.
///
/// The variant tells which backend holds the bytes. On the wire the
/// identifier keeps the historical ad-hoc forms so that records persisted by
/// older clients stay readable:
///
/// | variant  | persisted form            |
/// |----------|---------------------------|
/// | `Remote` | `https://host/bucket/key` |
/// | `Local`  | `"idb-42"`                |
/// | `Legacy` | `42` (a JSON number)      |
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum BlobId {
    /// Public URL of an object in the remote bucket.
    Remote(String),
    /// Key in the local fallback store, written after a failed upload.
    Local(i64),
    /// Bare numeric key from before the remote bucket existed.
    Legacy(i64),
}

impl BlobId {
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

impl fmt::Debug for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobId({self})")
    }
}

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(url) => f.write_str(url),
            Self::Local(key) => write!(f, "{LOCAL_PREFIX}{key}"),
            Self::Legacy(key) => write!(f, "{key}"),
        }
    }
}

/// Error returned when a string matches none of the identifier forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseBlobIdError(String);

impl fmt::Display for ParseBlobIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized image identifier: {:?}", self.0)
    }
}

impl std::error::Error for ParseBlobIdError {}

impl FromStr for BlobId {
    type Err = ParseBlobIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("http://") || s.starts_with("https://") {
            return Ok(Self::Remote(s.to_string()));
        }
        if let Some(rest) = s.strip_prefix(LOCAL_PREFIX) {
            return rest
                .parse()
                .map(Self::Local)
                .map_err(|_| ParseBlobIdError(s.to_string()));
        }
        s.parse()
            .map(Self::Legacy)
            .map_err(|_| ParseBlobIdError(s.to_string()))
    }
}

impl Serialize for BlobId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Legacy(key) => serializer.serialize_i64(*key),
            other => serializer.collect_str(other),
        }
    }
}

struct BlobIdVisitor;

impl Visitor<'_> for BlobIdVisitor {
    type Value = BlobId;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an image URL, an \"idb-<n>\" key or an integer key")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<BlobId, E> {
        Ok(BlobId::Legacy(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<BlobId, E> {
        i64::try_from(v)
            .map(BlobId::Legacy)
            .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
    }

    // Clients that stored keys as JS numbers may hand us `42.0`.
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<BlobId, E> {
        if v.fract() == 0.0 && v >= i64::MIN as f64 && v <= i64::MAX as f64 {
            Ok(BlobId::Legacy(v as i64))
        } else {
            Err(E::invalid_value(de::Unexpected::Float(v), &self))
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<BlobId, E> {
        v.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for BlobId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(BlobIdVisitor)
    }
}
