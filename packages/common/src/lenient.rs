//! Field deserializers that tolerate records written by older or sloppier
//! clients, so one bad value never costs the surrounding record set.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};
use tracing::warn;

use crate::blob_id::BlobId;

#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    Valid(T),
    Invalid(IgnoredAny),
}

/// `null` reads as the type's default.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::deserialize(deserializer)?.unwrap_or_default())
}

/// An image reference matching none of the identifier forms reads as absent.
pub fn image_id<'de, D>(deserializer: D) -> Result<Option<BlobId>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Lenient<BlobId>>::deserialize(deserializer)? {
        Some(Lenient::Valid(id)) => Ok(Some(id)),
        Some(Lenient::Invalid(_)) => {
            warn!("Ignoring malformed image reference");
            Ok(None)
        }
        None => Ok(None),
    }
}

/// Elements that fail to deserialize are dropped with a warning.
pub fn skip_invalid<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items: Option<Vec<Lenient<T>>> = Option::deserialize(deserializer)?;
    let items = items.unwrap_or_default();
    let total = items.len();
    let kept: Vec<T> = items
        .into_iter()
        .filter_map(|item| match item {
            Lenient::Valid(value) => Some(value),
            Lenient::Invalid(_) => None,
        })
        .collect();
    if kept.len() < total {
        warn!(dropped = total - kept.len(), "Skipping unreadable records");
    }
    Ok(kept)
}
