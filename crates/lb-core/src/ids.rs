//! Image identifiers and the generators that mint them.
//!
//! Ids are opaque UUID newtypes. Generation is behind [`IdGenerator`] so that
//! tests can script predictable ids while production uses random v4 UUIDs.

use std::collections::VecDeque;
use std::str::FromStr;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

/// Unique identifier for an uploaded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(Uuid);

impl ImageId {
    /// Generate a new random image ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ImageId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ImageId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<ImageId> for Uuid {
    fn from(id: ImageId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ImageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ImageId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| Error::Validation(format!("invalid image id: {s}")))
    }
}

/// Source of fresh image identifiers.
pub trait IdGenerator: Send + Sync {
    /// Return an id that has never been handed out before.
    fn next_id(&self) -> ImageId;
}

/// Default generator: random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> ImageId {
        ImageId::new()
    }
}

/// Generator that yields a scripted sequence, then falls back to random ids.
#[derive(Debug, Default)]
pub struct FixedIds {
    queue: Mutex<VecDeque<ImageId>>,
}

impl FixedIds {
    /// Create a generator that hands out `ids` in order.
    pub fn new(ids: impl IntoIterator<Item = ImageId>) -> Self {
        Self {
            queue: Mutex::new(ids.into_iter().collect()),
        }
    }
}

impl IdGenerator for FixedIds {
    fn next_id(&self) -> ImageId {
        self.queue.lock().pop_front().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_id_creation() {
        let id1 = ImageId::new();
        let id2 = ImageId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_image_id_parse_round_trip() {
        let id = ImageId::new();
        let parsed: ImageId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_image_id_parse_rejects_garbage() {
        let err = "not-a-uuid".parse::<ImageId>().unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_image_id_serializes_transparently() {
        let uuid = Uuid::parse_str("36562622-48e5-4a61-be67-e426b11821ed").unwrap();
        let json = serde_json::to_string(&ImageId::from(uuid)).unwrap();
        assert_eq!(json, "\"36562622-48e5-4a61-be67-e426b11821ed\"");
    }

    #[test]
    fn test_fixed_ids_then_random() {
        let a = ImageId::new();
        let b = ImageId::new();
        let ids = FixedIds::new([a, b]);

        assert_eq!(ids.next_id(), a);
        assert_eq!(ids.next_id(), b);

        let fallback = ids.next_id();
        assert_ne!(fallback, a);
        assert_ne!(fallback, b);
    }
}
