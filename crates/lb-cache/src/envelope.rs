//! Serialized cache envelopes.
//!
//! An entry is stored as one bincode blob holding the content type and the
//! body, so a backend only ever sees opaque bytes and a reader gets either
//! the whole pair or nothing.

use bytes::Bytes;
use lb_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// A cached response: its content type and body, byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub content_type: String,
    pub body: Bytes,
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    content_type: String,
    body: Vec<u8>,
}

impl CacheEntry {
    pub fn new(content_type: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            content_type: content_type.into(),
            body: body.into(),
        }
    }

    /// Serialize for storage.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let envelope = Envelope {
            content_type: self.content_type.clone(),
            body: self.body.to_vec(),
        };
        bincode::serialize(&envelope).map_err(|e| Error::cache(format!("envelope encode: {e}")))
    }

    /// Deserialize a stored envelope.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let envelope: Envelope = bincode::deserialize(data)
            .map_err(|e| Error::cache(format!("envelope decode: {e}")))?;
        Ok(Self {
            content_type: envelope.content_type,
            body: Bytes::from(envelope.body),
        })
    }
}
