//! Image store: metadata index plus ingest and thumbnail orchestration.
//!
//! The store is the only writer of the in-memory index. A record becomes
//! visible through [`ImageStore::get`] and [`ImageStore::list`] only after
//! its canonical bytes have been written to blob storage.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use lb_core::config::Config;
use lb_core::{paths, Clock, Error, ImageFormat, ImageId, Result};
use parking_lot::RwLock;
use serde::Serialize;

use crate::blob::BlobStorage;
use crate::codec::Codec;
use crate::policy::{self, ThumbnailSpec};
use crate::workers::WorkerPool;

/// Metadata for one ingested image.
///
/// Immutable once created; the only lifecycle changes are creation and
/// deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRecord {
    pub id: ImageId,
    /// Width of the canonical encoded image.
    pub width: u32,
    /// Height of the canonical encoded image.
    pub height: u32,
    /// Set once at ingest.
    pub modified: DateTime<Utc>,
    /// Format of the stored bytes.
    pub format: ImageFormat,
}

impl ImageRecord {
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// URI of the canonical original.
    pub fn uri(&self) -> String {
        paths::image_uri(&self.id, self.format.extension())
    }

    /// Key of the encoded bytes in blob storage.
    pub fn blob_key(&self) -> &ImageId {
        &self.id
    }
}

/// Tunables the store needs from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreSettings {
    /// Canonical format uploads are re-encoded to.
    pub format: ImageFormat,
    /// Thumbnail edge floor fed to [`policy::derive`].
    pub min_thumb_size: u32,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            format: ImageFormat::Jpeg,
            min_thumb_size: 64,
        }
    }
}

impl From<&Config> for StoreSettings {
    fn from(config: &Config) -> Self {
        Self {
            format: config.images.format,
            min_thumb_size: config.images.min_thumb_size,
        }
    }
}

#[derive(Default)]
struct Index {
    /// Record plus its insertion sequence number, for stable ordering.
    records: HashMap<ImageId, (u64, ImageRecord)>,
    /// Ids with a save in flight; claimed before the pipeline runs.
    pending: HashSet<ImageId>,
    next_seq: u64,
}

/// Claim on an id for the duration of one save. Dropping it releases the
/// id whether the save succeeded, failed, or panicked.
struct Reservation<'a> {
    index: &'a RwLock<Index>,
    id: ImageId,
}

impl<'a> Reservation<'a> {
    fn claim(index: &'a RwLock<Index>, id: ImageId) -> Result<Self> {
        let mut guard = index.write();
        if guard.records.contains_key(&id) || !guard.pending.insert(id) {
            return Err(Error::Validation(format!("image id already in use: {id}")));
        }
        Ok(Self { index, id })
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        self.index.write().pending.remove(&self.id);
    }
}

struct StoreInner {
    settings: StoreSettings,
    codec: Arc<dyn Codec>,
    blobs: Arc<dyn BlobStorage>,
    workers: WorkerPool,
    clock: Arc<dyn Clock>,
    index: RwLock<Index>,
}

/// Owns image metadata and orchestrates ingest and thumbnail generation.
///
/// Cheap to clone; all clones share one index.
#[derive(Clone)]
pub struct ImageStore {
    inner: Arc<StoreInner>,
}

impl ImageStore {
    pub fn new(
        settings: StoreSettings,
        codec: Arc<dyn Codec>,
        blobs: Arc<dyn BlobStorage>,
        workers: WorkerPool,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                settings,
                codec,
                blobs,
                workers,
                clock,
                index: RwLock::new(Index::default()),
            }),
        }
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.inner.settings
    }

    /// Ingest `data` under `id`.
    ///
    /// Decodes, converts to the canonical color mode, re-encodes to the
    /// canonical format, persists the bytes, and only then indexes the
    /// record. The pipeline runs in its own task, so it finishes even if the
    /// caller stops waiting.
    pub async fn save(&self, id: ImageId, data: Bytes) -> Result<ImageRecord> {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.save(id, data).await })
            .await
            .map_err(|e| Error::Internal(format!("ingest task failed: {e}")))?
    }

    /// Look up a record by id.
    pub fn get(&self, id: &ImageId) -> Option<ImageRecord> {
        self.inner
            .index
            .read()
            .records
            .get(id)
            .map(|(_, record)| record.clone())
    }

    /// Snapshot of all records, oldest modification first.
    ///
    /// Records saved at the same instant keep their insertion order.
    pub fn list(&self) -> Vec<ImageRecord> {
        let mut entries: Vec<(u64, ImageRecord)> =
            self.inner.index.read().records.values().cloned().collect();
        entries.sort_by(|(a_seq, a), (b_seq, b)| {
            a.modified.cmp(&b.modified).then(a_seq.cmp(b_seq))
        });
        entries.into_iter().map(|(_, record)| record).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.index.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Thumbnail sizes available for `record` under the configured floor.
    pub fn thumbnails(&self, record: &ImageRecord) -> Vec<ThumbnailSpec> {
        policy::derive(record.width, record.height, self.inner.settings.min_thumb_size)
    }

    /// Render a `width`x`height` thumbnail of `record` in the canonical format.
    ///
    /// Fails with [`Error::InvalidSize`] unless the size is one
    /// [`thumbnails`](Self::thumbnails) advertises.
    pub async fn make_thumbnail(
        &self,
        record: &ImageRecord,
        width: u32,
        height: u32,
    ) -> Result<Bytes> {
        let spec = ThumbnailSpec::new(width, height);
        if !self.thumbnails(record).contains(&spec) {
            return Err(Error::InvalidSize { width, height });
        }

        let original = self.inner.read_blob(record).await?;
        let codec = Arc::clone(&self.inner.codec);
        let format = self.inner.settings.format;

        let encoded = self
            .inner
            .workers
            .submit(move || {
                let decoded = codec.decode(&original)?;
                let resized = codec.resize(&decoded, spec.width, spec.height);
                codec.encode(&resized, format)
            })
            .await?;

        tracing::debug!("Rendered {spec} thumbnail for {}", record.id);
        Ok(Bytes::from(encoded))
    }

    /// Canonical bytes of the original image.
    pub async fn read_original(&self, id: &ImageId) -> Result<(ImageRecord, Bytes)> {
        let record = self.get(id).ok_or_else(|| Error::not_found("image", id))?;
        let data = self.inner.read_blob(&record).await?;
        Ok((record, data))
    }

    /// Remove an image from the index, then drop its bytes.
    pub async fn delete(&self, id: &ImageId) -> Result<ImageRecord> {
        let (_, record) = self
            .inner
            .index
            .write()
            .records
            .remove(id)
            .ok_or_else(|| Error::not_found("image", id))?;

        if let Err(e) = self.inner.blobs.delete(record.blob_key()).await {
            tracing::warn!("Image {id} removed from index but its blob remains: {e}");
        }

        tracing::info!("Deleted image {id}");
        Ok(record)
    }
}

impl StoreInner {
    async fn save(&self, id: ImageId, data: Bytes) -> Result<ImageRecord> {
        let _reservation = Reservation::claim(&self.index, id)?;

        let codec = Arc::clone(&self.codec);
        let format = self.settings.format;
        let ((width, height), encoded) = self
            .workers
            .submit(move || {
                let decoded = codec.decode(&data)?;
                let dimensions = decoded.dimensions();
                let normalized = codec.normalize(decoded);
                Ok((dimensions, codec.encode(&normalized, format)?))
            })
            .await?;

        self.blobs.write(&id, &encoded).await?;

        let record = ImageRecord {
            id,
            width,
            height,
            modified: self.clock.now(),
            format,
        };

        {
            let mut index = self.index.write();
            let seq = index.next_seq;
            index.next_seq += 1;
            index.records.insert(id, (seq, record.clone()));
        }

        tracing::info!(
            "Stored image {id} ({width}x{height}, {} bytes as {format})",
            encoded.len()
        );
        Ok(record)
    }

    async fn read_blob(&self, record: &ImageRecord) -> Result<Bytes> {
        match self.blobs.read(record.blob_key()).await {
            Err(Error::NotFound { .. }) => {
                tracing::error!(
                    image_id = %record.id,
                    "Invariant violation: indexed image has no blob"
                );
                Err(Error::BlobMissing {
                    id: record.id.to_string(),
                })
            }
            other => other,
        }
    }
}
