//! lb-imaging: ingest, normalization, and on-demand thumbnails.
//!
//! The [`ImageStore`] owns the in-memory metadata index and orchestrates the
//! decode, normalize, encode, persist, index pipeline on upload, plus
//! read, resize, encode when a thumbnail is requested. CPU-bound steps run on
//! a bounded [`WorkerPool`] so request flows never block on transcoding.
//!
//! The codec and blob storage sit behind the [`Codec`] and [`BlobStorage`]
//! traits; [`policy::derive`] is the single source of truth for which
//! thumbnail sizes exist.

pub mod blob;
pub mod codec;
pub mod policy;
pub mod store;
pub mod workers;

pub use blob::{BlobStorage, FsBlobStorage, MemoryBlobStorage};
pub use codec::{Codec, DecodedImage, RasterCodec};
pub use policy::ThumbnailSpec;
pub use store::{ImageRecord, ImageStore, StoreSettings};
pub use workers::WorkerPool;
