//! lb-core: shared types, ids, errors, clock, and configuration.
//!
//! This crate is the foundational dependency for all other lb-* crates:
//!
//! - **Typed IDs**: [`ImageId`] plus injectable [`IdGenerator`]s
//! - **Error Handling**: a unified [`Error`] with HTTP status mapping
//! - **Clock**: an injectable wall clock for modification timestamps
//! - **Paths**: URI templates shared by link advertising and routing
//! - **Configuration**: the explicit [`config::Config`] struct
//!
//! # Examples
//!
//! ```
//! use lb_core::{paths, ImageId};
//!
//! let id = ImageId::new();
//! assert!(paths::thumbnail_uri(&id, 231, 231).ends_with("/231x231"));
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod format;
pub mod ids;
pub mod paths;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Error, Result};
pub use format::ImageFormat;
pub use ids::*;
