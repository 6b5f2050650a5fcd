//! # CareerGuard Store - TTL Storage
//!
//! Two small stores whose entries expire on their own:
//!
//! 1. **[`LocalCache`]** - namespaced JSON key/value cache over Sled, the
//!    persistent counterpart of browser local storage.
//!
//! 2. **[`TemporaryFileStorage`]** - generated-path temp files with tracked
//!    expiry and a sweep for expired ones.
//!
//! ## Expiry Semantics
//!
//! Both stores measure time with an injected
//! [`Clock`](careerguard_clock::Clock). An entry is live strictly before its
//! expiry instant. Expired entries are removed lazily on read and eagerly by
//! the sweeps ([`LocalCache::purge_expired`], [`TemporaryFileStorage::cleanup`]).
//!
//! ## Failure Taxonomy
//!
//! | Failure | LocalCache | TemporaryFileStorage |
//! |---------|------------|----------------------|
//! | Miss | `None` | `StoreError::NotFound` |
//! | Expired | `None`, entry deleted | `StoreError::Expired`, file deleted |
//! | I/O | logged, `false`/`None` | `StoreError::Io` (reads/writes), `false` (deletes) |
//!
//! Nothing is retried.
//!
//! ## References
//!
//! - Sled documentation: <https://sled.rs/>

pub mod cache;
pub mod error;
pub mod files;

pub use cache::{LocalCache, DEFAULT_CACHE_TTL_SECS};
pub use error::{Result, StoreError};
pub use files::{StoredFile, TempFileRecord, TemporaryFileStorage, DEFAULT_FILE_TTL_SECS};
