//! Blogsync Storage Library
//!
//! This crate provides the `ContentBackend` trait, the seam between the
//! blogsync client logic and the remote store, plus its implementations:
//! the GitHub contents API with its raw CDN, and an in-memory store that
//! enforces the same optimistic-concurrency rules.
//!
//! # Path format
//!
//! Backends take logical `RemotePath`s and do all percent-encoding themselves
//! through `blogsync_core::path_codec`. Asset paths are generated in the
//! `keys` module so every caller lays assets out the same way:
//! `{images_dir}/{folder}/{millis}-{file_name}`.

pub mod factory;
#[cfg(feature = "backend-github")]
pub mod github;
pub mod keys;
#[cfg(feature = "backend-memory")]
pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use blogsync_core::{BackendKind, StoreError, StoreResult};
pub use factory::create_backend;
#[cfg(feature = "backend-github")]
pub use github::GitHubBackend;
pub use keys::{asset_path, raw_file_url, MonotonicMillis};
#[cfg(feature = "backend-memory")]
pub use memory::MemoryBackend;
pub use traits::{ContentBackend, FileMetadata, PutRequest, RemoteContent, TreeListing, WriteOutcome};
