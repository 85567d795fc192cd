//! Content-store client for a blog kept in a GitHub repository.
//!
//! Provides a client bound to one repository coordinate, and the domain
//! operations (read, list, write, upload, name new posts) in `api`.
//! The CLI uses this client directly; tests run it against the in-memory
//! backend or a mock HTTP server.

pub mod api;

use anyhow::{Context, Result};
use blogsync_core::ClientConfig;
use blogsync_storage::{create_backend, ContentBackend, MonotonicMillis};
use std::sync::Arc;

pub use blogsync_core::{
    AssetReference, AssetUpload, AutoFilename, CommitResult, ContentEntry, Credentials,
    DownloadedFile, EntryKind, ErrorKind, PostDocument, RemoteLocation, RevisionToken,
    StoreError, StoreResult, TreeEntry,
};

/// Client for one repository, branch and pair of endpoints.
#[derive(Clone)]
pub struct BlogClient {
    backend: Arc<dyn ContentBackend>,
    config: ClientConfig,
    asset_clock: Arc<MonotonicMillis>,
}

impl std::fmt::Debug for BlogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlogClient")
            .field("backend", &self.backend.backend_type())
            .field("location", &self.config.location)
            .finish()
    }
}

impl BlogClient {
    /// Create a client with the backend named by `config.backend`.
    pub fn new(config: ClientConfig) -> StoreResult<Self> {
        let backend = create_backend(&config)?;
        Ok(Self::with_backend(config, backend))
    }

    /// Create a client over an existing backend (e.g. a seeded `MemoryBackend`).
    pub fn with_backend(config: ClientConfig, backend: Arc<dyn ContentBackend>) -> Self {
        Self {
            backend,
            config,
            asset_clock: Arc::new(MonotonicMillis::new()),
        }
    }

    /// Create client from environment: BLOGSYNC_OWNER, BLOGSYNC_REPO and the
    /// optional BLOGSYNC_* settings (see `ClientConfig::from_env`).
    pub fn from_env() -> Result<Self> {
        let config = ClientConfig::from_env().context("Failed to load blogsync configuration")?;
        Self::new(config).context("Failed to create content backend")
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn backend(&self) -> &Arc<dyn ContentBackend> {
        &self.backend
    }
}
