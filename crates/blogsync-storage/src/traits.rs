//! Content backend abstraction
//!
//! This module defines the ContentBackend trait that all backends must implement.

use async_trait::async_trait;
use blogsync_core::{
    BackendKind, ContentEntry, Credentials, RemotePath, RevisionToken, StoreResult, TreeEntry,
};
use bytes::Bytes;
use serde::Serialize;

/// Metadata of a single file as reported by the metadata endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub name: String,
    pub path: String,
    pub revision: RevisionToken,
    pub size: u64,
    pub download_url: Option<String>,
    /// Inline transport-encoded body, when the endpoint returned one
    pub content: Option<String>,
}

/// What lives at a path: a file or a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteContent {
    File(FileMetadata),
    Dir(Vec<ContentEntry>),
}

/// Body of a conditional write.
///
/// `sha` present means "replace exactly this revision", absent means
/// "create"; the store rejects either when it does not match its state.
#[derive(Debug, Clone, Serialize)]
pub struct PutRequest {
    pub message: String,
    /// Transport-encoded (base64) content
    pub content: String,
    pub branch: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<RevisionToken>,
}

/// Result of a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    pub revision: RevisionToken,
    pub commit_sha: Option<String>,
}

/// Flat recursive listing of the branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeListing {
    pub entries: Vec<TreeEntry>,
    /// The remote cut the listing short
    pub truncated: bool,
}

/// Content backend trait
///
/// All backends (GitHub, in-memory) implement this trait so the client
/// operations can run against any of them. Every method maps a missing path
/// to `StoreError::NotFound`; deciding whether that is a failure is up to the
/// caller.
#[async_trait]
pub trait ContentBackend: Send + Sync {
    /// Read metadata (and for directories, the listing) at `path` on the
    /// configured branch. The root path lists the repository root.
    ///
    /// With `credentials` the read is authenticated, which private
    /// repositories require before they report anything but not-found.
    async fn get_contents(
        &self,
        path: &RemotePath,
        credentials: Option<&Credentials>,
    ) -> StoreResult<RemoteContent>;

    /// Submit a conditional write of one file.
    ///
    /// Revision mismatches (including a missing `sha` for a file that already
    /// exists) are `StoreError::Conflict`.
    async fn put_file(
        &self,
        path: &RemotePath,
        request: &PutRequest,
        credentials: &Credentials,
    ) -> StoreResult<WriteOutcome>;

    /// List every path of the branch recursively.
    async fn list_tree(&self) -> StoreResult<TreeListing>;

    /// Fetch the body at `path` from the read-optimized endpoint.
    ///
    /// With `bust_cache` the request carries a unique query parameter so
    /// intermediate caches cannot answer it.
    async fn fetch_raw(&self, path: &RemotePath, bust_cache: bool) -> StoreResult<Bytes>;

    /// Fetch an absolute URL previously handed out by this backend
    /// (a `download_url` or a `raw_url`).
    async fn fetch_url(&self, url: &str) -> StoreResult<Bytes>;

    /// Public read URL of `path`, encoded per segment.
    fn raw_url(&self, path: &RemotePath) -> String;

    /// Branch that reads and writes target.
    fn branch(&self) -> &str;

    /// Get the backend type
    fn backend_type(&self) -> BackendKind;
}
