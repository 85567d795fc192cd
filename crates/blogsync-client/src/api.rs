//! Domain operations of the blog client.
//!
//! Every remote path is built from a logical `RemotePath`; the backends do the
//! per-endpoint encoding. Within one operation remote calls run strictly in
//! sequence, so a revision is always read before the write that uses it.

use crate::BlogClient;
use blogsync_core::path_codec::decode_display_name;
use blogsync_core::sequence::{next_in_sequence, today};
use blogsync_core::transcode::{encode_binary, encode_text};
use blogsync_core::{
    AssetReference, AssetUpload, AutoFilename, CommitResult, ContentEntry, Credentials,
    DownloadedFile, EntryKind, PostDocument, RemotePath, RevisionToken, StoreError, StoreResult,
    TreeEntry,
};
use blogsync_storage::{asset_path, PutRequest, RemoteContent};
use chrono::NaiveDate;

fn directory_rejection(path: &RemotePath) -> StoreError {
    StoreError::Rejected {
        status: 422,
        message: format!("{} is a directory", path),
    }
}

fn display_name(path: &RemotePath) -> &str {
    path.file_name().unwrap_or("/")
}

impl BlogClient {
    /// Current revision of `path`, or `None` when nothing exists there.
    ///
    /// The lookup is authenticated with `credentials`, so files in private
    /// repositories are found. Only a genuine not-found answer means
    /// "absent"; network failures and rejections are returned as errors.
    pub async fn resolve_revision(
        &self,
        path: &str,
        credentials: &Credentials,
    ) -> StoreResult<Option<RevisionToken>> {
        let path = RemotePath::parse(path)?;
        self.resolve_remote_revision(&path, Some(credentials)).await
    }

    async fn resolve_remote_revision(
        &self,
        path: &RemotePath,
        credentials: Option<&Credentials>,
    ) -> StoreResult<Option<RevisionToken>> {
        match self.backend.get_contents(path, credentials).await {
            Ok(RemoteContent::File(meta)) => Ok(Some(meta.revision)),
            Ok(RemoteContent::Dir(_)) => Err(directory_rejection(path)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Entries directly under `path` in remote order. The empty path lists
    /// the repository root. A missing directory lists as empty.
    pub async fn list(&self, path: &str) -> StoreResult<Vec<ContentEntry>> {
        let path = RemotePath::parse(path)?;
        self.list_remote(&path).await
    }

    /// Entries of the configured posts directory.
    pub async fn list_posts(&self) -> StoreResult<Vec<ContentEntry>> {
        self.list_remote(&self.config.posts_root()).await
    }

    async fn list_remote(&self, path: &RemotePath) -> StoreResult<Vec<ContentEntry>> {
        match self.backend.get_contents(path, None).await {
            Ok(RemoteContent::Dir(entries)) => Ok(entries),
            Ok(RemoteContent::File(meta)) => Ok(vec![ContentEntry {
                name: meta.name,
                path: meta.path,
                kind: EntryKind::File,
                size: meta.size,
                revision: Some(meta.revision),
                download_url: meta.download_url,
            }]),
            Err(err) if err.is_not_found() => {
                tracing::debug!(path = %path, "Listing missing directory as empty");
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }

    /// Every path on the branch, recursively.
    pub async fn list_tree(&self) -> StoreResult<Vec<TreeEntry>> {
        let listing = self.backend.list_tree().await?;
        if listing.truncated {
            tracing::warn!(
                branch = %self.backend.branch(),
                entries = listing.entries.len(),
                "Remote tree listing was truncated"
            );
        }
        Ok(listing.entries)
    }

    /// Latest committed text of `path`, read from the raw endpoint with the
    /// cache bypassed.
    pub async fn read_post(&self, path: &str) -> StoreResult<String> {
        let path = RemotePath::parse(path)?;
        let start = std::time::Instant::now();

        let bytes = self
            .backend
            .fetch_raw(&path, true)
            .await
            .map_err(|e| e.with_prefix("document not found or inaccessible"))?;

        let text = String::from_utf8(bytes.to_vec()).map_err(|e| {
            StoreError::EncodingFailure(format!("{} is not UTF-8 text: {}", path, e))
        })?;

        tracing::info!(
            path = %path,
            size_bytes = text.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Post read"
        );

        Ok(text)
    }

    /// Load a post for editing: its revision first, then its body.
    pub async fn load_document(&self, path: &str) -> StoreResult<PostDocument> {
        let remote = RemotePath::parse(path)?;
        let revision = self.resolve_remote_revision(&remote, None).await?;
        if revision.is_none() {
            return Err(StoreError::NotFound(format!(
                "document not found or inaccessible: {}",
                remote
            )));
        }
        let content = self.read_post(remote.as_str()).await?;

        Ok(PostDocument {
            path: remote.as_str().to_string(),
            content,
            revision,
        })
    }

    /// Create or update the text at `path`.
    ///
    /// The current revision is resolved immediately before the write. If that
    /// lookup fails for any reason other than not-found, the write goes ahead
    /// as a create (the remote answers `Conflict` if the file exists) unless
    /// strict revision lookup is configured, in which case the lookup error is
    /// returned.
    pub async fn write_post(
        &self,
        path: &str,
        text: &str,
        credentials: &Credentials,
    ) -> StoreResult<CommitResult> {
        let path = RemotePath::parse(path)?;
        let revision = self.lenient_revision(&path, credentials).await?;
        let message = format!("Update post: {}", display_name(&path));
        self.submit(&path, encode_text(text), message, revision, credentials)
            .await
    }

    /// Write `text` only if the remote is still at `expected`.
    ///
    /// `None` means create-only: the write conflicts if anything exists at
    /// `path`. No revision lookup is made.
    pub async fn write_conditional(
        &self,
        path: &str,
        text: &str,
        expected: Option<&RevisionToken>,
        credentials: &Credentials,
    ) -> StoreResult<CommitResult> {
        let path = RemotePath::parse(path)?;
        let message = format!("Update post: {}", display_name(&path));
        self.submit(&path, encode_text(text), message, expected.cloned(), credentials)
            .await
    }

    /// Save an edited document against the revision it was loaded at.
    pub async fn save_document(
        &self,
        document: &PostDocument,
        credentials: &Credentials,
    ) -> StoreResult<CommitResult> {
        self.write_conditional(
            &document.path,
            &document.content,
            document.revision.as_ref(),
            credentials,
        )
        .await
    }

    async fn lenient_revision(
        &self,
        path: &RemotePath,
        credentials: &Credentials,
    ) -> StoreResult<Option<RevisionToken>> {
        match self.resolve_remote_revision(path, Some(credentials)).await {
            Ok(revision) => Ok(revision),
            Err(err) if self.config.strict_revision_lookup => Err(err),
            Err(err) => {
                tracing::warn!(
                    path = %path,
                    error = %err,
                    "Revision lookup failed; writing without a prior revision"
                );
                Ok(None)
            }
        }
    }

    async fn submit(
        &self,
        path: &RemotePath,
        content: String,
        message: String,
        revision: Option<RevisionToken>,
        credentials: &Credentials,
    ) -> StoreResult<CommitResult> {
        let created = revision.is_none();
        let request = PutRequest {
            message,
            content,
            branch: self.backend.branch().to_string(),
            sha: revision,
        };

        let outcome = match self.backend.put_file(path, &request, credentials).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(path = %path, kind = %err.kind(), error = %err, "Write failed");
                return Err(err);
            }
        };

        Ok(CommitResult {
            path: path.as_str().to_string(),
            revision: outcome.revision,
            commit_sha: outcome.commit_sha,
            message: request.message,
            created,
        })
    }

    /// Upload binary data into `{images_dir}/{folder_name}/` and return where
    /// it can be read back.
    ///
    /// The stored name is prefixed with a millisecond timestamp that never
    /// repeats within this client, so repeated uploads of the same file name
    /// get distinct references.
    pub async fn upload_asset(
        &self,
        bytes: &[u8],
        file_name: &str,
        folder_name: &str,
        credentials: &Credentials,
    ) -> StoreResult<AssetReference> {
        let millis = self.asset_clock.next();
        let path = asset_path(&self.config.images_root(), folder_name, file_name, millis)?;
        let start = std::time::Instant::now();

        let revision = self
            .lenient_revision(&path, credentials)
            .await
            .map_err(|e| e.with_prefix("asset upload failed"))?;
        let message = format!("Upload image: {}", file_name);
        self.submit(&path, encode_binary(bytes), message, revision, credentials)
            .await
            .map_err(|e| e.with_prefix("asset upload failed"))?;

        let url = self.backend.raw_url(&path);

        tracing::info!(
            path = %path,
            size_bytes = bytes.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Asset upload successful"
        );

        Ok(AssetReference {
            path: path.as_str().to_string(),
            url,
        })
    }

    pub async fn upload(
        &self,
        upload: &AssetUpload,
        credentials: &Credentials,
    ) -> StoreResult<AssetReference> {
        self.upload_asset(&upload.bytes, &upload.file_name, &upload.folder_name, credentials)
            .await
    }

    /// Next free date-scoped post name for today (local time).
    pub async fn next_filename(&self) -> StoreResult<AutoFilename> {
        self.next_filename_on(today()).await
    }

    /// Next free post name for `date`, from a fresh listing of the posts
    /// directory. Two concurrent callers can receive the same name; use
    /// `create_post` to turn that race into a `Conflict`.
    pub async fn next_filename_on(&self, date: NaiveDate) -> StoreResult<AutoFilename> {
        let entries = self.list_posts().await?;
        let name = next_in_sequence(date, entries.iter().map(|e| e.name.as_str()));
        tracing::debug!(name = %name, existing = entries.len(), "Derived next post name");
        Ok(name)
    }

    /// Create a new post under a generated name.
    ///
    /// The write is create-only, so losing a naming race to another writer
    /// yields `Conflict` instead of overwriting their post.
    pub async fn create_post(
        &self,
        text: &str,
        credentials: &Credentials,
    ) -> StoreResult<CommitResult> {
        let name = self.next_filename().await?;
        let path = self.config.posts_root().join(&name.to_string())?;
        self.write_conditional(path.as_str(), text, None, credentials)
            .await
    }

    /// Fetch a file's bytes together with its true (decoded) file name.
    pub async fn download_file(&self, path: &str) -> StoreResult<DownloadedFile> {
        let path = RemotePath::parse(path)?;

        let meta = match self.backend.get_contents(&path, None).await {
            Ok(RemoteContent::File(meta)) => meta,
            Ok(RemoteContent::Dir(_)) => return Err(directory_rejection(&path)),
            Err(err) if err.is_not_found() => {
                return Err(StoreError::NotFound(format!("unable to locate file: {}", path)))
            }
            Err(err) => return Err(err),
        };

        let url = meta
            .download_url
            .clone()
            .unwrap_or_else(|| self.backend.raw_url(&path));
        let bytes = self
            .backend
            .fetch_url(&url)
            .await
            .map_err(|e| e.with_prefix("file download failed"))?;

        let name = if meta.name.is_empty() {
            decode_display_name(&path.encode_for_raw())?
        } else {
            meta.name
        };

        Ok(DownloadedFile {
            name,
            bytes: bytes.to_vec(),
        })
    }
}
