use crate::keys::{raw_branch_base, raw_file_url};
use crate::traits::{
    ContentBackend, FileMetadata, PutRequest, RemoteContent, TreeListing, WriteOutcome,
};
use async_trait::async_trait;
use blogsync_core::transcode;
use blogsync_core::{
    BackendKind, ClientConfig, ContentEntry, Credentials, EntryKind, RemoteLocation, RemotePath,
    RevisionToken, StoreError, StoreResult, TreeEntry,
};
use bytes::Bytes;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// In-memory content store for one branch.
///
/// Applies the same conditional-write rules as the remote: a write must carry
/// the current revision of an existing file and must not carry one for a new
/// file. Revisions are content hashes, so rewriting identical bytes keeps the
/// token stable.
#[derive(Debug)]
pub struct MemoryBackend {
    location: RemoteLocation,
    raw_base_url: String,
    required_token: Option<String>,
    files: RwLock<BTreeMap<String, Vec<u8>>>,
    commits: AtomicU64,
}

impl MemoryBackend {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            location: config.location.clone(),
            raw_base_url: config.raw_base_url.trim_end_matches('/').to_string(),
            required_token: None,
            files: RwLock::new(BTreeMap::new()),
            commits: AtomicU64::new(0),
        }
    }

    /// Reject writes whose credentials do not match `token`.
    pub fn with_required_token(mut self, token: impl Into<String>) -> Self {
        self.required_token = Some(token.into());
        self
    }

    /// Place a file directly, bypassing revision checks. Returns its revision.
    pub async fn seed(&self, path: &str, bytes: impl Into<Vec<u8>>) -> StoreResult<RevisionToken> {
        let path = RemotePath::parse(path)?;
        let bytes = bytes.into();
        let revision = revision_of(&bytes);
        self.files.write().await.insert(path.as_str().to_string(), bytes);
        Ok(revision)
    }

    /// Number of successful `put_file` calls.
    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::SeqCst)
    }

    fn metadata(&self, path: &RemotePath, bytes: &[u8]) -> FileMetadata {
        FileMetadata {
            name: path.file_name().unwrap_or_default().to_string(),
            path: path.as_str().to_string(),
            revision: revision_of(bytes),
            size: bytes.len() as u64,
            download_url: Some(self.raw_url(path)),
            content: Some(transcode::encode_binary(bytes)),
        }
    }

    fn rejected(status: u16, message: impl Into<String>) -> StoreError {
        StoreError::Rejected {
            status,
            message: message.into(),
        }
    }
}

/// Content hash in the style of a git blob id, over SHA-256.
fn revision_of(bytes: &[u8]) -> RevisionToken {
    let mut hasher = Sha256::new();
    hasher.update(format!("blob {}\0", bytes.len()).as_bytes());
    hasher.update(bytes);
    RevisionToken::new(hex::encode(hasher.finalize()))
}

fn dir_prefix(path: &RemotePath) -> String {
    if path.is_root() {
        String::new()
    } else {
        format!("{}/", path.as_str())
    }
}

#[async_trait]
impl ContentBackend for MemoryBackend {
    async fn get_contents(
        &self,
        path: &RemotePath,
        _credentials: Option<&Credentials>,
    ) -> StoreResult<RemoteContent> {
        let files = self.files.read().await;

        if let Some(bytes) = files.get(path.as_str()) {
            return Ok(RemoteContent::File(self.metadata(path, bytes)));
        }

        let prefix = dir_prefix(path);
        let mut children: BTreeMap<String, ContentEntry> = BTreeMap::new();
        for (key, bytes) in files.range(prefix.clone()..) {
            let Some(rest) = key.strip_prefix(&prefix) else {
                break;
            };
            let (name, kind) = match rest.split_once('/') {
                Some((dir, _)) => (dir, EntryKind::Dir),
                None => (rest, EntryKind::File),
            };
            let child_path = format!("{}{}", prefix, name);
            children.entry(name.to_string()).or_insert_with(|| {
                let (size, revision, download_url) = if kind == EntryKind::File {
                    let child = RemotePath::parse(&child_path).unwrap_or_default();
                    (
                        bytes.len() as u64,
                        Some(revision_of(bytes)),
                        Some(self.raw_url(&child)),
                    )
                } else {
                    (0, None, None)
                };
                ContentEntry {
                    name: name.to_string(),
                    path: child_path.clone(),
                    kind,
                    size,
                    revision,
                    download_url,
                }
            });
        }

        if children.is_empty() && !path.is_root() {
            return Err(StoreError::NotFound(path.to_string()));
        }

        Ok(RemoteContent::Dir(children.into_values().collect()))
    }

    async fn put_file(
        &self,
        path: &RemotePath,
        request: &PutRequest,
        credentials: &Credentials,
    ) -> StoreResult<WriteOutcome> {
        if let Some(required) = &self.required_token {
            if credentials.expose() != required {
                return Err(Self::rejected(401, "Bad credentials"));
            }
        }
        if request.branch != self.location.branch {
            return Err(Self::rejected(404, format!("Branch {} not found", request.branch)));
        }
        if path.is_root() {
            return Err(StoreError::EncodingFailure(
                "cannot write to the repository root".to_string(),
            ));
        }

        let bytes = transcode::decode_binary(&request.content)
            .map_err(|_| Self::rejected(422, "content is not valid Base64"))?;

        let mut files = self.files.write().await;

        let mut ancestor = path.parent();
        while let Some(dir) = ancestor {
            if files.contains_key(dir.as_str()) {
                return Err(Self::rejected(
                    422,
                    format!("{} is a file, not a directory", dir),
                ));
            }
            ancestor = dir.parent();
        }
        let prefix = dir_prefix(path);
        if files
            .range(prefix.clone()..)
            .next()
            .is_some_and(|(k, _)| k.starts_with(&prefix))
        {
            return Err(Self::rejected(422, format!("{} is a directory", path)));
        }

        let current = files.get(path.as_str()).map(|b| revision_of(b));
        match (&current, &request.sha) {
            (Some(_), None) => {
                return Err(StoreError::Conflict {
                    path: path.to_string(),
                    message: "Invalid request. \"sha\" wasn't supplied.".to_string(),
                })
            }
            (Some(current), Some(expected)) if current != expected => {
                return Err(StoreError::Conflict {
                    path: path.to_string(),
                    message: format!("{} does not match {}", path, expected),
                })
            }
            (None, Some(expected)) => {
                return Err(StoreError::Conflict {
                    path: path.to_string(),
                    message: format!("{} does not exist at revision {}", path, expected),
                })
            }
            _ => {}
        }

        let revision = revision_of(&bytes);
        let size = bytes.len();
        files.insert(path.as_str().to_string(), bytes);
        let commit = self.commits.fetch_add(1, Ordering::SeqCst) + 1;

        tracing::info!(
            path = %path,
            branch = %request.branch,
            size_bytes = size,
            created = current.is_none(),
            "Memory backend write successful"
        );

        Ok(WriteOutcome {
            revision,
            commit_sha: Some(format!("{:040x}", commit)),
        })
    }

    async fn list_tree(&self) -> StoreResult<TreeListing> {
        let files = self.files.read().await;
        let mut dirs = BTreeSet::new();
        for key in files.keys() {
            let mut path = RemotePath::parse(key)?.parent();
            while let Some(dir) = path {
                if dir.is_root() {
                    break;
                }
                path = dir.parent();
                dirs.insert(dir.as_str().to_string());
            }
        }

        let mut entries: Vec<TreeEntry> = dirs
            .into_iter()
            .map(|path| TreeEntry {
                path,
                kind: EntryKind::Dir,
                size: None,
            })
            .chain(files.iter().map(|(path, bytes)| TreeEntry {
                path: path.clone(),
                kind: EntryKind::File,
                size: Some(bytes.len() as u64),
            }))
            .collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(TreeListing {
            entries,
            truncated: false,
        })
    }

    async fn fetch_raw(&self, path: &RemotePath, _bust_cache: bool) -> StoreResult<Bytes> {
        self.files
            .read()
            .await
            .get(path.as_str())
            .map(|bytes| Bytes::from(bytes.clone()))
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    async fn fetch_url(&self, url: &str) -> StoreResult<Bytes> {
        let base = format!("{}/", raw_branch_base(&self.raw_base_url, &self.location));
        let wire = url
            .split('?')
            .next()
            .and_then(|u| u.strip_prefix(&base))
            .ok_or_else(|| StoreError::NotFound(url.to_string()))?;
        let path = RemotePath::from_wire(wire)?;
        self.fetch_raw(&path, false).await
    }

    fn raw_url(&self, path: &RemotePath) -> String {
        raw_file_url(&self.raw_base_url, &self.location, path)
    }

    fn branch(&self) -> &str {
        &self.location.branch
    }

    fn backend_type(&self) -> BackendKind {
        BackendKind::Memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blogsync_core::{ErrorKind, RemoteLocation};

    fn backend() -> MemoryBackend {
        let config = ClientConfig::new(RemoteLocation::new("octo", "blog", "main"))
            .with_endpoints("memory://api", "memory://raw")
            .with_backend(BackendKind::Memory);
        MemoryBackend::new(&config)
    }

    fn put(content: &str, sha: Option<RevisionToken>) -> PutRequest {
        PutRequest {
            message: "test".to_string(),
            content: transcode::encode_text(content),
            branch: "main".to_string(),
            sha,
        }
    }

    fn path(p: &str) -> RemotePath {
        RemotePath::parse(p).unwrap()
    }

    #[tokio::test]
    async fn create_then_update_with_current_revision() {
        let store = backend();
        let creds = Credentials::new("t");

        let created = store.put_file(&path("posts/a.md"), &put("one", None), &creds).await.unwrap();
        let updated = store
            .put_file(&path("posts/a.md"), &put("two", Some(created.revision.clone())), &creds)
            .await
            .unwrap();

        assert_ne!(created.revision, updated.revision);
        assert_eq!(store.commit_count(), 2);
        let body = store.fetch_raw(&path("posts/a.md"), true).await.unwrap();
        assert_eq!(&body[..], b"two");
    }

    #[tokio::test]
    async fn stale_or_missing_revision_conflicts() {
        let store = backend();
        let creds = Credentials::new("t");
        let stale = store.seed("posts/a.md", "v1").await.unwrap();
        store.seed("posts/a.md", "v2").await.unwrap();

        let err = store
            .put_file(&path("posts/a.md"), &put("v3", Some(stale)), &creds)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err = store
            .put_file(&path("posts/a.md"), &put("v3", None), &creds)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err = store
            .put_file(
                &path("posts/new.md"),
                &put("x", Some(RevisionToken::new("deadbeef"))),
                &creds,
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn listing_distinguishes_files_and_directories() {
        let store = backend();
        store.seed("posts/a.md", "a").await.unwrap();
        store.seed("posts/drafts/b.md", "b").await.unwrap();
        store.seed("postscript.md", "c").await.unwrap();

        let RemoteContent::Dir(entries) = store.get_contents(&path("posts"), None).await.unwrap() else {
            panic!("expected a directory listing");
        };
        let summary: Vec<(&str, EntryKind)> =
            entries.iter().map(|e| (e.path.as_str(), e.kind)).collect();
        assert_eq!(
            summary,
            vec![("posts/a.md", EntryKind::File), ("posts/drafts", EntryKind::Dir)]
        );

        let RemoteContent::Dir(root) = store.get_contents(&RemotePath::root(), None).await.unwrap() else {
            panic!("expected a directory listing");
        };
        assert_eq!(root.len(), 2);

        let err = store.get_contents(&path("missing"), None).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn rejects_bad_credentials_and_shape_violations() {
        let store = backend().with_required_token("secret");
        store.seed("posts/a.md", "a").await.unwrap();

        let err = store
            .put_file(&path("posts/b.md"), &put("b", None), &Credentials::new("wrong"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Rejected { status: 401, .. }));

        let creds = Credentials::new("secret");
        let err = store
            .put_file(&path("posts"), &put("b", None), &creds)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Rejected { status: 422, .. }));

        let err = store
            .put_file(&path("posts/a.md/child"), &put("b", None), &creds)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Rejected { status: 422, .. }));
    }

    #[tokio::test]
    async fn raw_urls_resolve_back_to_content() {
        let store = backend();
        store.seed("images/旅行/1-a b.png", vec![1u8, 2, 3]).await.unwrap();

        let url = store.raw_url(&path("images/旅行/1-a b.png"));
        assert_eq!(
            url,
            "memory://raw/octo/blog/main/images/%E6%97%85%E8%A1%8C/1-a%20b.png"
        );
        let body = store.fetch_url(&url).await.unwrap();
        assert_eq!(&body[..], &[1, 2, 3]);

        assert!(store.fetch_url("https://elsewhere/x").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn tree_lists_implied_directories() {
        let store = backend();
        store.seed("posts/a.md", "a").await.unwrap();
        store.seed("images/p/1-x.png", "x").await.unwrap();

        let tree = store.list_tree().await.unwrap();
        let paths: Vec<&str> = tree.entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["images", "images/p", "images/p/1-x.png", "posts", "posts/a.md"]
        );
        assert!(!tree.truncated);
    }
}
