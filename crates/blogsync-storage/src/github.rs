use crate::keys::raw_file_url;
use crate::traits::{
    ContentBackend, FileMetadata, PutRequest, RemoteContent, TreeListing, WriteOutcome,
};
use async_trait::async_trait;
use blogsync_core::constants::{CACHE_BUST_PARAM, USER_AGENT};
use blogsync_core::path_codec::{encode_coordinate, encode_segment};
use blogsync_core::{
    BackendKind, ClientConfig, ContentEntry, Credentials, EntryKind, RemoteLocation, RemotePath,
    RevisionToken, StoreError, StoreResult, TreeEntry,
};
use bytes::Bytes;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CACHE_CONTROL};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Backend for the GitHub contents API and its raw content CDN.
///
/// Metadata, listings and writes go to the API; file bodies are read from the
/// CDN, which has far higher rate limits but caches aggressively.
#[derive(Clone, Debug)]
pub struct GitHubBackend {
    client: Client,
    location: RemoteLocation,
    api_base_url: String,
    raw_base_url: String,
}

#[derive(Debug, Deserialize)]
struct ContentItem {
    name: String,
    path: String,
    sha: String,
    #[serde(default)]
    size: Option<u64>,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    download_url: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    Dir(Vec<ContentItem>),
    File(ContentItem),
}

#[derive(Debug, Deserialize)]
struct PutResponseBody {
    content: Option<ContentItem>,
    commit: Option<CommitBody>,
}

#[derive(Debug, Deserialize)]
struct CommitBody {
    sha: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    tree: Vec<TreeItem>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct TreeItem {
    path: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl ContentItem {
    fn into_entry(self) -> ContentEntry {
        let kind = EntryKind::from_remote(&self.kind).unwrap_or(EntryKind::File);
        ContentEntry {
            name: self.name,
            path: self.path,
            kind,
            size: self.size.unwrap_or(0),
            revision: Some(RevisionToken::new(self.sha)),
            download_url: self.download_url,
        }
    }

    fn into_metadata(self) -> FileMetadata {
        FileMetadata {
            name: self.name,
            path: self.path,
            revision: RevisionToken::new(self.sha),
            size: self.size.unwrap_or(0),
            download_url: self.download_url,
            content: self.content,
        }
    }
}

impl GitHubBackend {
    /// Create a new GitHubBackend instance
    ///
    /// The per-request timeout comes from `config.http_timeout_secs`; an
    /// expired timeout surfaces as `StoreError::TransientNetwork`.
    pub fn new(config: &ClientConfig) -> StoreResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static("2022-11-28"),
        );

        let client = Client::builder()
            .timeout(config.http_timeout())
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| StoreError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(client, config))
    }

    /// Create a backend with a custom reqwest client.
    pub fn with_client(client: Client, config: &ClientConfig) -> Self {
        Self {
            client,
            location: config.location.clone(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            raw_base_url: config.raw_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn repo_api_base(&self) -> String {
        format!(
            "{}/repos/{}/{}",
            self.api_base_url,
            encode_segment(&self.location.owner),
            encode_segment(&self.location.repo)
        )
    }

    /// The root is addressed as `/contents`, never `/contents/`.
    fn contents_url(&self, path: &RemotePath) -> String {
        if path.is_root() {
            format!("{}/contents", self.repo_api_base())
        } else {
            format!("{}/contents/{}", self.repo_api_base(), path.encode_for_api())
        }
    }

    fn tree_url(&self) -> String {
        format!(
            "{}/git/trees/{}",
            self.repo_api_base(),
            encode_coordinate(&self.location.branch)
        )
    }

    async fn get_bytes(&self, url: &str, query: &[(&str, String)], missing: &str) -> StoreResult<Bytes> {
        let start = std::time::Instant::now();
        let mut request = self.client.get(url).header(CACHE_CONTROL, "no-cache");
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(missing.to_string()));
        }
        if !status.is_success() {
            return Err(error_from_response(response, missing, false).await);
        }

        let body = response.bytes().await.map_err(transport_error)?;

        tracing::debug!(
            url = %url,
            status = status.as_u16(),
            size_bytes = body.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Raw fetch successful"
        );

        Ok(body)
    }
}

#[async_trait]
impl ContentBackend for GitHubBackend {
    async fn get_contents(
        &self,
        path: &RemotePath,
        credentials: Option<&Credentials>,
    ) -> StoreResult<RemoteContent> {
        let url = self.contents_url(path);
        let start = std::time::Instant::now();

        tracing::debug!(
            url = %url,
            branch = %self.location.branch,
            authenticated = credentials.is_some(),
            "Fetching contents metadata"
        );

        let mut request = self
            .client
            .get(&url)
            .query(&[("ref", self.location.branch.as_str())]);
        if let Some(credentials) = credentials {
            request = request.header(AUTHORIZATION, format!("token {}", credentials.expose()));
        }

        let response = request
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(error_from_response(response, path.as_str(), false).await);
        }

        let body: ContentsResponse = parse_json(response, status).await?;

        tracing::debug!(
            path = %path,
            status = status.as_u16(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Contents metadata fetched"
        );

        Ok(match body {
            ContentsResponse::Dir(items) => {
                RemoteContent::Dir(items.into_iter().map(ContentItem::into_entry).collect())
            }
            ContentsResponse::File(item) => RemoteContent::File(item.into_metadata()),
        })
    }

    async fn put_file(
        &self,
        path: &RemotePath,
        request: &PutRequest,
        credentials: &Credentials,
    ) -> StoreResult<WriteOutcome> {
        if path.is_root() {
            return Err(StoreError::EncodingFailure(
                "cannot write to the repository root".to_string(),
            ));
        }

        let url = self.contents_url(path);
        let start = std::time::Instant::now();

        let response = self
            .client
            .put(&url)
            .header(AUTHORIZATION, format!("token {}", credentials.expose()))
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let err = error_from_response(response, path.as_str(), true).await;
            tracing::warn!(
                path = %path,
                status = status.as_u16(),
                error = %err,
                "Contents write rejected"
            );
            return Err(err);
        }

        let body: PutResponseBody = parse_json(response, status).await?;
        let revision = body
            .content
            .map(|c| RevisionToken::new(c.sha))
            .ok_or_else(|| StoreError::Rejected {
                status: status.as_u16(),
                message: "write response carried no content revision".to_string(),
            })?;

        tracing::info!(
            path = %path,
            branch = %request.branch,
            size_bytes = request.content.len(),
            created = request.sha.is_none(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "GitHub contents write successful"
        );

        Ok(WriteOutcome {
            revision,
            commit_sha: body.commit.and_then(|c| c.sha),
        })
    }

    async fn list_tree(&self) -> StoreResult<TreeListing> {
        let url = self.tree_url();
        let response = self
            .client
            .get(&url)
            .query(&[("recursive", "1")])
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(error_from_response(response, &self.location.branch, false).await);
        }

        let body: TreeResponse = parse_json(response, status).await?;
        let entries = body
            .tree
            .into_iter()
            .map(|item| TreeEntry {
                kind: EntryKind::from_remote(&item.kind).unwrap_or(EntryKind::File),
                path: item.path,
                size: item.size,
            })
            .collect();

        Ok(TreeListing {
            entries,
            truncated: body.truncated,
        })
    }

    async fn fetch_raw(&self, path: &RemotePath, bust_cache: bool) -> StoreResult<Bytes> {
        let url = self.raw_url(path);
        let query = if bust_cache {
            vec![(CACHE_BUST_PARAM, Utc::now().timestamp_millis().to_string())]
        } else {
            Vec::new()
        };
        self.get_bytes(&url, &query, path.as_str()).await
    }

    async fn fetch_url(&self, url: &str) -> StoreResult<Bytes> {
        self.get_bytes(url, &[], url).await
    }

    fn raw_url(&self, path: &RemotePath) -> String {
        raw_file_url(&self.raw_base_url, &self.location, path)
    }

    fn branch(&self) -> &str {
        &self.location.branch
    }

    fn backend_type(&self) -> BackendKind {
        BackendKind::GitHub
    }
}

fn transport_error(err: reqwest::Error) -> StoreError {
    if err.is_timeout() {
        StoreError::TransientNetwork(format!("request timed out: {}", err))
    } else if err.is_builder() {
        StoreError::Config(format!("invalid request: {}", err))
    } else {
        StoreError::TransientNetwork(err.to_string())
    }
}

async fn parse_json<T: DeserializeOwned>(response: Response, status: StatusCode) -> StoreResult<T> {
    let text = response.text().await.map_err(transport_error)?;
    serde_json::from_str(&text).map_err(|e| StoreError::Rejected {
        status: status.as_u16(),
        message: format!("unexpected response body: {}", e),
    })
}

/// Map a non-success response to a `StoreError`, keeping the remote message.
///
/// On writes, 409 and the 422 GitHub sends for a missing or stale `sha` are
/// revision conflicts; 404 is a rejection (usually a token without access).
async fn error_from_response(response: Response, subject: &str, writing: bool) -> StoreError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            if text.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            } else {
                text.trim().to_string()
            }
        });

    match status {
        StatusCode::NOT_FOUND if !writing => StoreError::NotFound(subject.to_string()),
        StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => StoreError::Conflict {
            path: subject.to_string(),
            message,
        },
        StatusCode::UNPROCESSABLE_ENTITY if writing && message.to_lowercase().contains("sha") => {
            StoreError::Conflict {
                path: subject.to_string(),
                message,
            }
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => StoreError::TransientNetwork(
            format!("remote timed out (status {}): {}", status.as_u16(), message),
        ),
        _ => StoreError::Rejected {
            status: status.as_u16(),
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> GitHubBackend {
        let config = ClientConfig::new(RemoteLocation::new("kaze", "my blog", "main"))
            .with_endpoints("https://api.example.com/", "https://raw.example.com");
        GitHubBackend::new(&config).unwrap()
    }

    #[test]
    fn root_listing_has_no_trailing_separator() {
        let backend = backend();
        assert_eq!(
            backend.contents_url(&RemotePath::root()),
            "https://api.example.com/repos/kaze/my%20blog/contents"
        );
        assert_eq!(
            backend.contents_url(&RemotePath::parse("posts/草稿 1.md").unwrap()),
            "https://api.example.com/repos/kaze/my%20blog/contents/posts/%E8%8D%89%E7%A8%BF%201.md"
        );
    }

    #[test]
    fn tree_and_raw_urls() {
        let backend = backend();
        assert_eq!(
            backend.tree_url(),
            "https://api.example.com/repos/kaze/my%20blog/git/trees/main"
        );
        assert_eq!(
            backend.raw_url(&RemotePath::parse("posts/a.md").unwrap()),
            "https://raw.example.com/kaze/my%20blog/main/posts/a.md"
        );
    }

    #[test]
    fn tree_kinds_map_to_entry_kinds() {
        let body: TreeResponse = serde_json::from_str(
            r#"{"sha":"x","tree":[{"path":"posts","type":"tree"},{"path":"posts/a.md","type":"blob","size":3}],"truncated":false}"#,
        )
        .unwrap();
        assert_eq!(EntryKind::from_remote(&body.tree[0].kind), Some(EntryKind::Dir));
        assert_eq!(EntryKind::from_remote(&body.tree[1].kind), Some(EntryKind::File));
    }
}
