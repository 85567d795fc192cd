//! Configuration module
//!
//! The remote coordinate and endpoint settings are an explicit value handed to
//! each client at construction. Several configurations (repositories, branches
//! or fake endpoints) can coexist in one process.

use std::env;
use std::time::Duration;

use crate::constants::{
    DEFAULT_API_URL, DEFAULT_BRANCH, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_IMAGES_DIR,
    DEFAULT_POSTS_DIR, DEFAULT_RAW_URL,
};
use crate::path_codec::RemotePath;
use crate::storage_types::BackendKind;

/// Repository coordinate targeted by a client: owner, repository and branch.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RemoteLocation {
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

impl RemoteLocation {
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            branch: branch.into(),
        }
    }
}

/// Client configuration
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub location: RemoteLocation,
    pub backend: BackendKind,
    /// Base of the metadata/contents API (e.g. "https://api.github.com")
    pub api_base_url: String,
    /// Base of the raw content CDN (e.g. "https://raw.githubusercontent.com")
    pub raw_base_url: String,
    pub posts_dir: String,
    pub images_dir: String,
    pub http_timeout_secs: u64,
    /// Propagate revision lookup failures from the writer instead of writing
    /// with an absent token.
    pub strict_revision_lookup: bool,
}

impl ClientConfig {
    /// Configuration for `location` with every other setting at its default.
    pub fn new(location: RemoteLocation) -> Self {
        Self {
            location,
            backend: BackendKind::GitHub,
            api_base_url: DEFAULT_API_URL.to_string(),
            raw_base_url: DEFAULT_RAW_URL.to_string(),
            posts_dir: DEFAULT_POSTS_DIR.to_string(),
            images_dir: DEFAULT_IMAGES_DIR.to_string(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            strict_revision_lookup: false,
        }
    }

    /// Point both endpoints somewhere else (a mock server, GitHub Enterprise).
    pub fn with_endpoints(mut self, api_base_url: &str, raw_base_url: &str) -> Self {
        self.api_base_url = api_base_url.trim_end_matches('/').to_string();
        self.raw_base_url = raw_base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.http_timeout_secs = secs;
        self
    }

    pub fn with_strict_revision_lookup(mut self, strict: bool) -> Self {
        self.strict_revision_lookup = strict;
        self
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let owner = env::var("BLOGSYNC_OWNER")
            .map_err(|_| anyhow::anyhow!("BLOGSYNC_OWNER must be set to the repository owner"))?;
        let repo = env::var("BLOGSYNC_REPO")
            .map_err(|_| anyhow::anyhow!("BLOGSYNC_REPO must be set to the repository name"))?;
        let branch = env::var("BLOGSYNC_BRANCH").unwrap_or_else(|_| DEFAULT_BRANCH.to_string());

        let backend = env::var("BLOGSYNC_BACKEND")
            .unwrap_or_else(|_| BackendKind::GitHub.to_string())
            .parse::<BackendKind>()?;

        let config = ClientConfig {
            location: RemoteLocation::new(owner, repo, branch),
            backend,
            api_base_url: env::var("BLOGSYNC_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            raw_base_url: env::var("BLOGSYNC_RAW_URL")
                .unwrap_or_else(|_| DEFAULT_RAW_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            posts_dir: env::var("BLOGSYNC_POSTS_DIR")
                .unwrap_or_else(|_| DEFAULT_POSTS_DIR.to_string()),
            images_dir: env::var("BLOGSYNC_IMAGES_DIR")
                .unwrap_or_else(|_| DEFAULT_IMAGES_DIR.to_string()),
            http_timeout_secs: env::var("BLOGSYNC_HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| DEFAULT_HTTP_TIMEOUT_SECS.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("BLOGSYNC_HTTP_TIMEOUT_SECS must be a valid number"))?,
            strict_revision_lookup: env::var("BLOGSYNC_STRICT_REVISION_LOOKUP")
                .unwrap_or_else(|_| "false".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(false),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.location.owner.trim().is_empty() || self.location.repo.trim().is_empty() {
            return Err(anyhow::anyhow!("Repository owner and name must not be empty"));
        }

        if self.location.branch.trim().is_empty() {
            return Err(anyhow::anyhow!("BLOGSYNC_BRANCH must not be empty"));
        }

        if self.backend == BackendKind::GitHub {
            for (name, url) in [
                ("BLOGSYNC_API_URL", &self.api_base_url),
                ("BLOGSYNC_RAW_URL", &self.raw_base_url),
            ] {
                if !url.starts_with("http://") && !url.starts_with("https://") {
                    return Err(anyhow::anyhow!("{} must be an http(s) URL", name));
                }
            }
        }

        if self.http_timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "BLOGSYNC_HTTP_TIMEOUT_SECS must be greater than zero"
            ));
        }

        RemotePath::parse(&self.posts_dir)
            .map_err(|e| anyhow::anyhow!("BLOGSYNC_POSTS_DIR is not a valid path: {}", e))?;
        let images = RemotePath::parse(&self.images_dir)
            .map_err(|e| anyhow::anyhow!("BLOGSYNC_IMAGES_DIR is not a valid path: {}", e))?;
        if images.is_root() {
            return Err(anyhow::anyhow!("BLOGSYNC_IMAGES_DIR must not be the repository root"));
        }

        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn posts_root(&self) -> RemotePath {
        RemotePath::parse(&self.posts_dir).unwrap_or_else(|_| RemotePath::root())
    }

    pub fn images_root(&self) -> RemotePath {
        RemotePath::parse(&self.images_dir).unwrap_or_else(|_| RemotePath::root())
    }
}
