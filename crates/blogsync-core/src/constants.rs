//! Defaults shared by configuration and the backends.

pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_RAW_URL: &str = "https://raw.githubusercontent.com";
pub const DEFAULT_POSTS_DIR: &str = "posts";
pub const DEFAULT_IMAGES_DIR: &str = "images";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Extension given to sequencer-named posts.
pub const POST_EXTENSION: &str = "md";

/// Query parameter appended to raw reads to defeat the CDN cache.
pub const CACHE_BUST_PARAM: &str = "t";

pub const USER_AGENT: &str = concat!("blogsync/", env!("CARGO_PKG_VERSION"));
