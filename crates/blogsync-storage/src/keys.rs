//! Shared path generation for uploaded assets.
//!
//! Path format: `{images_dir}/{folder}/{millis}-{file_name}`. The millisecond
//! prefix keeps two uploads of the same file name apart without checking the
//! remote first.

use std::sync::atomic::{AtomicI64, Ordering};

use blogsync_core::path_codec::{encode_coordinate, encode_segment};
use blogsync_core::{RemoteLocation, RemotePath, StoreError, StoreResult};
use chrono::Utc;

/// Wall-clock milliseconds that never repeat or go backwards within one
/// instance. Two processes can still draw the same value.
#[derive(Debug, Default)]
pub struct MonotonicMillis {
    last: AtomicI64,
}

impl MonotonicMillis {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let previous = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or(now);
        now.max(previous + 1)
    }
}

/// Generate the storage path for an uploaded asset.
///
/// `folder_name` and `file_name` must each be a single path segment.
pub fn asset_path(
    images_root: &RemotePath,
    folder_name: &str,
    file_name: &str,
    millis: i64,
) -> StoreResult<RemotePath> {
    if file_name.trim().is_empty() {
        return Err(StoreError::EncodingFailure(
            "asset file name must not be empty".to_string(),
        ));
    }
    images_root
        .join(folder_name)?
        .join(&format!("{}-{}", millis, file_name))
}

/// Raw endpoint prefix for a branch: `{raw_base}/{owner}/{repo}/{branch}`.
pub fn raw_branch_base(raw_base_url: &str, location: &RemoteLocation) -> String {
    format!(
        "{}/{}/{}/{}",
        raw_base_url.trim_end_matches('/'),
        encode_segment(&location.owner),
        encode_segment(&location.repo),
        encode_coordinate(&location.branch)
    )
}

/// Raw endpoint URL of a file, encoded per segment.
pub fn raw_file_url(raw_base_url: &str, location: &RemoteLocation, path: &RemotePath) -> String {
    format!(
        "{}/{}",
        raw_branch_base(raw_base_url, location),
        path.encode_for_raw()
    )
}
