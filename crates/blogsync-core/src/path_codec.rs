//! Path codec
//!
//! A `RemotePath` always holds the logical (decoded) form of a repository
//! path. Wire forms are produced from it per request and are never fed back
//! into the encoder, so a path reused across the API and raw endpoints cannot
//! be encoded twice. Turn a wire string back into a path with
//! [`RemotePath::from_wire`].

use std::fmt::{Display, Formatter, Result as FmtResult};

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::{StoreError, StoreResult};

/// Everything except the RFC 3986 unreserved characters is escaped, which
/// includes the `/` separator when it appears inside a single segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// A validated, logical repository path. The empty path is the root.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RemotePath(String);

impl RemotePath {
    pub fn root() -> Self {
        RemotePath(String::new())
    }

    /// Parse a logical path. Leading and trailing separators are ignored;
    /// empty, `.` and `..` segments are rejected.
    pub fn parse(logical: &str) -> StoreResult<Self> {
        let trimmed = logical.trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        for segment in trimmed.split('/') {
            validate_segment(segment, logical)?;
        }
        Ok(RemotePath(trimmed.to_string()))
    }

    /// Parse a percent-encoded wire path back into its logical form.
    pub fn from_wire(wire: &str) -> StoreResult<Self> {
        let trimmed = wire.trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        let mut decoded = Vec::new();
        for segment in trimmed.split('/') {
            let segment = decode_segment(segment)?;
            validate_segment(&segment, wire)?;
            decoded.push(segment);
        }
        Ok(RemotePath(decoded.join("/")))
    }

    /// Append exactly one segment. A `/` inside `segment` is an error, not a
    /// nested path.
    pub fn join(&self, segment: &str) -> StoreResult<Self> {
        validate_segment(segment, segment)?;
        if self.is_root() {
            Ok(RemotePath(segment.to_string()))
        } else {
            Ok(RemotePath(format!("{}/{}", self.0, segment)))
        }
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Last segment, or `None` for the root.
    pub fn file_name(&self) -> Option<&str> {
        self.segments().last()
    }

    pub fn parent(&self) -> Option<RemotePath> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(idx) => Some(RemotePath(self.0[..idx].to_string())),
            None => Some(Self::root()),
        }
    }

    /// Wire form for the metadata/contents API.
    pub fn encode_for_api(&self) -> String {
        encode_segments(self.segments())
    }

    /// Wire form for the raw content endpoint.
    pub fn encode_for_raw(&self) -> String {
        encode_segments(self.segments())
    }
}

impl Display for RemotePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for RemotePath {
    type Error = StoreError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        RemotePath::parse(value)
    }
}

fn validate_segment(segment: &str, whole: &str) -> StoreResult<()> {
    if segment.is_empty() || segment.contains('/') {
        return Err(StoreError::EncodingFailure(format!(
            "empty or nested path segment in {:?}",
            whole
        )));
    }
    if segment == "." || segment == ".." {
        return Err(StoreError::EncodingFailure(format!(
            "relative path segment in {:?}",
            whole
        )));
    }
    if segment.chars().any(char::is_control) {
        return Err(StoreError::EncodingFailure(format!(
            "control character in path {:?}",
            whole
        )));
    }
    Ok(())
}

fn encode_segments<'a>(segments: impl Iterator<Item = &'a str>) -> String {
    segments.map(encode_segment).collect::<Vec<_>>().join("/")
}

/// Percent-encode a single segment.
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

/// Encode a `/`-separated coordinate (such as a branch name) segment by segment.
pub fn encode_coordinate(value: &str) -> String {
    encode_segments(value.split('/').filter(|s| !s.is_empty()))
}

fn decode_segment(segment: &str) -> StoreResult<String> {
    percent_decode_str(segment)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| {
            StoreError::EncodingFailure(format!("{:?} does not decode to UTF-8: {}", segment, e))
        })
}

/// Encode a logical path for the metadata/contents API.
pub fn encode_for_api(path: &str) -> StoreResult<String> {
    Ok(RemotePath::parse(path)?.encode_for_api())
}

/// Encode a logical path for the raw content endpoint.
pub fn encode_for_raw(path: &str) -> StoreResult<String> {
    Ok(RemotePath::parse(path)?.encode_for_raw())
}

/// Decode the final segment of a wire path (or a lone segment) into the
/// name a user should see, e.g. in a save dialog.
pub fn decode_display_name(wire: &str) -> StoreResult<String> {
    let last = wire
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();
    decode_segment(last)
}
