use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

/// Opaque fingerprint of a path's byte content on the remote branch.
///
/// Only used to gate a single write; never cached across write attempts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionToken(String);

impl RevisionToken {
    pub fn new(value: impl Into<String>) -> Self {
        RevisionToken(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RevisionToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    Submodule,
}

impl EntryKind {
    /// Map the remote `type` field. Tree listings say `blob`/`tree`/`commit`.
    pub fn from_remote(value: &str) -> Option<Self> {
        match value {
            "file" | "blob" => Some(EntryKind::File),
            "dir" | "tree" => Some(EntryKind::Dir),
            "symlink" => Some(EntryKind::Symlink),
            "submodule" | "commit" => Some(EntryKind::Submodule),
            _ => None,
        }
    }
}

/// A discovered directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEntry {
    pub name: String,
    /// Full logical path from the repository root
    pub path: String,
    pub kind: EntryKind,
    /// Size hint in bytes (0 for directories)
    pub size: u64,
    pub revision: Option<RevisionToken>,
    pub download_url: Option<String>,
}

impl ContentEntry {
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }
}

/// One path of the recursive repository tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    pub kind: EntryKind,
    pub size: Option<u64>,
}
