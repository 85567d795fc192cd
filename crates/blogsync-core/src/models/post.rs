use std::fmt::{Display, Formatter, Result as FmtResult};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::RevisionToken;
use crate::sequence::date_prefix;

/// The logical unit being edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDocument {
    pub path: String,
    pub content: String,
    /// Revision observed when the document was loaded; `None` for new posts
    pub revision: Option<RevisionToken>,
}

impl PostDocument {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            revision: None,
        }
    }

    pub fn is_new(&self) -> bool {
        self.revision.is_none()
    }
}

/// Outcome of a successful write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitResult {
    pub path: String,
    /// Revision of the content just written
    pub revision: RevisionToken,
    pub commit_sha: Option<String>,
    pub message: String,
    /// `true` when no prior revision was submitted
    pub created: bool,
}

/// A generated post name: `<date>-0x<hex>.<ext>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoFilename {
    pub date: NaiveDate,
    pub sequence: u64,
    pub extension: String,
}

impl Display for AutoFilename {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{}-0x{:04x}.{}",
            date_prefix(self.date),
            self.sequence,
            self.extension
        )
    }
}
