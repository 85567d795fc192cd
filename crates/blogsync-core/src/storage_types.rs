use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Content backend types
///
/// `GitHub` talks to the real contents API and raw CDN. `Memory` keeps the
/// whole tree in process and is used for tests and dry runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    GitHub,
    Memory,
}

impl FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "github" => Ok(BackendKind::GitHub),
            "memory" => Ok(BackendKind::Memory),
            _ => Err(anyhow::anyhow!("Invalid content backend: {}", s)),
        }
    }
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            BackendKind::GitHub => write!(f, "github"),
            BackendKind::Memory => write!(f, "memory"),
        }
    }
}
