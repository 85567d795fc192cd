use std::fmt::{Debug, Formatter, Result as FmtResult};

/// Bearer token supplied by the caller for a single write or upload.
///
/// Never generated, validated or stored by blogsync. `Debug` output is
/// redacted so the token cannot leak into logs.
#[derive(Clone)]
pub struct Credentials(String);

impl Credentials {
    pub fn new(token: impl Into<String>) -> Self {
        Credentials(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str("Credentials(***)")
    }
}
