//! Data models
//!
//! Values exchanged between the client, the backends and callers. None of them
//! is persisted locally.

mod asset;
mod content;
mod credentials;
mod post;

pub use asset::*;
pub use content::*;
pub use credentials::*;
pub use post::*;
