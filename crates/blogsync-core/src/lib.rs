//! Blogsync Core Library
//!
//! This crate provides the domain models, error types, configuration and the
//! encoding rules (path codec, transport encoding, post naming) shared by every
//! blogsync component. Nothing in here performs I/O.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod path_codec;
pub mod sequence;
pub mod storage_types;
pub mod transcode;

// Re-export commonly used types
pub use config::{ClientConfig, RemoteLocation};
pub use error::{ErrorKind, ErrorMetadata, LogLevel, StoreError, StoreResult};
pub use models::{
    AssetReference, AssetUpload, AutoFilename, CommitResult, ContentEntry, Credentials,
    DownloadedFile, EntryKind, PostDocument, RevisionToken, TreeEntry,
};
pub use path_codec::RemotePath;
pub use storage_types::BackendKind;
