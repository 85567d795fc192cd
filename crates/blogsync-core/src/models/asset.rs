use serde::{Deserialize, Serialize};

/// A binary payload destined for the asset namespace.
#[derive(Debug, Clone)]
pub struct AssetUpload {
    pub bytes: Vec<u8>,
    /// Display filename as chosen by the user
    pub file_name: String,
    /// Folder inside the asset namespace, usually one per post
    pub folder_name: String,
}

impl AssetUpload {
    pub fn new(bytes: Vec<u8>, file_name: impl Into<String>, folder_name: impl Into<String>) -> Self {
        Self {
            bytes,
            file_name: file_name.into(),
            folder_name: folder_name.into(),
        }
    }
}

/// Where an uploaded asset can be read back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetReference {
    /// Logical repository path of the stored file
    pub path: String,
    /// Fully qualified raw URL, encoded per segment, ready to embed in a post
    pub url: String,
}

/// A downloaded file with the name it should be saved under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}
