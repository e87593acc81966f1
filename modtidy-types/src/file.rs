use crate::protocol::VersionedTextDocumentIdentifier;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

const FILE_SCHEME: &str = "file://";

/// Document URI, e.g. `file:///work/m/go.mod`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileUri(String);

impl FileUri {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn from_path(path: &Utf8Path) -> Self {
        Self(format!("{FILE_SCHEME}{path}"))
    }

    /// Filesystem path for `file://` URIs.
    pub fn to_path(&self) -> Option<Utf8PathBuf> {
        self.0.strip_prefix(FILE_SCHEME).map(Utf8PathBuf::from)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FileUri {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Stable key for one observed state of a file: its URI plus a content hash.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FileIdentity {
    pub uri: FileUri,
    pub sha256: String,
}

/// A file as seen by the snapshot at read time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    pub uri: FileUri,
    /// Bumped by the snapshot whenever the content changes.
    pub version: i32,
    pub content: String,
}

impl FileHandle {
    pub fn new(uri: FileUri, version: i32, content: impl Into<String>) -> Self {
        Self {
            uri,
            version,
            content: content.into(),
        }
    }

    pub fn identity(&self) -> FileIdentity {
        FileIdentity {
            uri: self.uri.clone(),
            sha256: sha256_hex(self.content.as_bytes()),
        }
    }

    pub fn versioned_id(&self) -> VersionedTextDocumentIdentifier {
        VersionedTextDocumentIdentifier {
            uri: self.uri.clone(),
            version: self.version,
        }
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
