use std::collections::BTreeMap;
use std::path::PathBuf;

/// Byte-blob reference table keyed by path. Definition documents (endpoint
/// templates, response templates, sub-orchestration references) stay out of
/// the declarative graph and are resolved through this table at build time.
pub trait AssetStore: Send + Sync {
    fn get(&self, path: &str) -> Result<Vec<u8>, AssetError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    NotFound(String),
    #[error("failed to read asset {path}: {message}")]
    Io { path: String, message: String },
}

#[derive(Default)]
pub struct MemoryAssetStore {
    blobs: BTreeMap<String, Vec<u8>>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, blob: impl Into<Vec<u8>>) -> &mut Self {
        self.blobs.insert(path.into(), blob.into());
        self
    }
}

impl AssetStore for MemoryAssetStore {
    fn get(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        self.blobs
            .get(path)
            .cloned()
            .ok_or_else(|| AssetError::NotFound(path.to_string()))
    }
}

/// Reads assets relative to a root directory; the loader the CLI wires in.
pub struct FsAssetStore {
    root: PathBuf,
}

impl FsAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetStore for FsAssetStore {
    fn get(&self, path: &str) -> Result<Vec<u8>, AssetError> {
        let full = self.root.join(path);
        std::fs::read(&full).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AssetError::NotFound(path.to_string())
            } else {
                AssetError::Io {
                    path: path.to_string(),
                    message: e.to_string(),
                }
            }
        })
    }
}
