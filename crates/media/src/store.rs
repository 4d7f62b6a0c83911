use std::path::{Path, PathBuf};

use crate::error::{Context, Result};

/// Local directory the transport downloads photos and documents into.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Destination for a downloaded file. Only the final path component of
    /// `name` is used.
    #[must_use]
    pub fn path_for(&self, name: &str) -> PathBuf {
        let file_name = Path::new(name)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .unwrap_or("download");
        self.root.join(file_name)
    }

    /// Create the directory if missing.
    pub async fn prepare(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("failed to create {}", self.root.display()))
    }
}
