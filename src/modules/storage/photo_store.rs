use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

/// Flat-file store over the photos directory.
///
/// No metadata is kept anywhere else; directory contents are the source of
/// truth. Every operation ensures the directory exists first, so a freshly
/// deployed instance works without manual setup.
#[derive(Debug, Clone)]
pub struct PhotoStore {
    base_dir: PathBuf,
}

impl PhotoStore {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub async fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.base_dir).await
    }

    /// Filenames currently in the store, in directory iteration order.
    /// Subdirectories and non-UTF-8 names are skipped.
    pub async fn list(&self) -> io::Result<Vec<String>> {
        self.ensure_dir().await?;

        let mut names = Vec::new();
        let mut entries = fs::read_dir(&self.base_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }

        Ok(names)
    }

    pub async fn put(&self, file_name: &str, data: &[u8]) -> io::Result<()> {
        self.ensure_dir().await?;

        let path = self.base_dir.join(file_name);
        fs::write(&path, data).await?;
        debug!("Photo written: {}", path.display());

        Ok(())
    }
}
