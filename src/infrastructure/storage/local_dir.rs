//! Object storage over a local directory tree: `<root>/<bucket>/<path>`.

use crate::domain::ports::ObjectStorage;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

pub struct LocalDirObjectStorage {
    root: PathBuf,
}

impl LocalDirObjectStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, bucket: &str, path: &str) -> Result<PathBuf> {
        let relative = Path::new(bucket).join(path);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            anyhow::bail!("Refusing object path outside storage root: {}/{}", bucket, path);
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStorage for LocalDirObjectStorage {
    async fn download(&self, bucket: &str, path: &str) -> Result<Vec<u8>> {
        let file = self.resolve(bucket, path)?;
        let bytes = tokio::fs::read(&file)
            .await
            .with_context(|| format!("Failed to read object {:?}", file))?;
        debug!("LocalDirObjectStorage: read {} bytes from {:?}", bytes.len(), file);
        Ok(bytes)
    }
}
