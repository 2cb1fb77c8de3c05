use crate::domain::errors::PipelineError;
use crate::domain::ports::ObjectStorage;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Where a model artifact lives in object storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLocation {
    pub bucket: String,
    pub path: String,
}

impl ArtifactLocation {
    pub fn new(bucket: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            path: path.into(),
        }
    }

    /// Last path segment, used as the local file name.
    pub fn file_name(&self) -> &str {
        self.path
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or("artifact")
    }

    fn unavailable(&self, reason: impl Into<String>) -> PipelineError {
        PipelineError::ArtifactUnavailable {
            bucket: self.bucket.clone(),
            path: self.path.clone(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ArtifactLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.path)
    }
}

/// A downloaded artifact on local disk.
///
/// The file lives in a directory private to this handle; the directory is
/// removed when the handle is dropped.
#[derive(Debug)]
pub struct LocalArtifact {
    location: ArtifactLocation,
    dir: PathBuf,
    file: PathBuf,
}

impl LocalArtifact {
    pub fn path(&self) -> &Path {
        &self.file
    }

    pub fn location(&self) -> &ArtifactLocation {
        &self.location
    }
}

impl Drop for LocalArtifact {
    // Blocking removal: the directory holds a single artifact file.
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.dir) {
            warn!("Failed to remove scratch directory {:?}: {}", self.dir, e);
        }
    }
}

/// Fetches model artifacts from object storage into a scratch area.
///
/// Nothing is cached: every call downloads the artifact again, so a model
/// replaced in the bucket is picked up by the next request.
#[derive(Clone)]
pub struct ModelRepository {
    storage: Arc<dyn ObjectStorage>,
    scratch_root: PathBuf,
}

impl ModelRepository {
    pub fn new(storage: Arc<dyn ObjectStorage>, scratch_root: PathBuf) -> Self {
        Self {
            storage,
            scratch_root,
        }
    }

    /// Repository using `<system temp dir>/farcry-models` as scratch root.
    pub fn with_default_scratch(storage: Arc<dyn ObjectStorage>) -> Self {
        Self::new(storage, std::env::temp_dir().join("farcry-models"))
    }

    pub fn scratch_root(&self) -> &Path {
        &self.scratch_root
    }

    /// Downloads the artifact at `location` into a fresh scratch directory.
    pub async fn fetch_artifact(
        &self,
        location: &ArtifactLocation,
    ) -> Result<LocalArtifact, PipelineError> {
        debug!("Downloading model artifact {}", location);

        let bytes = self
            .storage
            .download(&location.bucket, &location.path)
            .await
            .map_err(|e| location.unavailable(format!("{:#}", e)))?;

        if bytes.is_empty() {
            return Err(location.unavailable("storage returned an empty object"));
        }

        let dir = self.scratch_root.join(Uuid::new_v4().to_string());
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| location.unavailable(format!("cannot create {:?}: {}", dir, e)))?;

        // Owns the directory from here on, so a failed write still cleans up
        let artifact = LocalArtifact {
            location: location.clone(),
            file: dir.join(location.file_name()),
            dir,
        };

        tokio::fs::write(&artifact.file, &bytes)
            .await
            .map_err(|e| location.unavailable(format!("cannot write {:?}: {}", artifact.file, e)))?;

        info!(
            "Fetched model artifact {} ({} bytes) to {:?}",
            location,
            bytes.len(),
            artifact.file
        );
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mock::InMemoryObjectStorage;

    fn repository(storage: InMemoryObjectStorage, root: &Path) -> ModelRepository {
        ModelRepository::new(Arc::new(storage), root.to_path_buf())
    }

    #[test]
    fn test_file_name_is_last_segment() {
        let location = ArtifactLocation::new("models", "regression/btc_br_model.json");
        assert_eq!(location.file_name(), "btc_br_model.json");
        assert_eq!(location.to_string(), "models/regression/btc_br_model.json");
    }

    #[tokio::test]
    async fn test_fetch_writes_file_and_cleans_up_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let storage = InMemoryObjectStorage::new();
        storage.put("models", "regression/btc.json", b"{}".to_vec()).await;
        let repo = repository(storage, root.path());

        let artifact = repo
            .fetch_artifact(&ArtifactLocation::new("models", "regression/btc.json"))
            .await
            .unwrap();
        let path = artifact.path().to_path_buf();
        assert_eq!(std::fs::read(&path).unwrap(), b"{}");
        assert_eq!(path.file_name().unwrap(), "btc.json");

        drop(artifact);
        assert!(!path.exists());
        assert!(!path.parent().unwrap().exists());
    }

    #[tokio::test]
    async fn test_concurrent_fetches_use_separate_directories() {
        let root = tempfile::tempdir().unwrap();
        let storage = InMemoryObjectStorage::new();
        storage.put("models", "m.json", b"[1]".to_vec()).await;
        let repo = repository(storage, root.path());
        let location = ArtifactLocation::new("models", "m.json");

        let a = repo.fetch_artifact(&location).await.unwrap();
        let b = repo.fetch_artifact(&location).await.unwrap();
        assert_ne!(a.path(), b.path());

        drop(a);
        assert!(b.path().exists());
    }

    #[tokio::test]
    async fn test_missing_object_is_artifact_unavailable() {
        let root = tempfile::tempdir().unwrap();
        let repo = repository(InMemoryObjectStorage::new(), root.path());

        let err = repo
            .fetch_artifact(&ArtifactLocation::new("models", "nope.json"))
            .await
            .unwrap_err();
        match err {
            PipelineError::ArtifactUnavailable { bucket, path, .. } => {
                assert_eq!(bucket, "models");
                assert_eq!(path, "nope.json");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
