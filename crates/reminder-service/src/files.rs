//! Local filesystem file store

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

use reminder_core::FileStore;

/// File store backed by a directory on the local filesystem.
///
/// Release failures are logged and swallowed: a missing file must never
/// block the entity operation that triggered the release.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    /// Create a new LocalFileStore rooted at the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a stored path against the root, rejecting anything that
    /// would escape it.
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return None;
        }
        Some(self.root.join(relative))
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn release(&self, path: &str) {
        let Some(full_path) = self.resolve(path) else {
            warn!(path, "refusing to release path outside the files root");
            return;
        };

        match tokio::fs::remove_file(&full_path).await {
            Ok(()) => debug!(path = %full_path.display(), "released file"),
            Err(e) => warn!(path = %full_path.display(), error = %e, "file release failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_stays_under_root() {
        let store = LocalFileStore::new("/srv/files");
        assert_eq!(
            store.resolve("photos/1.jpg"),
            Some(PathBuf::from("/srv/files/photos/1.jpg"))
        );
        // absolute stored paths are treated as root-relative
        assert_eq!(
            store.resolve("/photos/1.jpg"),
            Some(PathBuf::from("/srv/files/photos/1.jpg"))
        );
        assert_eq!(store.resolve("../etc/passwd"), None);
    }

    #[tokio::test]
    async fn test_release_removes_file_and_tolerates_missing() {
        let dir = std::env::temp_dir().join(format!("reminder-files-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let store = LocalFileStore::new(&dir);

        tokio::fs::write(dir.join("photo.jpg"), b"data").await.unwrap();
        store.release("photo.jpg").await;
        assert!(!dir.join("photo.jpg").exists());

        // second release of the same path must not panic
        store.release("photo.jpg").await;

        tokio::fs::remove_dir_all(&dir).await.ok();
    }
}
