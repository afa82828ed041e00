use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::error::AppError;

/// StoredFile
///
/// The result of persisting one uploaded file: the generated filename and
/// the public URL that gets written into database rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub filename: String,
    pub url: String,
    pub size: usize,
}

/// StorageService
///
/// Abstract contract for the upload storage layer. The disk implementation
/// is used in production; the in-memory mock isolates handler tests from the
/// filesystem.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Persists `bytes` under `folder`, generating a unique filename that
    /// keeps the original extension. Returns the stored file's public URL.
    async fn save(
        &self,
        folder: &str,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<StoredFile, AppError>;

    /// Best-effort removal of a previously stored file, addressed by its
    /// public URL. Failures are logged and swallowed: the database row is
    /// authoritative and a stale file on disk is acceptable.
    async fn remove_by_url(&self, folder: &str, url: &str);
}

/// StorageState
///
/// The concrete type used to share the storage service across the
/// application state.
pub type StorageState = Arc<dyn StorageService>;

/// file_extension
///
/// Derives a safe extension from the client-supplied filename, falling back
/// to "bin" when none is present.
fn file_extension(original_name: &str) -> &str {
    std::path::Path::new(original_name)
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("bin")
}

/// url_filename
///
/// Extracts the trailing path segment of a stored URL and rejects anything
/// that could navigate out of the upload folder.
fn url_filename(url: &str) -> Option<&str> {
    let name = url.rsplit('/').next()?;
    if name.is_empty() || name == "." || name == ".." || name.contains('\\') {
        return None;
    }
    Some(name)
}

/// DiskStorage
///
/// Stores uploads under `<root>/<folder>/<uuid>.<ext>` and serves them back
/// through the static `/uploads` route. Folders are created on demand.
#[derive(Clone)]
pub struct DiskStorage {
    root: PathBuf,
    base_url: String,
}

impl DiskStorage {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl StorageService for DiskStorage {
    async fn save(
        &self,
        folder: &str,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<StoredFile, AppError> {
        let filename = format!("{}.{}", Uuid::new_v4(), file_extension(original_name));
        let dir = self.root.join(folder);

        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            tracing::error!("failed to create upload dir {:?}: {:?}", dir, e);
            AppError::Internal
        })?;

        let path = dir.join(&filename);
        tokio::fs::write(&path, bytes).await.map_err(|e| {
            tracing::error!("failed to write upload {:?}: {:?}", path, e);
            AppError::Internal
        })?;

        Ok(StoredFile {
            url: format!("{}/uploads/{}/{}", self.base_url, folder, filename),
            filename,
            size: bytes.len(),
        })
    }

    async fn remove_by_url(&self, folder: &str, url: &str) {
        let Some(filename) = url_filename(url) else {
            tracing::warn!(%url, "skipping file cleanup for unparseable url");
            return;
        };

        let path = self.root.join(folder).join(filename);
        if let Err(e) = tokio::fs::remove_file(&path).await {
            // Non-fatal by policy: the row has already moved on.
            tracing::warn!("failed to remove stale upload {:?}: {:?}", path, e);
        }
    }
}

// --- Mock Implementation (For Tests) ---

/// MockStorageService
///
/// Records every save/remove instead of touching the filesystem, so handler
/// tests can assert on upload and cleanup behavior.
#[derive(Default)]
pub struct MockStorageService {
    /// When true, all save operations return a simulated failure.
    pub should_fail: bool,
    pub saved: Mutex<Vec<StoredFile>>,
    pub removed: Mutex<Vec<String>>,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn saved_urls(&self) -> Vec<String> {
        self.saved
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|f| f.url.clone())
            .collect()
    }

    pub fn removed_urls(&self) -> Vec<String> {
        self.removed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn save(
        &self,
        folder: &str,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<StoredFile, AppError> {
        if self.should_fail {
            return Err(AppError::Internal);
        }
        let filename = format!("{}.{}", Uuid::new_v4(), file_extension(original_name));
        let stored = StoredFile {
            url: format!("http://localhost:8000/uploads/{}/{}", folder, filename),
            filename,
            size: bytes.len(),
        };
        self.saved
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(stored.clone());
        Ok(stored)
    }

    async fn remove_by_url(&self, _folder: &str, url: &str) {
        self.removed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(url.to_string());
    }
}
