//! Image uploads stored on the local filesystem.
//!
//! Files land under `<upload_dir>/img/<kind>/<uuid>.<ext>` and are referenced
//! by that relative path, which is also the URL path below `/storage`.

use std::path::{Component, Path, PathBuf};

use axum::body::Bytes;
use thiserror::Error;
use uuid::Uuid;

/// Extensions accepted for every image field.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Errors that can occur while storing an upload.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The file has no usable extension.
    #[error("unsupported file type")]
    UnsupportedType,
}

/// Which image collection an upload belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Avatar,
    Category,
    Item,
}

impl ImageKind {
    /// Directory relative to the upload root.
    #[must_use]
    pub const fn dir(self) -> &'static str {
        match self {
            Self::Avatar => "img/avatars",
            Self::Category => "img/categories",
            Self::Item => "img/items",
        }
    }
}

/// A file received in a multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadedFile {
    /// Lowercased extension of the client-supplied file name.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
    }

    /// Whether the extension is one of [`IMAGE_EXTENSIONS`].
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.extension()
            .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
    }

    /// Size in kilobytes, rounded up.
    #[must_use]
    pub fn size_kb(&self) -> usize {
        self.bytes.len().div_ceil(1024)
    }
}

/// Writes uploads below a root directory.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self { root }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store `file` under a random name and return its relative path.
    ///
    /// # Errors
    ///
    /// Returns `UploadError` if the file has no extension or cannot be written.
    pub async fn store(&self, kind: ImageKind, file: &UploadedFile) -> Result<String, UploadError> {
        let ext = file.extension().ok_or(UploadError::UnsupportedType)?;
        let relative = format!("{}/{}.{ext}", kind.dir(), Uuid::new_v4());

        let path = self.root.join(&relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &file.bytes).await?;

        tracing::info!(path = %relative, bytes = file.bytes.len(), "Stored upload");
        Ok(relative)
    }

    /// Remove a previously stored file. Missing files and paths outside the
    /// image directories are ignored.
    pub async fn remove(&self, relative: &str) {
        if !is_managed_path(relative) {
            return;
        }
        match tokio::fs::remove_file(self.root.join(relative)).await {
            Ok(()) => tracing::info!(path = %relative, "Removed upload"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %relative, error = %e, "Failed to remove upload"),
        }
    }
}

/// A relative path inside `img/` with no traversal.
fn is_managed_path(relative: &str) -> bool {
    let path = Path::new(relative);
    relative.starts_with("img/") && path.components().all(|c| matches!(c, Component::Normal(_)))
}
