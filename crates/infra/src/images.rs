//! Filesystem storage for uploaded product images.

use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

use catalog_core::DomainError;
use catalog_products::{ALLOWED_IMAGE_EXTENSIONS, MAX_IMAGE_BYTES};

/// Failure while accepting an uploaded image.
#[derive(Debug, Error)]
pub enum ImageStoreError {
    /// The upload violated an image constraint.
    #[error(transparent)]
    Invalid(#[from] DomainError),

    #[error("io error: {0}")]
    Io(String),
}

/// Writes uploaded images under a fixed directory and hands back their
/// public-relative path.
///
/// Each upload gets a fresh UUIDv7 filename (original extension preserved,
/// lowercased), so concurrent uploads never collide on the filesystem.
pub struct ImageStore {
    upload_dir: PathBuf,
}

impl ImageStore {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }

    /// Validate and persist one uploaded file, returning `/images/<name>`.
    ///
    /// The constraint checks here deliberately repeat the domain-level image
    /// validation: this is the upload-handling boundary and enforces the same
    /// limits on its own.
    pub async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<String, ImageStoreError> {
        if file_name.is_empty() || bytes.is_empty() {
            return Err(DomainError::MissingImage.into());
        }

        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        let extension = match extension {
            Some(ext) if ALLOWED_IMAGE_EXTENSIONS.contains(&ext.as_str()) => ext,
            _ => return Err(DomainError::InvalidImageFormat.into()),
        };

        if bytes.len() as u64 > MAX_IMAGE_BYTES {
            return Err(DomainError::ImageTooLarge.into());
        }

        let generated = format!("{}.{}", Uuid::now_v7(), extension);
        let target = self.upload_dir.join(&generated);

        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(|e| ImageStoreError::Io(e.to_string()))?;
        tokio::fs::write(&target, bytes)
            .await
            .map_err(|e| ImageStoreError::Io(e.to_string()))?;

        Ok(format!("/images/{generated}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, ImageStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn saves_and_returns_public_path() {
        let (dir, store) = store();
        let path = store.save("photo.PNG", b"fake image bytes").await.unwrap();

        assert!(path.starts_with("/images/"));
        assert!(path.ends_with(".png"));

        let on_disk = dir.path().join(path.trim_start_matches("/images/"));
        assert_eq!(std::fs::read(on_disk).unwrap(), b"fake image bytes");
    }

    #[tokio::test]
    async fn identical_uploads_get_distinct_names() {
        let (_dir, store) = store();
        let a = store.save("photo.jpg", b"same bytes").await.unwrap();
        let b = store.save("photo.jpg", b"same bytes").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn rejects_disallowed_extension() {
        let (_dir, store) = store();
        let err = store.save("photo.gif", b"bytes").await.unwrap_err();
        assert!(matches!(err, ImageStoreError::Invalid(DomainError::InvalidImageFormat)));
    }

    #[tokio::test]
    async fn rejects_empty_upload() {
        let (_dir, store) = store();
        let err = store.save("photo.png", b"").await.unwrap_err();
        assert!(matches!(err, ImageStoreError::Invalid(DomainError::MissingImage)));

        let err = store.save("", b"bytes").await.unwrap_err();
        assert!(matches!(err, ImageStoreError::Invalid(DomainError::MissingImage)));
    }

    #[tokio::test]
    async fn size_cap_is_inclusive() {
        let (_dir, store) = store();

        let at_cap = vec![0u8; MAX_IMAGE_BYTES as usize];
        assert!(store.save("photo.png", &at_cap).await.is_ok());

        let over_cap = vec![0u8; MAX_IMAGE_BYTES as usize + 1];
        let err = store.save("photo.png", &over_cap).await.unwrap_err();
        assert!(matches!(err, ImageStoreError::Invalid(DomainError::ImageTooLarge)));
    }
}
