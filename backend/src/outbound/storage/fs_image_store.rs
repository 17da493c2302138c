//! Filesystem adapter for the `ImageStore` port.
//!
//! Bytes are written verbatim under random hex names inside a configured
//! directory; no resizing or re-encoding happens here. Blocking filesystem
//! work runs on the tokio blocking pool.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use rand::RngCore;

use crate::domain::ports::{ImageFormat, ImageStore, ImageStoreError};

/// Stores uploaded images as files in one directory.
#[derive(Clone)]
pub struct FsImageStore {
    root: PathBuf,
}

impl FsImageStore {
    /// Create the store, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, ImageStoreError> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .map_err(|err| ImageStoreError::unavailable(format!("create uploads dir: {err}")))?;
        Ok(Self { root })
    }

    fn random_name(format: ImageFormat) -> String {
        let mut bytes = [0_u8; 8];
        rand::thread_rng().fill_bytes(&mut bytes);
        format!("{}.{}", hex::encode(bytes), format.extension())
    }
}

/// Reject names that could escape the uploads directory.
fn is_plain_file_name(name: &str) -> bool {
    let path = Path::new(name);
    let mut components = path.components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[async_trait]
impl ImageStore for FsImageStore {
    async fn store(&self, bytes: &[u8], format: ImageFormat) -> Result<String, ImageStoreError> {
        let name = Self::random_name(format);
        let path = self.root.join(&name);
        let payload = bytes.to_vec();

        tokio::task::spawn_blocking(move || std::fs::write(path, payload))
            .await
            .map_err(|err| ImageStoreError::unavailable(format!("storage task failed: {err}")))?
            .map_err(|err| ImageStoreError::unavailable(format!("write image: {err}")))?;

        Ok(name)
    }

    async fn load(&self, name: &str) -> Result<Option<Vec<u8>>, ImageStoreError> {
        if !is_plain_file_name(name) {
            return Ok(None);
        }
        let path = self.root.join(name);

        let read = tokio::task::spawn_blocking(move || std::fs::read(path))
            .await
            .map_err(|err| ImageStoreError::unavailable(format!("storage task failed: {err}")))?;

        match read {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(ImageStoreError::unavailable(format!("read image: {err}"))),
        }
    }
}
