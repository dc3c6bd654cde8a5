//! Storage for player photos captured during onboarding.
//!
//! Photos are addressed by an opaque `photo_ref` of the form `uploads/<uuid>.<ext>`. The
//! generated file name only avoids collisions; it is not an access-control mechanism.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use axum::body::Bytes;
use futures::future::BoxFuture;
use tokio::fs;
use uuid::Uuid;

use crate::dao::storage::{StorageError, StorageResult};

/// Prefix shared by every photo reference handed out by the store.
pub const PHOTO_REF_PREFIX: &str = "uploads/";

/// Abstraction over the place where uploaded photos are kept.
pub trait PhotoStore: Send + Sync {
    /// Persist `bytes` under `generated_name` and return the reference to serve it later.
    fn save(&self, bytes: Bytes, generated_name: String) -> BoxFuture<'static, StorageResult<String>>;
    /// Read back a photo previously returned by [`PhotoStore::save`].
    fn load(&self, photo_ref: String) -> BoxFuture<'static, StorageResult<Option<Bytes>>>;
}

/// Build a fresh storage name for an upload; only the (already validated) extension is kept.
pub fn generate_photo_name(extension: &str) -> String {
    format!("{}.{}", Uuid::new_v4(), extension.to_ascii_lowercase())
}

/// Build the public reference for a stored file name.
pub fn photo_ref_for(file_name: &str) -> String {
    format!("{PHOTO_REF_PREFIX}{file_name}")
}

/// Extract the stored file name from a reference, rejecting anything we could not have generated.
pub fn file_name_from_ref(photo_ref: &str) -> Option<&str> {
    let file_name = photo_ref.strip_prefix(PHOTO_REF_PREFIX)?;
    is_generated_name(file_name).then_some(file_name)
}

/// Whether `file_name` has the `<uuid>.<ext>` shape produced by [`generate_photo_name`].
pub fn is_generated_name(file_name: &str) -> bool {
    let Some((stem, extension)) = file_name.rsplit_once('.') else {
        return false;
    };

    Uuid::parse_str(stem).is_ok()
        && !extension.is_empty()
        && extension.chars().all(|c| c.is_ascii_alphanumeric())
}

/// MIME type used when serving a stored photo.
pub fn content_type_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Photo store writing files into a local directory.
#[derive(Clone)]
pub struct FsPhotoStore {
    root: Arc<PathBuf>,
}

impl FsPhotoStore {
    /// Create the upload directory if needed and return a store rooted there.
    pub async fn open(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await.map_err(|err| {
            StorageError::unavailable(
                format!("cannot create upload directory `{}`", root.display()),
                err,
            )
        })?;

        Ok(Self {
            root: Arc::new(root),
        })
    }
}

impl PhotoStore for FsPhotoStore {
    fn save(&self, bytes: Bytes, generated_name: String) -> BoxFuture<'static, StorageResult<String>> {
        let root = self.root.clone();
        Box::pin(async move {
            if !is_generated_name(&generated_name) {
                return Err(StorageError::unavailable(
                    format!("refusing to store photo under `{generated_name}`"),
                    std::io::Error::from(ErrorKind::InvalidInput),
                ));
            }

            let path = root.join(&generated_name);
            fs::write(&path, &bytes).await.map_err(|err| {
                StorageError::unavailable(format!("cannot write `{}`", path.display()), err)
            })?;

            Ok(photo_ref_for(&generated_name))
        })
    }

    fn load(&self, photo_ref: String) -> BoxFuture<'static, StorageResult<Option<Bytes>>> {
        let root = self.root.clone();
        Box::pin(async move {
            let Some(file_name) = file_name_from_ref(&photo_ref) else {
                return Ok(None);
            };

            let path = root.join(file_name);
            match fs::read(&path).await {
                Ok(contents) => Ok(Some(Bytes::from(contents))),
                Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
                Err(err) => Err(StorageError::unavailable(
                    format!("cannot read `{}`", path.display()),
                    err,
                )),
            }
        })
    }
}
