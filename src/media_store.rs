//! Media stores: where relative image filenames found in card HTML live.
//!
//! The pipeline only asks a store for one file at a time, as base64, so
//! [`MediaStore`] has a single method. Two implementations ship with the crate:
//!
//! * [`crate::anki::AnkiConnect`] — asks the running Anki instance
//!   (`retrieveMediaFile`)
//! * [`DirMediaStore`] — reads a `collection.media` directory directly, for
//!   offline conversion when Anki is not running

use crate::error::Anki2MdError;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// A source of media file contents keyed by filename.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Fetch `filename` as a base64 payload.
    ///
    /// `Ok(None)` means the store has no such file. Errors are reserved for
    /// the store itself being unusable.
    async fn retrieve(&self, filename: &str) -> Result<Option<String>, Anki2MdError>;
}

#[async_trait]
impl<T: MediaStore + ?Sized> MediaStore for Arc<T> {
    async fn retrieve(&self, filename: &str) -> Result<Option<String>, Anki2MdError> {
        (**self).retrieve(filename).await
    }
}

/// Media store backed by a local directory, usually Anki's `collection.media`.
#[derive(Debug, Clone)]
pub struct DirMediaStore {
    root: PathBuf,
}

impl DirMediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Join `filename` onto the root, refusing anything that could escape it.
    fn locate(&self, filename: &str) -> Result<PathBuf, Anki2MdError> {
        let relative = Path::new(filename);
        let is_plain = relative.components().count() > 0
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !is_plain {
            return Err(Anki2MdError::InvalidMediaName {
                filename: filename.to_string(),
            });
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl MediaStore for DirMediaStore {
    async fn retrieve(&self, filename: &str) -> Result<Option<String>, Anki2MdError> {
        let path = self.locate(filename)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                debug!("Read media {} ({} bytes)", path.display(), bytes.len());
                Ok(Some(STANDARD.encode(bytes)))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Anki2MdError::Io { path, source: e }),
        }
    }
}
