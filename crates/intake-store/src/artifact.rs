//! Directory-backed artifact bucket

use intake_domain::traits::ArtifactStore;
use intake_domain::ArtifactKey;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const STAGING_SUFFIX: &str = ".partial";

/// Errors that can occur during artifact operations
#[derive(Error, Debug)]
pub enum ArtifactError {
    /// No object stored under the key
    #[error("Artifact not found: {0}")]
    NotFound(String),

    /// An object already exists under the key (buckets are write-once)
    #[error("Artifact already exists: {0}")]
    AlreadyExists(String),

    /// Underlying filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// ArtifactStore backed by a local directory
///
/// The directory is the bucket and each key is a file inside it. Every write
/// goes to its own hidden staging file and is then moved into place without
/// clobbering, so readers listing the bucket never observe a partially
/// written artifact and a committed key is never rewritten, even by
/// concurrent writers.
///
/// # Examples
///
/// ```no_run
/// use intake_store::FsArtifactStore;
///
/// let store = FsArtifactStore::new("/var/lib/intake/document-input").unwrap();
/// assert_eq!(intake_domain::traits::ArtifactStore::bucket(&store), "document-input");
/// ```
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
    bucket: String,
}

impl FsArtifactStore {
    /// Open a bucket directory, creating it if needed
    ///
    /// The bucket name is the directory's final path component.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, ArtifactError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;

        let bucket = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "bucket".to_string());

        Ok(Self { root, bucket })
    }

    /// Directory backing this bucket
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, key: &ArtifactKey) -> PathBuf {
        self.root.join(key.as_str())
    }

}

impl ArtifactStore for FsArtifactStore {
    type Error = ArtifactError;

    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn put(&self, key: &ArtifactKey, bytes: &[u8]) -> Result<(), Self::Error> {
        let target = self.object_path(key);
        if target.exists() {
            return Err(ArtifactError::AlreadyExists(key.to_string()));
        }

        // Each write gets its own exclusively created staging file; dot-prefixed
        // names are never valid keys, so list() skips them
        let mut staging = tempfile::Builder::new()
            .prefix(".")
            .suffix(STAGING_SUFFIX)
            .tempfile_in(&self.root)?;
        staging.write_all(bytes)?;
        staging.as_file().sync_all()?;

        match staging.persist_noclobber(&target) {
            Ok(_) => {
                debug!("Stored artifact '{}' ({} bytes) in bucket '{}'", key, bytes.len(), self.bucket);
                Ok(())
            }
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                Err(ArtifactError::AlreadyExists(key.to_string()))
            }
            Err(e) => Err(ArtifactError::Io(e.error)),
        }
    }

    fn get(&self, key: &ArtifactKey) -> Result<Vec<u8>, Self::Error> {
        fs::read(self.object_path(key)).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ArtifactError::NotFound(key.to_string()),
            _ => ArtifactError::Io(e),
        })
    }

    fn list(&self) -> Result<Vec<ArtifactKey>, Self::Error> {
        let mut keys = Vec::new();

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            // Staging files and anything not written through put() are ignored
            if let Ok(key) = ArtifactKey::parse(name) {
                keys.push(key);
            }
        }

        keys.sort();
        Ok(keys)
    }
}
