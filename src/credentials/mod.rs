//! The AWS shared credentials file: loading, querying, and atomic rewrite.

use std::{
    io::Write,
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use tokio::fs;
use tracing::{debug, info};

use crate::error::{Error, Result};

pub mod codec;
pub mod profile;
mod registry;

use codec::Document;
pub use profile::Profile;
pub use registry::{find_mfa_serial, long_term_credentials};

/// Profiles read from one credentials file.
///
/// A store lives for a single invocation: loaded once, optionally modified,
/// and persisted at most once.
#[derive(Debug, Clone)]
pub struct CredentialsStore {
    path: PathBuf,
    document: Document,
}

impl CredentialsStore {
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let metadata = match fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(source) => return Err(Error::FailedToLoadCredentialsFile { path, source }),
        };
        // directories, /dev/null and friends
        if !metadata.is_file() {
            return Err(invalid(path, "not a regular file"));
        }

        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(source) => return Err(Error::FailedToLoadCredentialsFile { path, source }),
        };
        let Ok(text) = String::from_utf8(bytes) else {
            return Err(invalid(path, "contains invalid UTF-8"));
        };

        Self::parse(path, &text)
    }

    /// Builds a store from file contents already in memory
    pub fn parse(path: impl Into<PathBuf>, text: &str) -> Result<Self> {
        let path = path.into();

        if text.contains('\0') {
            return Err(invalid(path, "contains binary data"));
        }
        let document = match Document::parse(text) {
            Ok(document) => document,
            Err(err) => return Err(invalid(path, err.to_string())),
        };

        debug!(
            "Loaded {} profiles from {}",
            document.sections().len(),
            path.display()
        );
        Ok(Self { path, document })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn serialize(&self) -> String {
        self.document.serialize()
    }

    /// Writes the store to a temporary file next to the target and renames
    /// it over the target. A symlinked path is written through to the file
    /// it points at. The existing file's permissions are kept; a new file
    /// gets the temporary file's 0600 mode.
    pub async fn persist(&self) -> Result<()> {
        let write_error = |source| Error::FailedToWriteCredentialsFile {
            path: self.path.clone(),
            source,
        };

        let target = match fs::canonicalize(&self.path).await {
            Ok(resolved) => resolved,
            Err(_) => self.path.clone(),
        };
        if target != self.path {
            debug!("Resolved {} to {}", self.path.display(), target.display());
        }

        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).await.map_err(write_error)?;

        let permissions = fs::metadata(&target)
            .await
            .ok()
            .map(|metadata| metadata.permissions());

        let mut file = NamedTempFile::new_in(&dir).map_err(write_error)?;
        file.write_all(self.serialize().as_bytes())
            .map_err(write_error)?;
        file.as_file().sync_all().map_err(write_error)?;
        if let Some(permissions) = permissions {
            file.as_file()
                .set_permissions(permissions)
                .map_err(write_error)?;
        }
        file.persist(&target)
            .map_err(|err| write_error(err.error))?;

        info!("Credentials saved to {}", self.path.display());
        Ok(())
    }
}

fn invalid(path: PathBuf, reason: impl Into<String>) -> Error {
    Error::NotAValidCredentialsFile {
        path,
        reason: reason.into(),
    }
}
