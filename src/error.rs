//! Error types for credentials store and token exchange operations.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Errors raised while loading, querying, or updating the credentials store
#[derive(Error, Debug)]
pub enum Error {
    /// The credentials file could not be read (usually: it does not exist)
    #[error("Failed to load credentials file {}: {source}", .path.display())]
    FailedToLoadCredentialsFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The path exists but does not hold a well-formed profile container
    #[error("{} is not a valid credentials file: {reason}", .path.display())]
    NotAValidCredentialsFile { path: PathBuf, reason: String },

    /// The updated store could not be written back
    #[error("Failed to write credentials file {}: {source}", .path.display())]
    FailedToWriteCredentialsFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Profile \"{0}\" not found")]
    ProfileNotFound(String),

    #[error("Multiple profiles found for \"{0}\"")]
    MultipleProfilesFound(String),

    /// Base profile names may not carry the short-term suffix
    #[error("Profile name \"{0}\" cannot end with the short-term suffix \"-short-term\"")]
    InvalidProfileName(String),

    #[error("No MFA device found for \"{0}\"")]
    NoMfaDeviceFound(String),

    #[error("No access key found for \"{0}\"")]
    NoAccessKey(String),

    #[error("No secret key found for \"{0}\"")]
    NoSecretKey(String),

    /// The token exchange service rejected the request; message passed through
    #[error("{0}")]
    RemoteExchangeFailed(String),
}

/// Result type alias for credentials store operations
pub type Result<T> = std::result::Result<T, Error>;
