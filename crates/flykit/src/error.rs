//! Error types for flykit
//!
//! Two layers:
//! - [`AdapterError`]: what a backend reports. Small and storage-flavored.
//! - [`Error`]: what the [`Filesystem`](crate::Filesystem) facade returns. Every
//!   adapter failure is wrapped with the location and the attempted
//!   [`Operation`], keeping the adapter error as its `source()`.
//!
//! Callers branch on [`Error::is_not_found`] (often expected) versus the
//! `UnableTo*` kinds (unexpected) without matching on messages.

use std::fmt;

use thiserror::Error;

use crate::adapter::object_store::ClientError;

/// Result type alias using flykit's facade [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias for [`Adapter`](crate::Adapter) implementations.
pub type AdapterResult<T> = std::result::Result<T, AdapterError>;

/// The operation a facade call was attempting when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FileExists,
    DirectoryExists,
    Write,
    Read,
    Delete,
    DeleteDirectory,
    CreateDirectory,
    ListContents,
    RetrieveMetadata,
    SetVisibility,
    Move,
    Copy,
    TemporaryUrl,
}

impl Operation {
    /// Stable upper-case name, suitable for logs and metrics labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::FileExists => "FILE_EXISTS",
            Operation::DirectoryExists => "DIRECTORY_EXISTS",
            Operation::Write => "WRITE",
            Operation::Read => "READ",
            Operation::Delete => "DELETE",
            Operation::DeleteDirectory => "DELETE_DIRECTORY",
            Operation::CreateDirectory => "CREATE_DIRECTORY",
            Operation::ListContents => "LIST_CONTENTS",
            Operation::RetrieveMetadata => "RETRIEVE_METADATA",
            Operation::SetVisibility => "SET_VISIBILITY",
            Operation::Move => "MOVE",
            Operation::Copy => "COPY",
            Operation::TemporaryUrl => "TEMPORARY_URL",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors reported by storage adapters.
#[derive(Error, Debug)]
pub enum AdapterError {
    /// The targeted path does not exist in the backend.
    #[error("not found: {path}")]
    NotFound { path: String },

    /// I/O error from local storage.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Error returned by an object-store client.
    #[error("object store error: {0}")]
    Client(#[from] ClientError),

    /// The backend refused the request (e.g. "is a directory").
    #[error("{0}")]
    Rejected(String),

    /// The backend does not support this capability.
    #[error("unsupported by this adapter: {0}")]
    Unsupported(&'static str),
}

impl AdapterError {
    pub(crate) fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub(crate) fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }

    /// True when the backend reported a missing path.
    pub fn is_not_found(&self) -> bool {
        match self {
            AdapterError::NotFound { .. } => true,
            AdapterError::Io(err) => err.kind() == std::io::ErrorKind::NotFound,
            AdapterError::Client(err) => err.is_no_such_key(),
            _ => false,
        }
    }
}

/// flykit facade errors.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed path input: null byte, control characters, or an empty path
    /// where a file path was required.
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    /// A `..` segment escapes the logical root.
    #[error("path traversal outside root: {path:?}")]
    PathTraversal { path: String },

    /// A visibility string other than `public` or `private`.
    #[error("invalid visibility provided, expected either 'public' or 'private', received {value:?}")]
    InvalidVisibility { value: String },

    /// The targeted path does not exist.
    #[error("{operation} failed, no such file or directory: {location}")]
    NotFound {
        location: String,
        operation: Operation,
        #[source]
        source: AdapterError,
    },

    #[error("unable to check existence at {location}")]
    UnableToCheckExistence {
        location: String,
        #[source]
        source: AdapterError,
    },

    #[error("unable to read file at {location}")]
    UnableToRead {
        location: String,
        #[source]
        source: AdapterError,
    },

    #[error("unable to write file at {location}")]
    UnableToWrite {
        location: String,
        #[source]
        source: AdapterError,
    },

    #[error("unable to delete file at {location}")]
    UnableToDelete {
        location: String,
        #[source]
        source: AdapterError,
    },

    /// Recursive directory deletion stopped; `child` names the entry that
    /// failed, or is `None` when the directory itself could not be removed.
    #[error("unable to delete directory at {location}{}", child_suffix(.child))]
    UnableToDeleteDirectory {
        location: String,
        child: Option<String>,
        #[source]
        source: AdapterError,
    },

    #[error("unable to create directory at {location}")]
    UnableToCreateDirectory {
        location: String,
        #[source]
        source: AdapterError,
    },

    #[error("unable to list contents of {location}")]
    UnableToListContents {
        location: String,
        #[source]
        source: AdapterError,
    },

    #[error("unable to retrieve {metadata} for {location}")]
    UnableToRetrieveMetadata {
        location: String,
        metadata: &'static str,
        #[source]
        source: AdapterError,
    },

    #[error("unable to set visibility for {location}")]
    UnableToSetVisibility {
        location: String,
        #[source]
        source: AdapterError,
    },

    #[error("unable to move file from {source_path} to {destination}")]
    UnableToMove {
        source_path: String,
        destination: String,
        #[source]
        source: AdapterError,
    },

    #[error("unable to copy file from {source_path} to {destination}")]
    UnableToCopy {
        source_path: String,
        destination: String,
        #[source]
        source: AdapterError,
    },

    #[error("unable to generate temporary url for {location}")]
    UnableToGenerateTemporaryUrl {
        location: String,
        #[source]
        source: AdapterError,
    },
}

fn child_suffix(child: &Option<String>) -> String {
    match child {
        Some(child) => format!(" (failed on {child})"),
        None => String::new(),
    }
}

impl Error {
    pub(crate) fn invalid_path(path: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason,
        }
    }

    /// True for [`Error::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// The operation that failed, when the error came from a storage call.
    pub fn operation(&self) -> Option<Operation> {
        let op = match self {
            Error::InvalidPath { .. }
            | Error::PathTraversal { .. }
            | Error::InvalidVisibility { .. } => return None,
            Error::NotFound { operation, .. } => *operation,
            Error::UnableToCheckExistence { .. } => Operation::FileExists,
            Error::UnableToRead { .. } => Operation::Read,
            Error::UnableToWrite { .. } => Operation::Write,
            Error::UnableToDelete { .. } => Operation::Delete,
            Error::UnableToDeleteDirectory { .. } => Operation::DeleteDirectory,
            Error::UnableToCreateDirectory { .. } => Operation::CreateDirectory,
            Error::UnableToListContents { .. } => Operation::ListContents,
            Error::UnableToRetrieveMetadata { .. } => Operation::RetrieveMetadata,
            Error::UnableToSetVisibility { .. } => Operation::SetVisibility,
            Error::UnableToMove { .. } => Operation::Move,
            Error::UnableToCopy { .. } => Operation::Copy,
            Error::UnableToGenerateTemporaryUrl { .. } => Operation::TemporaryUrl,
        };
        Some(op)
    }

    /// The path the failing call targeted (the source path for move/copy).
    pub fn location(&self) -> &str {
        match self {
            Error::InvalidPath { path, .. } | Error::PathTraversal { path } => path,
            Error::InvalidVisibility { value } => value,
            Error::NotFound { location, .. }
            | Error::UnableToCheckExistence { location, .. }
            | Error::UnableToRead { location, .. }
            | Error::UnableToWrite { location, .. }
            | Error::UnableToDelete { location, .. }
            | Error::UnableToDeleteDirectory { location, .. }
            | Error::UnableToCreateDirectory { location, .. }
            | Error::UnableToListContents { location, .. }
            | Error::UnableToRetrieveMetadata { location, .. }
            | Error::UnableToSetVisibility { location, .. }
            | Error::UnableToGenerateTemporaryUrl { location, .. } => location,
            Error::UnableToMove { source_path, .. } | Error::UnableToCopy { source_path, .. } => {
                source_path
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn operation_names() {
        assert_eq!(Operation::Write.to_string(), "WRITE");
        assert_eq!(Operation::RetrieveMetadata.as_str(), "RETRIEVE_METADATA");
        assert_eq!(Operation::DeleteDirectory.as_str(), "DELETE_DIRECTORY");
    }

    #[test]
    fn not_found_keeps_cause() {
        let err = Error::NotFound {
            location: "docs/a.txt".into(),
            operation: Operation::Read,
            source: AdapterError::not_found("docs/a.txt"),
        };
        assert!(err.is_not_found());
        assert_eq!(err.operation(), Some(Operation::Read));
        assert_eq!(err.location(), "docs/a.txt");
        let cause = err.source().unwrap().to_string();
        assert!(cause.contains("docs/a.txt"));
    }

    #[test]
    fn delete_directory_names_failing_child() {
        let err = Error::UnableToDeleteDirectory {
            location: "docs".into(),
            child: Some("docs/sub/b.txt".into()),
            source: AdapterError::rejected("permission denied"),
        };
        assert_eq!(
            err.to_string(),
            "unable to delete directory at docs (failed on docs/sub/b.txt)"
        );
        assert!(!err.is_not_found());
    }

    #[test]
    fn move_reports_source_location() {
        let err = Error::UnableToMove {
            source_path: "a.txt".into(),
            destination: "b/a.txt".into(),
            source: AdapterError::not_found("a.txt"),
        };
        assert_eq!(err.location(), "a.txt");
        assert_eq!(err.operation(), Some(Operation::Move));
        assert_eq!(err.to_string(), "unable to move file from a.txt to b/a.txt");
    }

    #[test]
    fn io_not_found_counts_as_not_found() {
        let err: AdapterError = std::io::Error::from(std::io::ErrorKind::NotFound).into();
        assert!(err.is_not_found());
        let err: AdapterError = std::io::Error::other("disk on fire").into();
        assert!(!err.is_not_found());
    }

    #[test]
    fn validation_errors_have_no_operation() {
        let err = Error::invalid_path("a\0b", "contains a null byte");
        assert_eq!(err.operation(), None);
        assert!(err.to_string().contains("null byte"));
    }
}
