//! File and directory metadata.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::path::StoragePath;
use crate::visibility::Visibility;

/// Entry type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    pub fn is_file(&self) -> bool {
        matches!(self, EntryKind::File)
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, EntryKind::Directory)
    }
}

/// Immutable snapshot of one listing entry.
///
/// `file_size` is only present for files. The other optional fields are
/// `None` when the backend cannot report them (object-store directories have
/// no timestamp, for instance).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileAttributes {
    path: StoragePath,
    kind: EntryKind,
    file_size: Option<u64>,
    last_modified: Option<i64>,
    visibility: Option<Visibility>,
    mime_type: Option<String>,
}

impl FileAttributes {
    pub fn file(path: StoragePath, size: u64) -> Self {
        Self {
            path,
            kind: EntryKind::File,
            file_size: Some(size),
            last_modified: None,
            visibility: None,
            mime_type: None,
        }
    }

    pub fn directory(path: StoragePath) -> Self {
        Self {
            path,
            kind: EntryKind::Directory,
            file_size: None,
            last_modified: None,
            visibility: None,
            mime_type: None,
        }
    }

    pub fn with_last_modified(mut self, timestamp: i64) -> Self {
        self.last_modified = Some(timestamp);
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn path(&self) -> &StoragePath {
        &self.path
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    pub fn file_size(&self) -> Option<u64> {
        self.file_size
    }

    /// Epoch seconds, backend clock.
    pub fn last_modified(&self) -> Option<i64> {
        self.last_modified
    }

    pub fn visibility(&self) -> Option<Visibility> {
        self.visibility
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }
}

/// Epoch seconds for a filesystem timestamp.
pub(crate) fn epoch_seconds(time: SystemTime) -> i64 {
    if time < UNIX_EPOCH {
        return 0;
    }
    DateTime::<Utc>::from(time).timestamp()
}

pub(crate) fn now_epoch_seconds() -> i64 {
    Utc::now().timestamp()
}

/// Best-effort mime type from the file extension.
pub fn guess_mime_type(path: &str) -> Option<&'static str> {
    let name = path.rsplit('/').next()?;
    let (_, ext) = name.rsplit_once('.')?;
    let mime = match ext.to_ascii_lowercase().as_str() {
        "txt" | "log" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "csv" => "text/csv",
        "js" | "mjs" => "text/javascript",
        "json" => "application/json",
        "xml" => "application/xml",
        "yaml" | "yml" => "application/yaml",
        "toml" => "application/toml",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "tar" => "application/x-tar",
        "wasm" => "application/wasm",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "ico" => "image/vnd.microsoft.icon",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        _ => return None,
    };
    Some(mime)
}
