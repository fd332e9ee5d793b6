//! Filesystem configuration.
//!
//! [`FilesystemConfig`] is fixed at construction and never mutated. Per-call
//! options are resolved against it into a [`WriteConfig`] before the adapter
//! sees them, so adapters never deal with "unset" visibility.
//!
//! # Example
//!
//! ```rust
//! use flykit::{FilesystemConfig, Visibility};
//!
//! let config = FilesystemConfig::new()
//!     .default_file_visibility(Visibility::Private)
//!     .disallow_link_copies(true);
//! assert_eq!(config.default_directory_visibility, Visibility::Private);
//!
//! let json = r#"{"default_file_visibility": "private"}"#;
//! let from_json = FilesystemConfig::from_json(json).unwrap();
//! assert_eq!(from_json.default_file_visibility, Visibility::Private);
//! ```

use serde::{Deserialize, Serialize};

use crate::visibility::Visibility;

/// Construction-time options for a [`Filesystem`](crate::Filesystem).
///
/// | Option | Default |
/// |--------|---------|
/// | `default_file_visibility` | `public` |
/// | `default_directory_visibility` | `private` |
/// | `disallow_link_copies` | `false` |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesystemConfig {
    /// Visibility injected when a write omits one.
    pub default_file_visibility: Visibility,

    /// Visibility for created directories, explicit or implied by a write.
    pub default_directory_visibility: Visibility,

    /// Refuse to copy a source that is a symbolic link.
    pub disallow_link_copies: bool,
}

impl Default for FilesystemConfig {
    fn default() -> Self {
        Self {
            default_file_visibility: Visibility::Public,
            default_directory_visibility: Visibility::Private,
            disallow_link_copies: false,
        }
    }
}

impl FilesystemConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON document; missing fields keep their defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn default_file_visibility(mut self, visibility: Visibility) -> Self {
        self.default_file_visibility = visibility;
        self
    }

    pub fn default_directory_visibility(mut self, visibility: Visibility) -> Self {
        self.default_directory_visibility = visibility;
        self
    }

    pub fn disallow_link_copies(mut self, disallow: bool) -> Self {
        self.disallow_link_copies = disallow;
        self
    }

    /// Options for writing a file, `visibility` overriding the default.
    pub(crate) fn for_file(&self, visibility: Option<Visibility>) -> WriteConfig {
        WriteConfig {
            visibility: visibility.unwrap_or(self.default_file_visibility),
            directory_visibility: self.default_directory_visibility,
            disallow_link_copies: self.disallow_link_copies,
        }
    }

    /// Options for creating a directory, `visibility` overriding the default.
    pub(crate) fn for_directory(&self, visibility: Option<Visibility>) -> WriteConfig {
        let visibility = visibility.unwrap_or(self.default_directory_visibility);
        WriteConfig {
            visibility,
            directory_visibility: self.default_directory_visibility,
            disallow_link_copies: self.disallow_link_copies,
        }
    }
}

/// Resolved options passed to [`Adapter`](crate::Adapter) write-like calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteConfig {
    /// Visibility of the file written or the directory created.
    pub visibility: Visibility,
    /// Visibility of parent directories created along the way.
    pub directory_visibility: Visibility,
    pub disallow_link_copies: bool,
}

impl Default for WriteConfig {
    fn default() -> Self {
        FilesystemConfig::default().for_file(None)
    }
}
