//! Path normalization.
//!
//! Every path handed to an [`Adapter`](crate::Adapter) is a [`StoragePath`]:
//! relative to the adapter root, `/`-separated, with no `.`/`..` segments and
//! no leading or trailing slash. The root itself is the empty path.
//!
//! | Raw input | Normalized |
//! |-----------|------------|
//! | `a/b/../c` | `a/c` |
//! | `/dirname//subdir/` | `dirname/subdir` |
//! | `\dir\file.txt` | `dir/file.txt` |
//! | `./dir/../` | `` (root) |
//! | `../etc/passwd` | `PathTraversal` |
//! | `a\0b` | `InvalidPath` |

use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};

/// A normalized storage path.
///
/// Only produced by a [`PathNormalizer`], so holding one means the invariants
/// above were checked.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct StoragePath(String);

impl StoragePath {
    /// The root path (`""`).
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Normalize `raw` with the default [`SegmentNormalizer`].
    pub fn parse(raw: &str) -> Result<Self> {
        SegmentNormalizer.normalize(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of segments; the root has depth 0.
    pub fn depth(&self) -> usize {
        if self.is_root() {
            0
        } else {
            self.0.split('/').count()
        }
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Parent path, `None` for the root.
    pub fn parent(&self) -> Option<StoragePath> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(idx) => Some(Self(self.0[..idx].to_string())),
            None => Some(Self::root()),
        }
    }

    /// Last segment, `None` for the root.
    pub fn file_name(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        self.0.rsplit('/').next()
    }

    /// Append a single, already-validated segment.
    ///
    /// Used by adapters when turning backend entry names into paths; the
    /// name must not contain `/`.
    pub fn join(&self, name: &str) -> StoragePath {
        if self.is_root() {
            Self(name.to_string())
        } else {
            Self(format!("{}/{}", self.0, name))
        }
    }

    /// True when `self` equals `base` or lies below it.
    pub fn starts_with(&self, base: &StoragePath) -> bool {
        if base.is_root() {
            return true;
        }
        self.0 == base.0
            || (self.0.starts_with(&base.0) && self.0.as_bytes().get(base.0.len()) == Some(&b'/'))
    }

    /// Ancestors from the top-most segment down to the parent of `self`.
    ///
    /// For `a/b/c` this yields `a`, `a/b`.
    pub fn ancestors(&self) -> Vec<StoragePath> {
        let mut out = Vec::new();
        let mut current = self.parent();
        while let Some(path) = current {
            if path.is_root() {
                break;
            }
            current = path.parent();
            out.push(path);
        }
        out.reverse();
        out
    }

    pub(crate) fn from_normalized(path: String) -> Self {
        Self(path)
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for StoragePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Canonicalizes user-supplied paths.
///
/// Implementations must be pure: same input, same output, no I/O.
pub trait PathNormalizer: Send + Sync {
    fn normalize(&self, raw: &str) -> Result<StoragePath>;
}

/// Default normalizer: segment-based, forward-slash, root-confined.
#[derive(Debug, Clone, Copy, Default)]
pub struct SegmentNormalizer;

impl PathNormalizer for SegmentNormalizer {
    fn normalize(&self, raw: &str) -> Result<StoragePath> {
        if raw.contains('\0') {
            return Err(Error::invalid_path(raw, "contains a null byte"));
        }
        if find_unsafe_path_char(raw).is_some() {
            return Err(Error::invalid_path(raw, "corrupted path detected"));
        }

        let unified = raw.replace('\\', "/");
        let mut segments: Vec<&str> = Vec::new();
        for segment in unified.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Err(Error::PathTraversal {
                            path: raw.to_string(),
                        });
                    }
                }
                name => segments.push(name),
            }
        }

        Ok(StoragePath::from_normalized(segments.join("/")))
    }
}

/// First character that makes a path unsafe to hand to a backend.
///
/// ASCII control characters (null is reported separately), C1 controls and
/// Unicode bidi overrides, which can make two different keys render the same.
fn find_unsafe_path_char(raw: &str) -> Option<char> {
    raw.chars().find(|&ch| {
        ch.is_ascii_control()
            || ('\u{0080}'..='\u{009F}').contains(&ch)
            || ('\u{202A}'..='\u{202E}').contains(&ch)
            || ('\u{2066}'..='\u{2069}').contains(&ch)
    })
}
