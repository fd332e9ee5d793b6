//! Visibility and its backend representations.
//!
//! [`Visibility`] is the abstract access level. Each backend family stores it
//! differently:
//!
//! | Family | Converter | Public | Private |
//! |--------|-----------|--------|---------|
//! | POSIX | [`UnixVisibility`] | `0o644` file / `0o755` dir | `0o600` / `0o700` |
//! | Object store | [`AclVisibility`] | `public-read` | `private` |
//!
//! Native values that match neither table map to a configurable fallback,
//! `Private` unless changed, and log a warning.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::attributes::EntryKind;
use crate::error::Error;

/// Abstract access level of a file or directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            other => Err(Error::InvalidVisibility {
                value: other.to_string(),
            }),
        }
    }
}

/// Bidirectional mapping between [`Visibility`] and a backend's native form.
pub trait VisibilityConverter {
    type Native;

    fn to_native(&self, visibility: Visibility, kind: EntryKind) -> Self::Native;

    /// Unrecognized native values never fail; they map to the fallback.
    fn from_native(&self, native: &Self::Native, kind: EntryKind) -> Visibility;
}

/// POSIX permission bits.
///
/// ```rust
/// use flykit::{EntryKind, UnixVisibility, Visibility, VisibilityConverter};
///
/// let unix = UnixVisibility::new().public_file_mode(0o640);
/// assert_eq!(unix.to_native(Visibility::Public, EntryKind::File), 0o640);
/// assert_eq!(unix.from_native(&0o100640, EntryKind::File), Visibility::Public);
/// ```
#[derive(Debug, Clone)]
pub struct UnixVisibility {
    public_file: u32,
    private_file: u32,
    public_dir: u32,
    private_dir: u32,
    default_directory: Visibility,
    fallback: Visibility,
}

impl Default for UnixVisibility {
    fn default() -> Self {
        Self {
            public_file: 0o644,
            private_file: 0o600,
            public_dir: 0o755,
            private_dir: 0o700,
            default_directory: Visibility::Private,
            fallback: Visibility::Private,
        }
    }
}

impl UnixVisibility {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn public_file_mode(mut self, mode: u32) -> Self {
        self.public_file = mode;
        self
    }

    pub fn private_file_mode(mut self, mode: u32) -> Self {
        self.private_file = mode;
        self
    }

    pub fn public_dir_mode(mut self, mode: u32) -> Self {
        self.public_dir = mode;
        self
    }

    pub fn private_dir_mode(mut self, mode: u32) -> Self {
        self.private_dir = mode;
        self
    }

    /// Visibility reported for modes matching neither table.
    pub fn unknown_fallback(mut self, visibility: Visibility) -> Self {
        self.fallback = visibility;
        self
    }

    /// Visibility used for directories created without an explicit one.
    pub fn default_for_directories(mut self, visibility: Visibility) -> Self {
        self.default_directory = visibility;
        self
    }

    /// Mode for a directory created with the default visibility.
    pub fn default_for_directory(&self) -> u32 {
        self.for_directory(self.default_directory)
    }

    pub fn for_file(&self, visibility: Visibility) -> u32 {
        match visibility {
            Visibility::Public => self.public_file,
            Visibility::Private => self.private_file,
        }
    }

    pub fn for_directory(&self, visibility: Visibility) -> u32 {
        match visibility {
            Visibility::Public => self.public_dir,
            Visibility::Private => self.private_dir,
        }
    }

    pub fn inverse_for_file(&self, mode: u32) -> Visibility {
        self.inverse(mode, self.public_file, self.private_file)
    }

    pub fn inverse_for_directory(&self, mode: u32) -> Visibility {
        self.inverse(mode, self.public_dir, self.private_dir)
    }

    fn inverse(&self, mode: u32, public: u32, private: u32) -> Visibility {
        let bits = mode & 0o777;
        if bits == public & 0o777 {
            Visibility::Public
        } else if bits == private & 0o777 {
            Visibility::Private
        } else {
            tracing::warn!(
                mode = format_args!("{:o}", bits),
                fallback = %self.fallback,
                "unrecognized permission bits, reporting fallback visibility"
            );
            self.fallback
        }
    }
}

impl VisibilityConverter for UnixVisibility {
    type Native = u32;

    fn to_native(&self, visibility: Visibility, kind: EntryKind) -> u32 {
        match kind {
            EntryKind::File => self.for_file(visibility),
            EntryKind::Directory => self.for_directory(visibility),
        }
    }

    fn from_native(&self, native: &u32, kind: EntryKind) -> Visibility {
        match kind {
            EntryKind::File => self.inverse_for_file(*native),
            EntryKind::Directory => self.inverse_for_directory(*native),
        }
    }
}

/// Canned ACL tokens for object stores.
///
/// Files and directory placeholders share one table.
#[derive(Debug, Clone)]
pub struct AclVisibility {
    public_acl: String,
    private_acl: String,
    fallback: Visibility,
}

impl Default for AclVisibility {
    fn default() -> Self {
        Self {
            public_acl: "public-read".to_string(),
            private_acl: "private".to_string(),
            fallback: Visibility::Private,
        }
    }
}

impl AclVisibility {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn public_acl(mut self, token: impl Into<String>) -> Self {
        self.public_acl = token.into();
        self
    }

    pub fn private_acl(mut self, token: impl Into<String>) -> Self {
        self.private_acl = token.into();
        self
    }

    pub fn unknown_fallback(mut self, visibility: Visibility) -> Self {
        self.fallback = visibility;
        self
    }

    pub fn acl_for(&self, visibility: Visibility) -> &str {
        match visibility {
            Visibility::Public => &self.public_acl,
            Visibility::Private => &self.private_acl,
        }
    }

    pub fn visibility_for(&self, acl: &str) -> Visibility {
        if acl == self.public_acl {
            Visibility::Public
        } else if acl == self.private_acl {
            Visibility::Private
        } else {
            tracing::warn!(
                acl,
                fallback = %self.fallback,
                "unrecognized ACL token, reporting fallback visibility"
            );
            self.fallback
        }
    }
}

impl VisibilityConverter for AclVisibility {
    type Native = String;

    fn to_native(&self, visibility: Visibility, _kind: EntryKind) -> String {
        self.acl_for(visibility).to_string()
    }

    fn from_native(&self, native: &String, _kind: EntryKind) -> Visibility {
        self.visibility_for(native)
    }
}
