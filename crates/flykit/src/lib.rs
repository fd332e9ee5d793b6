//! Flykit - Storage abstraction over interchangeable backends
//!
//! Application code talks to one [`Filesystem`] facade; where the bytes live
//! (process memory, a local directory, an object store) is decided by the
//! [`Adapter`] it was built with.
//!
//! # Example
//!
//! ```rust
//! use flykit::{Filesystem, FilesystemConfig, InMemoryAdapter, Visibility};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let fs = Filesystem::new(InMemoryAdapter::new(), FilesystemConfig::default());
//!
//!     fs.write("docs/readme.txt", b"hello", None).await?;
//!     assert_eq!(fs.read_to_string("docs/readme.txt").await?, "hello");
//!     assert_eq!(fs.visibility("docs/readme.txt").await?, Visibility::Public);
//!
//!     let entries = fs.list_contents("docs", true)?.to_vec().await?;
//!     assert_eq!(entries.len(), 1);
//!
//!     fs.delete_directory("docs").await?;
//!     assert!(!fs.has("docs").await?);
//!     Ok(())
//! }
//! ```
//!
//! # Backends
//!
//! | Adapter | Storage |
//! |---------|---------|
//! | [`InMemoryAdapter`] | process memory |
//! | [`LocalAdapter`] | a directory on disk, visibility as unix mode bits |
//! | [`ObjectStoreAdapter`] | any [`ObjectStoreClient`], visibility as ACL tokens |
//!
//! [`Backend`] wraps all three for runtime selection and is the default type
//! parameter of [`Filesystem`]. Custom backends implement [`Adapter`] with
//! [`async_trait`].

pub mod adapter;
mod attributes;
mod config;
mod error;
mod filesystem;
mod listing;
mod path;
mod visibility;

pub use adapter::object_store::{
    ClientError, ListPage, ListRequest, MemoryObjectStore, ObjectHead, ObjectStoreClient,
    ObjectSummary, PutOptions,
};
pub use adapter::{
    Adapter, Backend, ByteReader, InMemoryAdapter, ListingStream, LocalAdapter, ObjectStoreAdapter,
};
pub use attributes::{EntryKind, FileAttributes, guess_mime_type};
pub use config::{FilesystemConfig, WriteConfig};
pub use error::{AdapterError, AdapterResult, Error, Operation, Result};
pub use filesystem::{DEFAULT_TEMPORARY_URL_TTL, Filesystem, FilesystemBuilder};
pub use listing::DirectoryListing;
pub use path::{PathNormalizer, SegmentNormalizer, StoragePath};
pub use visibility::{AclVisibility, UnixVisibility, Visibility, VisibilityConverter};

/// Re-exported for implementing [`Adapter`] outside this crate.
pub use async_trait::async_trait;
