//! Lazy directory listings.

use futures_util::stream::BoxStream;
use futures_util::{StreamExt, TryStreamExt};

use crate::adapter::Adapter;
use crate::attributes::FileAttributes;
use crate::error::{Error, Result};
use crate::path::StoragePath;

/// A restartable listing of the entries below a directory.
///
/// Nothing is fetched until [`stream`](DirectoryListing::stream) is polled,
/// and every call to it issues a fresh query against the adapter. Entry
/// order is whatever the backend produces.
///
/// ```rust
/// use flykit::{Filesystem, FilesystemConfig, InMemoryAdapter};
///
/// # async fn run() -> flykit::Result<()> {
/// let fs = Filesystem::new(InMemoryAdapter::new(), FilesystemConfig::default());
/// fs.write("docs/a.txt", b"a", None).await?;
/// fs.write("docs/sub/b.txt", b"b", None).await?;
///
/// let listing = fs.list_contents("docs", true)?;
/// let files: Vec<_> = listing
///     .to_vec()
///     .await?
///     .into_iter()
///     .filter(|entry| entry.is_file())
///     .collect();
/// assert_eq!(files.len(), 2);
/// # Ok(())
/// # }
/// ```
pub struct DirectoryListing<'a, A: Adapter + ?Sized> {
    adapter: &'a A,
    path: StoragePath,
    deep: bool,
}

impl<'a, A: Adapter + ?Sized> DirectoryListing<'a, A> {
    pub(crate) fn new(adapter: &'a A, path: StoragePath, deep: bool) -> Self {
        Self {
            adapter,
            path,
            deep,
        }
    }

    /// The listed directory.
    pub fn path(&self) -> &StoragePath {
        &self.path
    }

    pub fn is_recursive(&self) -> bool {
        self.deep
    }

    /// Start a new pass over the entries.
    pub fn stream(&self) -> BoxStream<'a, Result<FileAttributes>> {
        let location = self.path.to_string();
        self.adapter
            .list_contents(&self.path, self.deep)
            .map_err(move |source| {
                tracing::debug!(
                    operation = "LIST_CONTENTS",
                    path = %location,
                    error = %source,
                    "listing failed"
                );
                Error::UnableToListContents {
                    location: location.clone(),
                    source,
                }
            })
            .boxed()
    }

    /// Collect one full pass, stopping at the first error.
    pub async fn to_vec(&self) -> Result<Vec<FileAttributes>> {
        self.stream().try_collect().await
    }

    /// Collect one full pass sorted by path.
    pub async fn to_sorted_vec(&self) -> Result<Vec<FileAttributes>> {
        let mut entries = self.to_vec().await?;
        entries.sort_by(|a, b| a.path().cmp(b.path()));
        Ok(entries)
    }
}
