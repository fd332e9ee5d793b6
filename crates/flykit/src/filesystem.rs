//! The [`Filesystem`] facade.
//!
//! Callers speak raw string paths; the facade normalizes them, resolves
//! per-call options against [`FilesystemConfig`], forwards to the
//! [`Adapter`] and translates failures into the [`Error`] taxonomy.

use std::cmp::Reverse;
use std::fmt;
use std::time::Duration;

use futures_util::TryStreamExt;
use tokio::io::AsyncRead;

use crate::adapter::{Adapter, Backend, ByteReader};
use crate::attributes::FileAttributes;
use crate::config::FilesystemConfig;
use crate::error::{AdapterError, Error, Operation, Result};
use crate::listing::DirectoryListing;
use crate::path::{PathNormalizer, SegmentNormalizer, StoragePath};
use crate::visibility::Visibility;

/// Lifetime of a temporary URL when the caller has no preference.
pub const DEFAULT_TEMPORARY_URL_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Builds the operation-specific error for location-only variants.
macro_rules! unable {
    ($variant:ident) => {
        |location, source| Error::$variant { location, source }
    };
}

/// Storage facade over one [`Adapter`].
///
/// # Example
///
/// ```rust
/// use flykit::{Filesystem, FilesystemConfig, InMemoryAdapter, Visibility};
///
/// # #[tokio::main]
/// # async fn main() -> anyhow::Result<()> {
/// let fs = Filesystem::new(InMemoryAdapter::new(), FilesystemConfig::default());
///
/// fs.write("docs/readme.txt", b"hello", None).await?;
/// assert_eq!(fs.read("docs/readme.txt").await?, b"hello");
/// assert!(fs.directory_exists("docs").await?);
///
/// fs.set_visibility("docs/readme.txt", Visibility::Private).await?;
/// assert_eq!(fs.visibility("docs/readme.txt").await?, Visibility::Private);
///
/// fs.move_file("docs/readme.txt", "archive/readme.txt").await?;
/// assert!(!fs.file_exists("docs/readme.txt").await?);
/// # Ok(())
/// # }
/// ```
pub struct Filesystem<A: Adapter = Backend> {
    adapter: A,
    config: FilesystemConfig,
    normalizer: Box<dyn PathNormalizer>,
}

impl<A: Adapter> fmt::Debug for Filesystem<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filesystem")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<A: Adapter> Filesystem<A> {
    /// Create a facade with the default [`SegmentNormalizer`].
    pub fn new(adapter: A, config: FilesystemConfig) -> Self {
        Self {
            adapter,
            config,
            normalizer: Box::new(SegmentNormalizer),
        }
    }

    pub fn builder(adapter: A) -> FilesystemBuilder<A> {
        FilesystemBuilder::new(adapter)
    }

    pub fn config(&self) -> &FilesystemConfig {
        &self.config
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    fn normalize(&self, raw: &str) -> Result<StoragePath> {
        self.normalizer.normalize(raw)
    }

    /// Normalize a path that must address an entry, not the root.
    fn entry_path(&self, raw: &str) -> Result<StoragePath> {
        let path = self.normalize(raw)?;
        if path.is_root() {
            return Err(Error::invalid_path(raw, "path refers to the root directory"));
        }
        Ok(path)
    }

    // ---- Existence ----

    /// Existence checks address an entry; the root is rejected with
    /// [`Error::InvalidPath`] like every other entry operation.
    pub async fn file_exists(&self, path: &str) -> Result<bool> {
        let path = self.entry_path(path)?;
        self.adapter.file_exists(&path).await.map_err(|source| {
            translate(Operation::FileExists, &path, source, unable!(UnableToCheckExistence))
        })
    }

    pub async fn directory_exists(&self, path: &str) -> Result<bool> {
        let path = self.entry_path(path)?;
        self.adapter.directory_exists(&path).await.map_err(|source| {
            translate(
                Operation::DirectoryExists,
                &path,
                source,
                unable!(UnableToCheckExistence),
            )
        })
    }

    /// True when a file or a directory exists at `path`.
    pub async fn has(&self, path: &str) -> Result<bool> {
        Ok(self.file_exists(path).await? || self.directory_exists(path).await?)
    }

    // ---- Reading ----

    pub async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let path = self.entry_path(path)?;
        self.read_normalized(&path).await
    }

    /// Read a file and decode it as UTF-8.
    pub async fn read_to_string(&self, path: &str) -> Result<String> {
        let path = self.entry_path(path)?;
        let bytes = self.read_normalized(&path).await?;
        String::from_utf8(bytes).map_err(|err| Error::UnableToRead {
            location: path.to_string(),
            source: AdapterError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, err)),
        })
    }

    async fn read_normalized(&self, path: &StoragePath) -> Result<Vec<u8>> {
        self.adapter
            .read(path)
            .await
            .map_err(|source| translate(Operation::Read, path, source, unable!(UnableToRead)))
    }

    pub async fn read_stream(&self, path: &str) -> Result<ByteReader> {
        let path = self.entry_path(path)?;
        self.adapter
            .read_stream(&path)
            .await
            .map_err(|source| translate(Operation::Read, &path, source, unable!(UnableToRead)))
    }

    // ---- Writing ----

    /// Write `contents`, replacing any existing file and creating missing
    /// parent directories. `visibility` defaults to
    /// [`FilesystemConfig::default_file_visibility`].
    pub async fn write(
        &self,
        path: &str,
        contents: impl AsRef<[u8]>,
        visibility: Option<Visibility>,
    ) -> Result<()> {
        let path = self.entry_path(path)?;
        let config = self.config.for_file(visibility);
        self.adapter
            .write(&path, contents.as_ref(), &config)
            .await
            .map_err(|source| translate(Operation::Write, &path, source, unable!(UnableToWrite)))
    }

    pub async fn write_stream<R>(
        &self,
        path: &str,
        reader: R,
        visibility: Option<Visibility>,
    ) -> Result<()>
    where
        R: AsyncRead + Send + 'static,
    {
        let path = self.entry_path(path)?;
        let config = self.config.for_file(visibility);
        self.adapter
            .write_stream(&path, Box::pin(reader), &config)
            .await
            .map_err(|source| translate(Operation::Write, &path, source, unable!(UnableToWrite)))
    }

    /// Write only when no file exists at `path`. Returns whether it wrote.
    ///
    /// The check and the write are separate adapter calls; a concurrent
    /// writer can slip in between them.
    pub async fn write_if_absent(
        &self,
        path: &str,
        contents: impl AsRef<[u8]>,
        visibility: Option<Visibility>,
    ) -> Result<bool> {
        if self.file_exists(path).await? {
            return Ok(false);
        }
        self.write(path, contents, visibility).await?;
        Ok(true)
    }

    // ---- Deleting ----

    /// Delete a file. A missing file is [`Error::NotFound`].
    pub async fn delete(&self, path: &str) -> Result<()> {
        let path = self.entry_path(path)?;
        self.adapter
            .delete(&path)
            .await
            .map_err(|source| translate(Operation::Delete, &path, source, unable!(UnableToDelete)))
    }

    /// Delete a directory and everything below it.
    ///
    /// Files go first, then subdirectories deepest first, then the directory
    /// itself. Entries that vanish along the way are skipped and an absent
    /// directory is not an error. Any other failure stops the walk and is
    /// reported with the child that failed.
    pub async fn delete_directory(&self, path: &str) -> Result<()> {
        let path = self.entry_path(path)?;
        let location = path.to_string();

        let entries: Vec<FileAttributes> = self
            .adapter
            .list_contents(&path, true)
            .try_collect()
            .await
            .map_err(|source| {
                tracing::debug!(
                    operation = "DELETE_DIRECTORY",
                    path = %location,
                    error = %source,
                    "listing failed"
                );
                Error::UnableToDeleteDirectory {
                    location: location.clone(),
                    child: None,
                    source,
                }
            })?;

        // Path order, not listing order, which is backend-defined.
        let (mut files, mut directories): (Vec<_>, Vec<_>) =
            entries.into_iter().partition(FileAttributes::is_file);
        files.sort_by(|a, b| a.path().cmp(b.path()));
        directories.sort_by(|a, b| {
            Reverse(a.path().depth())
                .cmp(&Reverse(b.path().depth()))
                .then_with(|| a.path().cmp(b.path()))
        });

        for file in &files {
            let outcome = self.adapter.delete(file.path()).await;
            self.tolerate_missing(&location, file.path(), outcome)?;
        }
        for dir in &directories {
            let outcome = self.adapter.delete_directory(dir.path()).await;
            self.tolerate_missing(&location, dir.path(), outcome)?;
        }

        match self.adapter.delete_directory(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_not_found() => {
                tracing::trace!(path = %location, "directory already absent");
                Ok(())
            }
            Err(source) => {
                log_failure(Operation::DeleteDirectory, &path, &source);
                Err(Error::UnableToDeleteDirectory {
                    location,
                    child: None,
                    source,
                })
            }
        }
    }

    fn tolerate_missing(
        &self,
        location: &str,
        child: &StoragePath,
        outcome: std::result::Result<(), AdapterError>,
    ) -> Result<()> {
        match outcome {
            Ok(()) => Ok(()),
            Err(err) if err.is_not_found() => {
                tracing::trace!(path = %child, "child already absent");
                Ok(())
            }
            Err(source) => {
                tracing::debug!(
                    operation = "DELETE_DIRECTORY",
                    path = %location,
                    child = %child,
                    error = %source,
                    "storage operation failed"
                );
                Err(Error::UnableToDeleteDirectory {
                    location: location.to_string(),
                    child: Some(child.to_string()),
                    source,
                })
            }
        }
    }

    // ---- Directories ----

    /// Create a directory and any missing parents. Creating an existing
    /// directory succeeds.
    pub async fn create_directory(&self, path: &str, visibility: Option<Visibility>) -> Result<()> {
        let path = self.entry_path(path)?;
        let config = self.config.for_directory(visibility);
        self.adapter
            .create_directory(&path, &config)
            .await
            .map_err(|source| {
                translate(
                    Operation::CreateDirectory,
                    &path,
                    source,
                    unable!(UnableToCreateDirectory),
                )
            })
    }

    /// Entries below `path`; `recursive` descends into subdirectories.
    ///
    /// Listing a directory that does not exist yields no entries. The root
    /// (`""` or `"/"`) is accepted here and lists everything.
    pub fn list_contents(&self, path: &str, recursive: bool) -> Result<DirectoryListing<'_, A>> {
        let path = self.normalize(path)?;
        Ok(DirectoryListing::new(&self.adapter, path, recursive))
    }

    // ---- Metadata ----

    /// Last modification time in epoch seconds.
    pub async fn last_modified(&self, path: &str) -> Result<i64> {
        let path = self.entry_path(path)?;
        let result = self.adapter.last_modified(&path).await;
        result.map_err(|source| metadata_error(&path, "last_modified", source))
    }

    pub async fn file_size(&self, path: &str) -> Result<u64> {
        let path = self.entry_path(path)?;
        let result = self.adapter.file_size(&path).await;
        result.map_err(|source| metadata_error(&path, "file_size", source))
    }

    /// Mime type of a file; `None` when the backend cannot tell.
    pub async fn mime_type(&self, path: &str) -> Result<Option<String>> {
        let path = self.entry_path(path)?;
        let result = self.adapter.mime_type(&path).await;
        result.map_err(|source| metadata_error(&path, "mime_type", source))
    }

    pub async fn visibility(&self, path: &str) -> Result<Visibility> {
        let path = self.entry_path(path)?;
        let result = self.adapter.visibility(&path).await;
        result.map_err(|source| metadata_error(&path, "visibility", source))
    }

    pub async fn set_visibility(&self, path: &str, visibility: Visibility) -> Result<()> {
        let path = self.entry_path(path)?;
        self.adapter
            .set_visibility(&path, visibility)
            .await
            .map_err(|source| {
                translate(
                    Operation::SetVisibility,
                    &path,
                    source,
                    unable!(UnableToSetVisibility),
                )
            })
    }

    // ---- Move / copy ----

    /// Move a file, creating the destination's parent directories.
    pub async fn move_file(&self, source: &str, destination: &str) -> Result<()> {
        let from = self.entry_path(source)?;
        let to = self.entry_path(destination)?;
        let config = self.config.for_file(None);
        self.adapter
            .move_file(&from, &to, &config)
            .await
            .map_err(|source| {
                log_failure(Operation::Move, &from, &source);
                Error::UnableToMove {
                    source_path: from.to_string(),
                    destination: to.to_string(),
                    source,
                }
            })
    }

    /// Copy a file, creating the destination's parent directories. The copy
    /// keeps the source's visibility.
    pub async fn copy_file(&self, source: &str, destination: &str) -> Result<()> {
        let from = self.entry_path(source)?;
        let to = self.entry_path(destination)?;
        let config = self.config.for_file(None);
        self.adapter
            .copy_file(&from, &to, &config)
            .await
            .map_err(|source| {
                log_failure(Operation::Copy, &from, &source);
                Error::UnableToCopy {
                    source_path: from.to_string(),
                    destination: to.to_string(),
                    source,
                }
            })
    }

    // ---- URLs ----

    /// A URL granting read access to `path` for `expires_in`.
    ///
    /// Only backends that can sign requests support this; the others fail
    /// with [`Error::UnableToGenerateTemporaryUrl`].
    pub async fn temporary_url(&self, path: &str, expires_in: Duration) -> Result<String> {
        let path = self.entry_path(path)?;
        self.adapter
            .temporary_url(&path, expires_in)
            .await
            .map_err(|source| {
                translate(
                    Operation::TemporaryUrl,
                    &path,
                    source,
                    unable!(UnableToGenerateTemporaryUrl),
                )
            })
    }
}

fn log_failure(operation: Operation, path: &StoragePath, source: &AdapterError) {
    tracing::debug!(
        operation = operation.as_str(),
        path = %path,
        error = %source,
        "storage operation failed"
    );
}

/// Map an adapter failure: missing targets become [`Error::NotFound`], the
/// rest go through `unable`.
fn translate(
    operation: Operation,
    path: &StoragePath,
    source: AdapterError,
    unable: impl FnOnce(String, AdapterError) -> Error,
) -> Error {
    log_failure(operation, path, &source);
    let location = path.to_string();
    if source.is_not_found() {
        Error::NotFound {
            location,
            operation,
            source,
        }
    } else {
        unable(location, source)
    }
}

fn metadata_error(path: &StoragePath, metadata: &'static str, source: AdapterError) -> Error {
    translate(Operation::RetrieveMetadata, path, source, |location, source| {
        Error::UnableToRetrieveMetadata {
            location,
            metadata,
            source,
        }
    })
}

/// Builder for a [`Filesystem`] with a custom normalizer or config.
///
/// ```rust
/// use flykit::{Filesystem, FilesystemConfig, InMemoryAdapter, SegmentNormalizer, Visibility};
///
/// let fs = Filesystem::builder(InMemoryAdapter::new())
///     .config(FilesystemConfig::new().default_file_visibility(Visibility::Private))
///     .path_normalizer(SegmentNormalizer)
///     .build();
/// assert_eq!(fs.config().default_file_visibility, Visibility::Private);
/// ```
pub struct FilesystemBuilder<A: Adapter> {
    adapter: A,
    config: FilesystemConfig,
    normalizer: Box<dyn PathNormalizer>,
}

impl<A: Adapter> FilesystemBuilder<A> {
    fn new(adapter: A) -> Self {
        Self {
            adapter,
            config: FilesystemConfig::default(),
            normalizer: Box::new(SegmentNormalizer),
        }
    }

    pub fn config(mut self, config: FilesystemConfig) -> Self {
        self.config = config;
        self
    }

    pub fn path_normalizer(mut self, normalizer: impl PathNormalizer + 'static) -> Self {
        self.normalizer = Box::new(normalizer);
        self
    }

    pub fn build(self) -> Filesystem<A> {
        Filesystem {
            adapter: self.adapter,
            config: self.config,
            normalizer: self.normalizer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{InMemoryAdapter, ListingStream};
    use crate::config::WriteConfig;
    use crate::error::AdapterResult;
    use std::error::Error as _;

    fn fs() -> Filesystem<InMemoryAdapter> {
        Filesystem::new(InMemoryAdapter::new(), FilesystemConfig::default())
    }

    #[tokio::test]
    async fn file_operations_reject_root() {
        let fs = fs();
        let err = fs.write("/", b"x", None).await.unwrap_err();
        assert!(matches!(err, Error::InvalidPath { .. }));
        let err = fs.read("./").await.unwrap_err();
        assert!(matches!(err, Error::InvalidPath { .. }));
        let err = fs.delete_directory("").await.unwrap_err();
        assert!(matches!(err, Error::InvalidPath { .. }));
    }

    #[tokio::test]
    async fn traversal_never_reaches_adapter() {
        let fs = fs();
        let err = fs.write("../escape.txt", b"x", None).await.unwrap_err();
        assert!(matches!(err, Error::PathTraversal { .. }));
        assert!(err.operation().is_none());
    }

    #[tokio::test]
    async fn missing_read_is_not_found_with_operation() {
        let fs = fs();
        let err = fs.read("missing.txt").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.operation(), Some(Operation::Read));
        assert_eq!(err.location(), "missing.txt");
        assert!(err.source().is_some());
    }

    #[tokio::test]
    async fn metadata_error_names_the_attribute() {
        let fs = fs();
        fs.create_directory("dir", None).await.unwrap();
        let err = fs.file_size("dir").await.unwrap_err();
        assert!(matches!(
            err,
            Error::UnableToRetrieveMetadata { metadata: "file_size", .. }
        ));
    }

    #[tokio::test]
    async fn write_injects_default_visibility() {
        let fs = Filesystem::builder(InMemoryAdapter::new())
            .config(FilesystemConfig::new().default_file_visibility(Visibility::Private))
            .build();
        fs.write("a.txt", b"a", None).await.unwrap();
        fs.write("b.txt", b"b", Some(Visibility::Public)).await.unwrap();
        assert_eq!(fs.visibility("a.txt").await.unwrap(), Visibility::Private);
        assert_eq!(fs.visibility("b.txt").await.unwrap(), Visibility::Public);
    }

    #[tokio::test]
    async fn write_if_absent_keeps_existing() {
        let fs = fs();
        assert!(fs.write_if_absent("a.txt", b"first", None).await.unwrap());
        assert!(!fs.write_if_absent("a.txt", b"second", None).await.unwrap());
        assert_eq!(fs.read_to_string("a.txt").await.unwrap(), "first");
    }

    #[tokio::test]
    async fn read_to_string_rejects_invalid_utf8() {
        let fs = fs();
        fs.write("bin", [0xff, 0xfe], None).await.unwrap();
        let err = fs.read_to_string("./data/../bin").await.unwrap_err();
        assert!(matches!(err, Error::UnableToRead { .. }));
        assert_eq!(err.location(), "bin");
    }

    #[tokio::test]
    async fn existence_checks_reject_root() {
        let fs = fs();
        for root in ["", "/", "./"] {
            let err = fs.file_exists(root).await.unwrap_err();
            assert!(matches!(err, Error::InvalidPath { .. }), "{root:?}");
            let err = fs.directory_exists(root).await.unwrap_err();
            assert!(matches!(err, Error::InvalidPath { .. }), "{root:?}");
            let err = fs.has(root).await.unwrap_err();
            assert!(matches!(err, Error::InvalidPath { .. }), "{root:?}");
        }
        assert!(fs.list_contents("", true).unwrap().to_vec().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn temporary_url_unsupported_in_memory() {
        let fs = fs();
        fs.write("a.txt", b"a", None).await.unwrap();
        let err = fs
            .temporary_url("a.txt", DEFAULT_TEMPORARY_URL_TTL)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnableToGenerateTemporaryUrl { .. }));
    }

    /// In-memory adapter whose `delete` fails for one path.
    struct FailingDelete {
        inner: InMemoryAdapter,
        fail: StoragePath,
    }

    #[async_trait::async_trait]
    impl Adapter for FailingDelete {
        async fn file_exists(&self, path: &StoragePath) -> AdapterResult<bool> {
            self.inner.file_exists(path).await
        }
        async fn directory_exists(&self, path: &StoragePath) -> AdapterResult<bool> {
            self.inner.directory_exists(path).await
        }
        async fn write(
            &self,
            path: &StoragePath,
            contents: &[u8],
            config: &WriteConfig,
        ) -> AdapterResult<()> {
            self.inner.write(path, contents, config).await
        }
        async fn read(&self, path: &StoragePath) -> AdapterResult<Vec<u8>> {
            self.inner.read(path).await
        }
        async fn delete(&self, path: &StoragePath) -> AdapterResult<()> {
            if *path == self.fail {
                return Err(AdapterError::rejected("permission denied"));
            }
            self.inner.delete(path).await
        }
        async fn delete_directory(&self, path: &StoragePath) -> AdapterResult<()> {
            self.inner.delete_directory(path).await
        }
        async fn create_directory(
            &self,
            path: &StoragePath,
            config: &WriteConfig,
        ) -> AdapterResult<()> {
            self.inner.create_directory(path, config).await
        }
        fn list_contents<'a>(&'a self, path: &StoragePath, deep: bool) -> ListingStream<'a> {
            self.inner.list_contents(path, deep)
        }
        async fn last_modified(&self, path: &StoragePath) -> AdapterResult<i64> {
            self.inner.last_modified(path).await
        }
        async fn file_size(&self, path: &StoragePath) -> AdapterResult<u64> {
            self.inner.file_size(path).await
        }
        async fn mime_type(&self, path: &StoragePath) -> AdapterResult<Option<String>> {
            self.inner.mime_type(path).await
        }
        async fn visibility(&self, path: &StoragePath) -> AdapterResult<Visibility> {
            self.inner.visibility(path).await
        }
        async fn set_visibility(
            &self,
            path: &StoragePath,
            visibility: Visibility,
        ) -> AdapterResult<()> {
            self.inner.set_visibility(path, visibility).await
        }
        async fn move_file(
            &self,
            source: &StoragePath,
            destination: &StoragePath,
            config: &WriteConfig,
        ) -> AdapterResult<()> {
            self.inner.move_file(source, destination, config).await
        }
        async fn copy_file(
            &self,
            source: &StoragePath,
            destination: &StoragePath,
            config: &WriteConfig,
        ) -> AdapterResult<()> {
            self.inner.copy_file(source, destination, config).await
        }
    }

    #[tokio::test]
    async fn delete_directory_stops_at_first_failing_child() {
        let fs = Filesystem::new(
            FailingDelete {
                inner: InMemoryAdapter::new(),
                fail: StoragePath::parse("tree/b.txt").unwrap(),
            },
            FilesystemConfig::default(),
        );
        for name in ["tree/c.txt", "tree/a.txt", "tree/b.txt", "tree/sub/d.txt"] {
            fs.write(name, b"x", None).await.unwrap();
        }

        let err = fs.delete_directory("tree").await.unwrap_err();
        match &err {
            Error::UnableToDeleteDirectory {
                location, child, ..
            } => {
                assert_eq!(location, "tree");
                assert_eq!(child.as_deref(), Some("tree/b.txt"));
            }
            other => panic!("expected UnableToDeleteDirectory, got {other:?}"),
        }
        assert!(err.source().is_some());

        assert!(!fs.file_exists("tree/a.txt").await.unwrap());
        assert!(fs.file_exists("tree/b.txt").await.unwrap());
        assert!(fs.file_exists("tree/c.txt").await.unwrap());
        assert!(fs.file_exists("tree/sub/d.txt").await.unwrap());
        assert!(fs.directory_exists("tree").await.unwrap());
    }

    struct LowercaseNormalizer;

    impl PathNormalizer for LowercaseNormalizer {
        fn normalize(&self, raw: &str) -> Result<StoragePath> {
            StoragePath::parse(&raw.to_lowercase())
        }
    }

    #[tokio::test]
    async fn custom_normalizer_is_used() {
        let fs = Filesystem::builder(InMemoryAdapter::new())
            .path_normalizer(LowercaseNormalizer)
            .build();
        fs.write("Docs/README.txt", b"x", None).await.unwrap();
        assert!(fs.file_exists("docs/readme.txt").await.unwrap());
    }

    #[tokio::test]
    async fn has_sees_files_and_directories() {
        let fs = fs();
        fs.write("d/a.txt", b"a", None).await.unwrap();
        assert!(fs.has("d").await.unwrap());
        assert!(fs.has("d/a.txt").await.unwrap());
        assert!(!fs.has("d/b.txt").await.unwrap());
    }
}
