//! Storage adapter contract.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                     Filesystem                      │
//! │   (normalize, inject defaults, translate errors)    │
//! └──────────────────────────┬──────────────────────────┘
//!                            │ Adapter
//!         ┌──────────────────┼──────────────────┐
//!         │                  │                  │
//! ┌───────▼───────┐  ┌───────▼───────┐  ┌───────▼───────┐
//! │InMemoryAdapter│  │ LocalAdapter  │  │  ObjectStore- │
//! │  (built-in)   │  │  (tokio::fs)  │  │    Adapter    │
//! └───────────────┘  └───────────────┘  └───────┬───────┘
//!                                               │ ObjectStoreClient
//!                                       ┌───────▼───────┐
//!                                       │   cloud SDK   │
//!                                       └───────────────┘
//! ```
//!
//! # Contract
//!
//! Adapters are expected to:
//! - Accept only normalized [`StoragePath`]s and never re-interpret `.`/`..`
//! - Report missing targets of read, metadata, delete and visibility calls as
//!   [`AdapterError::NotFound`]
//! - Overwrite on `write`, creating missing parents with
//!   [`WriteConfig::directory_visibility`]
//! - Yield an empty listing for a directory that does not exist
//!
//! Adapters do NOT need to:
//! - Delete non-empty directories (the facade removes children first)
//! - Retry, cache or time out requests
//!
//! [`Backend`] is the closed set of adapters shipped with this crate.

use std::io::Cursor;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::attributes::FileAttributes;
use crate::config::WriteConfig;
use crate::error::{AdapterError, AdapterResult};
use crate::path::StoragePath;
use crate::visibility::Visibility;

pub mod local;
pub mod memory;
pub mod object_store;

pub use local::LocalAdapter;
pub use memory::InMemoryAdapter;
pub use object_store::ObjectStoreAdapter;

/// Readable byte stream handed in and out of adapters.
pub type ByteReader = Pin<Box<dyn AsyncRead + Send>>;

/// Stream of listing entries.
pub type ListingStream<'a> = BoxStream<'a, AdapterResult<FileAttributes>>;

/// Storage capability set every backend implements.
///
/// All implementations must be `Send + Sync`; one adapter instance serves
/// concurrent callers.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// True when a file exists at `path`. Directories answer `false`.
    async fn file_exists(&self, path: &StoragePath) -> AdapterResult<bool>;

    /// True when a directory exists at `path`, explicitly or implied.
    async fn directory_exists(&self, path: &StoragePath) -> AdapterResult<bool>;

    /// Write `contents`, replacing any existing file.
    async fn write(
        &self,
        path: &StoragePath,
        contents: &[u8],
        config: &WriteConfig,
    ) -> AdapterResult<()>;

    /// Write from a reader. The default buffers the stream and calls
    /// [`write`](Adapter::write).
    async fn write_stream(
        &self,
        path: &StoragePath,
        mut reader: ByteReader,
        config: &WriteConfig,
    ) -> AdapterResult<()> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        self.write(path, &buf, config).await
    }

    async fn read(&self, path: &StoragePath) -> AdapterResult<Vec<u8>>;

    /// Open a reader. The default reads the whole file into memory.
    async fn read_stream(&self, path: &StoragePath) -> AdapterResult<ByteReader> {
        let contents = self.read(path).await?;
        Ok(Box::pin(Cursor::new(contents)))
    }

    /// Delete a file.
    async fn delete(&self, path: &StoragePath) -> AdapterResult<()>;

    /// Remove a directory whose children have already been removed.
    async fn delete_directory(&self, path: &StoragePath) -> AdapterResult<()>;

    /// Create a directory and any missing parents.
    async fn create_directory(&self, path: &StoragePath, config: &WriteConfig)
    -> AdapterResult<()>;

    /// List entries below `path`; `deep` descends into subdirectories.
    ///
    /// Each call issues a fresh query. Ordering is whatever the backend
    /// returns.
    fn list_contents<'a>(&'a self, path: &StoragePath, deep: bool) -> ListingStream<'a>;

    /// Epoch seconds.
    async fn last_modified(&self, path: &StoragePath) -> AdapterResult<i64>;

    async fn file_size(&self, path: &StoragePath) -> AdapterResult<u64>;

    async fn mime_type(&self, path: &StoragePath) -> AdapterResult<Option<String>>;

    async fn visibility(&self, path: &StoragePath) -> AdapterResult<Visibility>;

    async fn set_visibility(&self, path: &StoragePath, visibility: Visibility)
    -> AdapterResult<()>;

    /// Move a file, creating the destination's parents.
    async fn move_file(
        &self,
        source: &StoragePath,
        destination: &StoragePath,
        config: &WriteConfig,
    ) -> AdapterResult<()>;

    /// Copy a file, creating the destination's parents.
    async fn copy_file(
        &self,
        source: &StoragePath,
        destination: &StoragePath,
        config: &WriteConfig,
    ) -> AdapterResult<()>;

    /// A time-limited URL granting read access to `path`.
    async fn temporary_url(
        &self,
        _path: &StoragePath,
        _expires_in: Duration,
    ) -> AdapterResult<String> {
        Err(AdapterError::Unsupported("temporary urls"))
    }
}

/// The adapters shipped with flykit, selected at runtime.
///
/// `Filesystem<Backend>` is the default facade type.
pub enum Backend {
    Memory(InMemoryAdapter),
    Local(LocalAdapter),
    ObjectStore(ObjectStoreAdapter),
}

impl Backend {
    /// Short backend family name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Memory(_) => "memory",
            Backend::Local(_) => "local",
            Backend::ObjectStore(_) => "object-store",
        }
    }
}

impl From<InMemoryAdapter> for Backend {
    fn from(adapter: InMemoryAdapter) -> Self {
        Backend::Memory(adapter)
    }
}

impl From<LocalAdapter> for Backend {
    fn from(adapter: LocalAdapter) -> Self {
        Backend::Local(adapter)
    }
}

impl From<ObjectStoreAdapter> for Backend {
    fn from(adapter: ObjectStoreAdapter) -> Self {
        Backend::ObjectStore(adapter)
    }
}

macro_rules! dispatch {
    ($self:ident, $adapter:ident => $call:expr) => {
        match $self {
            Backend::Memory($adapter) => $call,
            Backend::Local($adapter) => $call,
            Backend::ObjectStore($adapter) => $call,
        }
    };
}

#[async_trait]
impl Adapter for Backend {
    async fn file_exists(&self, path: &StoragePath) -> AdapterResult<bool> {
        dispatch!(self, a => a.file_exists(path).await)
    }

    async fn directory_exists(&self, path: &StoragePath) -> AdapterResult<bool> {
        dispatch!(self, a => a.directory_exists(path).await)
    }

    async fn write(
        &self,
        path: &StoragePath,
        contents: &[u8],
        config: &WriteConfig,
    ) -> AdapterResult<()> {
        dispatch!(self, a => a.write(path, contents, config).await)
    }

    async fn write_stream(
        &self,
        path: &StoragePath,
        reader: ByteReader,
        config: &WriteConfig,
    ) -> AdapterResult<()> {
        dispatch!(self, a => a.write_stream(path, reader, config).await)
    }

    async fn read(&self, path: &StoragePath) -> AdapterResult<Vec<u8>> {
        dispatch!(self, a => a.read(path).await)
    }

    async fn read_stream(&self, path: &StoragePath) -> AdapterResult<ByteReader> {
        dispatch!(self, a => a.read_stream(path).await)
    }

    async fn delete(&self, path: &StoragePath) -> AdapterResult<()> {
        dispatch!(self, a => a.delete(path).await)
    }

    async fn delete_directory(&self, path: &StoragePath) -> AdapterResult<()> {
        dispatch!(self, a => a.delete_directory(path).await)
    }

    async fn create_directory(
        &self,
        path: &StoragePath,
        config: &WriteConfig,
    ) -> AdapterResult<()> {
        dispatch!(self, a => a.create_directory(path, config).await)
    }

    fn list_contents<'a>(&'a self, path: &StoragePath, deep: bool) -> ListingStream<'a> {
        dispatch!(self, a => a.list_contents(path, deep))
    }

    async fn last_modified(&self, path: &StoragePath) -> AdapterResult<i64> {
        dispatch!(self, a => a.last_modified(path).await)
    }

    async fn file_size(&self, path: &StoragePath) -> AdapterResult<u64> {
        dispatch!(self, a => a.file_size(path).await)
    }

    async fn mime_type(&self, path: &StoragePath) -> AdapterResult<Option<String>> {
        dispatch!(self, a => a.mime_type(path).await)
    }

    async fn visibility(&self, path: &StoragePath) -> AdapterResult<Visibility> {
        dispatch!(self, a => a.visibility(path).await)
    }

    async fn set_visibility(
        &self,
        path: &StoragePath,
        visibility: Visibility,
    ) -> AdapterResult<()> {
        dispatch!(self, a => a.set_visibility(path, visibility).await)
    }

    async fn move_file(
        &self,
        source: &StoragePath,
        destination: &StoragePath,
        config: &WriteConfig,
    ) -> AdapterResult<()> {
        dispatch!(self, a => a.move_file(source, destination, config).await)
    }

    async fn copy_file(
        &self,
        source: &StoragePath,
        destination: &StoragePath,
        config: &WriteConfig,
    ) -> AdapterResult<()> {
        dispatch!(self, a => a.copy_file(source, destination, config).await)
    }

    async fn temporary_url(
        &self,
        path: &StoragePath,
        expires_in: Duration,
    ) -> AdapterResult<String> {
        dispatch!(self, a => a.temporary_url(path, expires_in).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    /// Minimal adapter relying on the trait defaults.
    struct StubAdapter;

    #[async_trait]
    impl Adapter for StubAdapter {
        async fn file_exists(&self, _path: &StoragePath) -> AdapterResult<bool> {
            Ok(false)
        }
        async fn directory_exists(&self, _path: &StoragePath) -> AdapterResult<bool> {
            Ok(false)
        }
        async fn write(
            &self,
            _path: &StoragePath,
            _contents: &[u8],
            _config: &WriteConfig,
        ) -> AdapterResult<()> {
            Ok(())
        }
        async fn read(&self, _path: &StoragePath) -> AdapterResult<Vec<u8>> {
            Ok(b"stub".to_vec())
        }
        async fn delete(&self, path: &StoragePath) -> AdapterResult<()> {
            Err(AdapterError::not_found(path.as_str()))
        }
        async fn delete_directory(&self, _path: &StoragePath) -> AdapterResult<()> {
            Ok(())
        }
        async fn create_directory(
            &self,
            _path: &StoragePath,
            _config: &WriteConfig,
        ) -> AdapterResult<()> {
            Ok(())
        }
        fn list_contents<'a>(&'a self, _path: &StoragePath, _deep: bool) -> ListingStream<'a> {
            futures_util::stream::empty().boxed()
        }
        async fn last_modified(&self, _path: &StoragePath) -> AdapterResult<i64> {
            Ok(0)
        }
        async fn file_size(&self, _path: &StoragePath) -> AdapterResult<u64> {
            Ok(0)
        }
        async fn mime_type(&self, _path: &StoragePath) -> AdapterResult<Option<String>> {
            Ok(None)
        }
        async fn visibility(&self, _path: &StoragePath) -> AdapterResult<Visibility> {
            Ok(Visibility::Private)
        }
        async fn set_visibility(
            &self,
            _path: &StoragePath,
            _visibility: Visibility,
        ) -> AdapterResult<()> {
            Ok(())
        }
        async fn move_file(
            &self,
            _source: &StoragePath,
            _destination: &StoragePath,
            _config: &WriteConfig,
        ) -> AdapterResult<()> {
            Ok(())
        }
        async fn copy_file(
            &self,
            _source: &StoragePath,
            _destination: &StoragePath,
            _config: &WriteConfig,
        ) -> AdapterResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn default_read_stream_wraps_read() {
        let mut reader = StubAdapter.read_stream(&StoragePath::root()).await.unwrap();
        let mut out = String::new();
        reader.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "stub");
    }

    #[tokio::test]
    async fn default_temporary_url_is_unsupported() {
        let err = StubAdapter
            .temporary_url(&StoragePath::root(), Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::Unsupported(_)));
    }

    #[tokio::test]
    async fn backend_dispatches_to_variant() {
        let backend = Backend::from(InMemoryAdapter::new());
        assert_eq!(backend.name(), "memory");
        let path = StoragePath::parse("a.txt").unwrap();
        backend
            .write(&path, b"hi", &WriteConfig::default())
            .await
            .unwrap();
        assert!(backend.file_exists(&path).await.unwrap());
        assert_eq!(backend.read(&path).await.unwrap(), b"hi");
    }
}
