//! Local disk adapter.
//!
//! Maps storage paths below a root directory using `tokio::fs`. Visibility is
//! stored as POSIX permission bits through [`UnixVisibility`]; on platforms
//! without permission bits every entry reports the public mode.

use std::collections::VecDeque;
use std::fs::Metadata;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream;
use tokio::io::AsyncWriteExt;

use super::{Adapter, ByteReader, ListingStream};
use crate::attributes::{EntryKind, FileAttributes, epoch_seconds, guess_mime_type};
use crate::config::WriteConfig;
use crate::error::{AdapterError, AdapterResult};
use crate::path::StoragePath;
use crate::visibility::{UnixVisibility, Visibility};

/// Adapter for a directory on the local filesystem.
///
/// # Example
///
/// ```rust,no_run
/// use flykit::{Filesystem, FilesystemConfig, LocalAdapter};
///
/// # async fn run() -> anyhow::Result<()> {
/// let adapter = LocalAdapter::new("/var/lib/myapp/storage").await?;
/// let fs = Filesystem::new(adapter, FilesystemConfig::default());
/// fs.write("reports/today.csv", b"a,b\n1,2\n", None).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct LocalAdapter {
    root: PathBuf,
    visibility: UnixVisibility,
}

impl LocalAdapter {
    /// Open `root`, creating it with the default directory mode if missing.
    pub async fn new(root: impl Into<PathBuf>) -> AdapterResult<Self> {
        Self::with_visibility(root, UnixVisibility::default()).await
    }

    pub async fn with_visibility(
        root: impl Into<PathBuf>,
        visibility: UnixVisibility,
    ) -> AdapterResult<Self> {
        let root = root.into();
        match tokio::fs::metadata(&root).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(AdapterError::rejected(format!(
                    "root is not a directory: {}",
                    root.display()
                )));
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tokio::fs::create_dir_all(&root).await?;
                set_mode(&root, visibility.default_for_directory()).await?;
                tracing::debug!(root = %root.display(), "created local adapter root");
            }
            Err(err) => return Err(err.into()),
        }
        Ok(Self { root, visibility })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, path: &StoragePath) -> PathBuf {
        let mut full = self.root.clone();
        for segment in path.segments() {
            full.push(segment);
        }
        full
    }

    async fn stat(&self, path: &StoragePath) -> AdapterResult<Metadata> {
        tokio::fs::metadata(self.full_path(path))
            .await
            .map_err(|err| map_io(err, path))
    }

    async fn stat_file(&self, path: &StoragePath) -> AdapterResult<Metadata> {
        let meta = self.stat(path).await?;
        if meta.is_dir() {
            return Err(AdapterError::rejected("is a directory"));
        }
        Ok(meta)
    }

    /// Create `path` with `visibility`, and missing ancestors with
    /// `parent_visibility`. Existing directories keep their mode.
    async fn ensure_directory(
        &self,
        path: &StoragePath,
        visibility: Visibility,
        parent_visibility: Visibility,
    ) -> AdapterResult<()> {
        for ancestor in path.ancestors() {
            self.create_one(&ancestor, parent_visibility).await?;
        }
        if !path.is_root() {
            self.create_one(path, visibility).await?;
        }
        Ok(())
    }

    async fn create_one(&self, path: &StoragePath, visibility: Visibility) -> AdapterResult<()> {
        let full = self.full_path(path);
        match tokio::fs::create_dir(&full).await {
            Ok(()) => {
                set_mode(&full, self.visibility.for_directory(visibility)).await?;
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                if tokio::fs::metadata(&full).await?.is_dir() {
                    Ok(())
                } else {
                    Err(AdapterError::rejected(format!("file exists: {path}")))
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn ensure_parent(&self, path: &StoragePath, config: &WriteConfig) -> AdapterResult<()> {
        match path.parent() {
            Some(parent) if !parent.is_root() => {
                self.ensure_directory(
                    &parent,
                    config.directory_visibility,
                    config.directory_visibility,
                )
                .await
            }
            _ => Ok(()),
        }
    }

    fn attributes(&self, path: &StoragePath, meta: &Metadata) -> FileAttributes {
        let kind = if meta.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        let mut attrs = match kind {
            EntryKind::Directory => FileAttributes::directory(path.clone())
                .with_visibility(self.visibility.inverse_for_directory(mode_of(meta))),
            EntryKind::File => {
                let attrs = FileAttributes::file(path.clone(), meta.len())
                    .with_visibility(self.visibility.inverse_for_file(mode_of(meta)));
                match guess_mime_type(path.as_str()) {
                    Some(mime) => attrs.with_mime_type(mime),
                    None => attrs,
                }
            }
        };
        if let Ok(modified) = meta.modified() {
            attrs = attrs.with_last_modified(epoch_seconds(modified));
        }
        attrs
    }

    /// Attributes for one directory entry and whether a deep walk descends
    /// into it. `None` when the entry vanished since it was read.
    async fn entry_attributes(
        &self,
        full: &Path,
        path: &StoragePath,
    ) -> AdapterResult<Option<(FileAttributes, bool)>> {
        let link_meta = match tokio::fs::symlink_metadata(full).await {
            Ok(meta) => meta,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        if !link_meta.file_type().is_symlink() {
            let descend = link_meta.is_dir();
            return Ok(Some((self.attributes(path, &link_meta), descend)));
        }
        // Symlinked directories are listed but never walked.
        match tokio::fs::metadata(full).await {
            Ok(target) => Ok(Some((self.attributes(path, &target), false))),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Ok(Some((self.attributes(path, &link_meta), false)))
            }
            Err(err) => Err(err.into()),
        }
    }
}

struct Walk {
    pending: VecDeque<StoragePath>,
    current: Option<(StoragePath, tokio::fs::ReadDir)>,
    deep: bool,
}

#[async_trait]
impl Adapter for LocalAdapter {
    async fn file_exists(&self, path: &StoragePath) -> AdapterResult<bool> {
        match tokio::fs::metadata(self.full_path(path)).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    async fn directory_exists(&self, path: &StoragePath) -> AdapterResult<bool> {
        match tokio::fs::metadata(self.full_path(path)).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    async fn write(
        &self,
        path: &StoragePath,
        contents: &[u8],
        config: &WriteConfig,
    ) -> AdapterResult<()> {
        self.ensure_parent(path, config).await?;
        let full = self.full_path(path);
        tokio::fs::write(&full, contents).await?;
        set_mode(&full, self.visibility.for_file(config.visibility)).await?;
        Ok(())
    }

    async fn write_stream(
        &self,
        path: &StoragePath,
        mut reader: ByteReader,
        config: &WriteConfig,
    ) -> AdapterResult<()> {
        self.ensure_parent(path, config).await?;
        let full = self.full_path(path);
        let mut file = tokio::fs::File::create(&full).await?;
        tokio::io::copy(&mut reader, &mut file).await?;
        file.flush().await?;
        set_mode(&full, self.visibility.for_file(config.visibility)).await?;
        Ok(())
    }

    async fn read(&self, path: &StoragePath) -> AdapterResult<Vec<u8>> {
        self.stat_file(path).await?;
        tokio::fs::read(self.full_path(path))
            .await
            .map_err(|err| map_io(err, path))
    }

    async fn read_stream(&self, path: &StoragePath) -> AdapterResult<ByteReader> {
        self.stat_file(path).await?;
        let file = tokio::fs::File::open(self.full_path(path))
            .await
            .map_err(|err| map_io(err, path))?;
        Ok(Box::pin(file))
    }

    async fn delete(&self, path: &StoragePath) -> AdapterResult<()> {
        let full = self.full_path(path);
        let meta = tokio::fs::symlink_metadata(&full)
            .await
            .map_err(|err| map_io(err, path))?;
        if meta.is_dir() {
            return Err(AdapterError::rejected("is a directory"));
        }
        tokio::fs::remove_file(&full)
            .await
            .map_err(|err| map_io(err, path))
    }

    async fn delete_directory(&self, path: &StoragePath) -> AdapterResult<()> {
        let full = self.full_path(path);
        let meta = tokio::fs::symlink_metadata(&full)
            .await
            .map_err(|err| map_io(err, path))?;
        // A symlinked directory goes away as a link; its target is untouched.
        let removed = if meta.file_type().is_symlink() {
            tokio::fs::remove_file(&full).await
        } else {
            tokio::fs::remove_dir(&full).await
        };
        removed.map_err(|err| map_io(err, path))
    }

    async fn create_directory(
        &self,
        path: &StoragePath,
        config: &WriteConfig,
    ) -> AdapterResult<()> {
        self.ensure_directory(path, config.visibility, config.directory_visibility)
            .await
    }

    fn list_contents<'a>(&'a self, path: &StoragePath, deep: bool) -> ListingStream<'a> {
        let walk = Walk {
            pending: VecDeque::from([path.clone()]),
            current: None,
            deep,
        };
        stream::unfold(walk, move |mut walk| async move {
            loop {
                if let Some((dir, entries)) = walk.current.as_mut() {
                    match entries.next_entry().await {
                        Ok(Some(entry)) => {
                            let name = entry.file_name().to_string_lossy().into_owned();
                            let path = dir.join(&name);
                            match self.entry_attributes(&entry.path(), &path).await {
                                Ok(Some((attrs, descend))) => {
                                    if descend && walk.deep {
                                        walk.pending.push_back(path);
                                    }
                                    return Some((Ok(attrs), walk));
                                }
                                Ok(None) => continue,
                                Err(err) => return Some((Err(err), walk)),
                            }
                        }
                        Ok(None) => walk.current = None,
                        Err(err) => {
                            walk.current = None;
                            return Some((Err(err.into()), walk));
                        }
                    }
                } else if let Some(next) = walk.pending.pop_front() {
                    match tokio::fs::read_dir(self.full_path(&next)).await {
                        Ok(entries) => walk.current = Some((next, entries)),
                        Err(err) if err.kind() == ErrorKind::NotFound => continue,
                        Err(err) => return Some((Err(err.into()), walk)),
                    }
                } else {
                    return None;
                }
            }
        })
        .boxed()
    }

    async fn last_modified(&self, path: &StoragePath) -> AdapterResult<i64> {
        let meta = self.stat(path).await?;
        Ok(epoch_seconds(meta.modified()?))
    }

    async fn file_size(&self, path: &StoragePath) -> AdapterResult<u64> {
        Ok(self.stat_file(path).await?.len())
    }

    async fn mime_type(&self, path: &StoragePath) -> AdapterResult<Option<String>> {
        self.stat_file(path).await?;
        Ok(guess_mime_type(path.as_str()).map(String::from))
    }

    async fn visibility(&self, path: &StoragePath) -> AdapterResult<Visibility> {
        let meta = self.stat(path).await?;
        let mode = mode_of(&meta);
        Ok(if meta.is_dir() {
            self.visibility.inverse_for_directory(mode)
        } else {
            self.visibility.inverse_for_file(mode)
        })
    }

    async fn set_visibility(
        &self,
        path: &StoragePath,
        visibility: Visibility,
    ) -> AdapterResult<()> {
        let meta = self.stat(path).await?;
        let mode = if meta.is_dir() {
            self.visibility.for_directory(visibility)
        } else {
            self.visibility.for_file(visibility)
        };
        set_mode(&self.full_path(path), mode).await?;
        Ok(())
    }

    async fn move_file(
        &self,
        source: &StoragePath,
        destination: &StoragePath,
        config: &WriteConfig,
    ) -> AdapterResult<()> {
        let meta = self.stat(source).await?;
        if meta.is_dir() {
            return Err(AdapterError::rejected("source is a directory"));
        }
        self.ensure_parent(destination, config).await?;
        tokio::fs::rename(self.full_path(source), self.full_path(destination)).await?;
        Ok(())
    }

    async fn copy_file(
        &self,
        source: &StoragePath,
        destination: &StoragePath,
        config: &WriteConfig,
    ) -> AdapterResult<()> {
        let full = self.full_path(source);
        let link_meta = tokio::fs::symlink_metadata(&full)
            .await
            .map_err(|err| map_io(err, source))?;
        if link_meta.file_type().is_symlink() && config.disallow_link_copies {
            return Err(AdapterError::rejected("source is a symbolic link"));
        }
        if self.stat(source).await?.is_dir() {
            return Err(AdapterError::rejected("source is a directory"));
        }
        self.ensure_parent(destination, config).await?;
        tokio::fs::copy(&full, self.full_path(destination)).await?;
        Ok(())
    }
}

fn map_io(err: io::Error, path: &StoragePath) -> AdapterError {
    if err.kind() == ErrorKind::NotFound {
        AdapterError::not_found(path.as_str())
    } else {
        err.into()
    }
}

#[cfg(unix)]
async fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).await
}

#[cfg(not(unix))]
async fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn mode_of(meta: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode()
}

#[cfg(not(unix))]
fn mode_of(meta: &Metadata) -> u32 {
    let defaults = UnixVisibility::default();
    if meta.is_dir() {
        defaults.for_directory(Visibility::Public)
    } else {
        defaults.for_file(Visibility::Public)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::TryStreamExt;

    fn p(raw: &str) -> StoragePath {
        StoragePath::parse(raw).unwrap()
    }

    async fn adapter() -> (tempfile::TempDir, LocalAdapter) {
        let dir = tempfile::tempdir().unwrap();
        let adapter = LocalAdapter::new(dir.path().join("storage")).await.unwrap();
        (dir, adapter)
    }

    #[tokio::test]
    async fn creates_root() {
        let (dir, adapter) = adapter().await;
        assert!(dir.path().join("storage").is_dir());
        assert!(adapter.directory_exists(&StoragePath::root()).await.unwrap());
    }

    #[tokio::test]
    async fn root_must_be_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain");
        std::fs::write(&file, b"x").unwrap();
        let err = LocalAdapter::new(&file).await.unwrap_err();
        assert!(matches!(err, AdapterError::Rejected(_)));
    }

    #[tokio::test]
    async fn write_creates_parents() {
        let (dir, adapter) = adapter().await;
        adapter
            .write(&p("a/b/c.txt"), b"deep", &WriteConfig::default())
            .await
            .unwrap();
        let on_disk = std::fs::read(dir.path().join("storage/a/b/c.txt")).unwrap();
        assert_eq!(on_disk, b"deep");
        assert!(adapter.directory_exists(&p("a/b")).await.unwrap());
        assert!(!adapter.file_exists(&p("a/b")).await.unwrap());
    }

    #[tokio::test]
    async fn read_directory_is_rejected() {
        let (_dir, adapter) = adapter().await;
        adapter
            .create_directory(&p("d"), &WriteConfig::default())
            .await
            .unwrap();
        let err = adapter.read(&p("d")).await.unwrap_err();
        assert!(matches!(err, AdapterError::Rejected(_)));
    }

    #[tokio::test]
    async fn missing_paths_are_not_found() {
        let (_dir, adapter) = adapter().await;
        assert!(adapter.read(&p("x.txt")).await.unwrap_err().is_not_found());
        assert!(adapter.delete(&p("x.txt")).await.unwrap_err().is_not_found());
        assert!(
            adapter
                .last_modified(&p("x.txt"))
                .await
                .unwrap_err()
                .is_not_found()
        );
    }

    #[tokio::test]
    async fn listing_missing_directory_is_empty() {
        let (_dir, adapter) = adapter().await;
        let entries: Vec<_> = adapter
            .list_contents(&p("nothing/here"), true)
            .try_collect()
            .await
            .unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn deep_listing_walks_subdirectories() {
        let (_dir, adapter) = adapter().await;
        let config = WriteConfig::default();
        adapter.write(&p("docs/a.txt"), b"a", &config).await.unwrap();
        adapter.write(&p("docs/sub/b.txt"), b"bb", &config).await.unwrap();

        let mut entries: Vec<(String, bool)> = adapter
            .list_contents(&p("docs"), true)
            .map_ok(|a| (a.path().to_string(), a.is_dir()))
            .try_collect()
            .await
            .unwrap();
        entries.sort();
        assert_eq!(
            entries,
            vec![
                ("docs/a.txt".to_string(), false),
                ("docs/sub".to_string(), true),
                ("docs/sub/b.txt".to_string(), false),
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn visibility_maps_to_mode_bits() {
        use std::os::unix::fs::PermissionsExt;

        let (dir, adapter) = adapter().await;
        let config = WriteConfig {
            visibility: Visibility::Private,
            directory_visibility: Visibility::Public,
            disallow_link_copies: false,
        };
        adapter.write(&p("d/f.txt"), b"x", &config).await.unwrap();
        let file_mode = std::fs::metadata(dir.path().join("storage/d/f.txt"))
            .unwrap()
            .permissions()
            .mode();
        let dir_mode = std::fs::metadata(dir.path().join("storage/d"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(file_mode & 0o777, 0o600);
        assert_eq!(dir_mode & 0o777, 0o755);

        adapter
            .set_visibility(&p("d/f.txt"), Visibility::Public)
            .await
            .unwrap();
        assert_eq!(
            adapter.visibility(&p("d/f.txt")).await.unwrap(),
            Visibility::Public
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unknown_mode_reports_private() {
        use std::os::unix::fs::PermissionsExt;

        let (dir, adapter) = adapter().await;
        adapter
            .write(&p("odd.txt"), b"x", &WriteConfig::default())
            .await
            .unwrap();
        std::fs::set_permissions(
            dir.path().join("storage/odd.txt"),
            std::fs::Permissions::from_mode(0o640),
        )
        .unwrap();
        assert_eq!(
            adapter.visibility(&p("odd.txt")).await.unwrap(),
            Visibility::Private
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn link_copies_can_be_disallowed() {
        let (dir, adapter) = adapter().await;
        let config = WriteConfig::default();
        adapter.write(&p("target.txt"), b"t", &config).await.unwrap();
        std::os::unix::fs::symlink(
            dir.path().join("storage/target.txt"),
            dir.path().join("storage/link.txt"),
        )
        .unwrap();

        adapter
            .copy_file(&p("link.txt"), &p("copy1.txt"), &config)
            .await
            .unwrap();
        assert_eq!(adapter.read(&p("copy1.txt")).await.unwrap(), b"t");

        let strict = WriteConfig {
            disallow_link_copies: true,
            ..config
        };
        let err = adapter
            .copy_file(&p("link.txt"), &p("copy2.txt"), &strict)
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::Rejected(_)));
    }
}
