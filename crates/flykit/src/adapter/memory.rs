//! In-memory adapter

use std::collections::HashMap;

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream;
use tokio::sync::RwLock;

use super::{Adapter, ListingStream};
use crate::attributes::{FileAttributes, guess_mime_type, now_epoch_seconds};
use crate::config::WriteConfig;
use crate::error::{AdapterError, AdapterResult};
use crate::path::StoragePath;
use crate::visibility::Visibility;

/// In-memory adapter.
///
/// Stores files and directories in a map keyed by normalized path. The root
/// always exists and is never stored.
#[derive(Default)]
pub struct InMemoryAdapter {
    entries: RwLock<HashMap<StoragePath, Entry>>,
}

#[derive(Debug, Clone)]
enum Entry {
    File {
        contents: Vec<u8>,
        last_modified: i64,
        visibility: Visibility,
    },
    Directory {
        last_modified: i64,
        visibility: Visibility,
    },
}

impl Entry {
    fn attributes(&self, path: &StoragePath) -> FileAttributes {
        match self {
            Entry::File {
                contents,
                last_modified,
                visibility,
            } => {
                let attrs = FileAttributes::file(path.clone(), contents.len() as u64)
                    .with_last_modified(*last_modified)
                    .with_visibility(*visibility);
                match guess_mime_type(path.as_str()) {
                    Some(mime) => attrs.with_mime_type(mime),
                    None => attrs,
                }
            }
            Entry::Directory {
                last_modified,
                visibility,
            } => FileAttributes::directory(path.clone())
                .with_last_modified(*last_modified)
                .with_visibility(*visibility),
        }
    }
}

impl InMemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert missing ancestors of `path` as directories.
    fn ensure_parents(
        entries: &mut HashMap<StoragePath, Entry>,
        path: &StoragePath,
        visibility: Visibility,
    ) -> AdapterResult<()> {
        for ancestor in path.ancestors() {
            match entries.get(&ancestor) {
                Some(Entry::Directory { .. }) => {}
                Some(Entry::File { .. }) => {
                    return Err(AdapterError::rejected(format!(
                        "parent is a file: {ancestor}"
                    )));
                }
                None => {
                    entries.insert(
                        ancestor,
                        Entry::Directory {
                            last_modified: now_epoch_seconds(),
                            visibility,
                        },
                    );
                }
            }
        }
        Ok(())
    }

    /// A file may not replace a directory; its children would be orphaned.
    fn reject_directory(
        entries: &HashMap<StoragePath, Entry>,
        path: &StoragePath,
    ) -> AdapterResult<()> {
        match entries.get(path) {
            Some(Entry::Directory { .. }) => Err(AdapterError::rejected("is a directory")),
            _ => Ok(()),
        }
    }

    async fn file_entry<T>(
        &self,
        path: &StoragePath,
        f: impl FnOnce(&[u8], i64, Visibility) -> T,
    ) -> AdapterResult<T> {
        let entries = self.entries.read().await;
        match entries.get(path) {
            Some(Entry::File {
                contents,
                last_modified,
                visibility,
            }) => Ok(f(contents.as_slice(), *last_modified, *visibility)),
            Some(Entry::Directory { .. }) => Err(AdapterError::rejected("is a directory")),
            None => Err(AdapterError::not_found(path.as_str())),
        }
    }
}

#[async_trait]
impl Adapter for InMemoryAdapter {
    async fn file_exists(&self, path: &StoragePath) -> AdapterResult<bool> {
        let entries = self.entries.read().await;
        Ok(matches!(entries.get(path), Some(Entry::File { .. })))
    }

    async fn directory_exists(&self, path: &StoragePath) -> AdapterResult<bool> {
        if path.is_root() {
            return Ok(true);
        }
        let entries = self.entries.read().await;
        Ok(matches!(entries.get(path), Some(Entry::Directory { .. })))
    }

    async fn write(
        &self,
        path: &StoragePath,
        contents: &[u8],
        config: &WriteConfig,
    ) -> AdapterResult<()> {
        let mut entries = self.entries.write().await;
        Self::reject_directory(&entries, path)?;
        Self::ensure_parents(&mut entries, path, config.directory_visibility)?;
        entries.insert(
            path.clone(),
            Entry::File {
                contents: contents.to_vec(),
                last_modified: now_epoch_seconds(),
                visibility: config.visibility,
            },
        );
        Ok(())
    }

    async fn read(&self, path: &StoragePath) -> AdapterResult<Vec<u8>> {
        self.file_entry(path, |contents, _, _| contents.to_vec()).await
    }

    async fn delete(&self, path: &StoragePath) -> AdapterResult<()> {
        let mut entries = self.entries.write().await;
        match entries.get(path) {
            Some(Entry::File { .. }) => {
                entries.remove(path);
                Ok(())
            }
            Some(Entry::Directory { .. }) => Err(AdapterError::rejected("is a directory")),
            None => Err(AdapterError::not_found(path.as_str())),
        }
    }

    async fn delete_directory(&self, path: &StoragePath) -> AdapterResult<()> {
        let mut entries = self.entries.write().await;
        match entries.get(path) {
            Some(Entry::Directory { .. }) => {
                let has_children = entries.keys().any(|p| p != path && p.starts_with(path));
                if has_children {
                    return Err(AdapterError::rejected("directory not empty"));
                }
                entries.remove(path);
                Ok(())
            }
            Some(Entry::File { .. }) => Err(AdapterError::rejected("not a directory")),
            None => Err(AdapterError::not_found(path.as_str())),
        }
    }

    async fn create_directory(
        &self,
        path: &StoragePath,
        config: &WriteConfig,
    ) -> AdapterResult<()> {
        let mut entries = self.entries.write().await;
        match entries.get(path) {
            Some(Entry::Directory { .. }) => return Ok(()),
            Some(Entry::File { .. }) => return Err(AdapterError::rejected("file exists")),
            None => {}
        }
        Self::ensure_parents(&mut entries, path, config.directory_visibility)?;
        entries.insert(
            path.clone(),
            Entry::Directory {
                last_modified: now_epoch_seconds(),
                visibility: config.visibility,
            },
        );
        Ok(())
    }

    fn list_contents<'a>(&'a self, path: &StoragePath, deep: bool) -> ListingStream<'a> {
        let base = path.clone();
        stream::once(async move {
            let entries = self.entries.read().await;
            let listed: Vec<AdapterResult<FileAttributes>> = entries
                .iter()
                .filter(|(p, _)| {
                    if *p == &base || !p.starts_with(&base) {
                        return false;
                    }
                    deep || p.parent().as_ref() == Some(&base)
                })
                .map(|(p, entry)| Ok(entry.attributes(p)))
                .collect();
            stream::iter(listed)
        })
        .flatten()
        .boxed()
    }

    async fn last_modified(&self, path: &StoragePath) -> AdapterResult<i64> {
        let entries = self.entries.read().await;
        match entries.get(path) {
            Some(Entry::File { last_modified, .. })
            | Some(Entry::Directory { last_modified, .. }) => Ok(*last_modified),
            None => Err(AdapterError::not_found(path.as_str())),
        }
    }

    async fn file_size(&self, path: &StoragePath) -> AdapterResult<u64> {
        self.file_entry(path, |contents, _, _| contents.len() as u64)
            .await
    }

    async fn mime_type(&self, path: &StoragePath) -> AdapterResult<Option<String>> {
        self.file_entry(path, |_, _, _| guess_mime_type(path.as_str()).map(String::from))
            .await
    }

    async fn visibility(&self, path: &StoragePath) -> AdapterResult<Visibility> {
        let entries = self.entries.read().await;
        match entries.get(path) {
            Some(Entry::File { visibility, .. }) | Some(Entry::Directory { visibility, .. }) => {
                Ok(*visibility)
            }
            None => Err(AdapterError::not_found(path.as_str())),
        }
    }

    async fn set_visibility(
        &self,
        path: &StoragePath,
        visibility: Visibility,
    ) -> AdapterResult<()> {
        let mut entries = self.entries.write().await;
        match entries.get_mut(path) {
            Some(Entry::File {
                visibility: current,
                ..
            })
            | Some(Entry::Directory {
                visibility: current,
                ..
            }) => {
                *current = visibility;
                Ok(())
            }
            None => Err(AdapterError::not_found(path.as_str())),
        }
    }

    async fn move_file(
        &self,
        source: &StoragePath,
        destination: &StoragePath,
        config: &WriteConfig,
    ) -> AdapterResult<()> {
        let mut entries = self.entries.write().await;
        match entries.get(source) {
            Some(Entry::File { .. }) => {}
            Some(Entry::Directory { .. }) => {
                return Err(AdapterError::rejected("source is a directory"));
            }
            None => return Err(AdapterError::not_found(source.as_str())),
        }
        if source == destination {
            return Ok(());
        }
        Self::reject_directory(&entries, destination)?;
        Self::ensure_parents(&mut entries, destination, config.directory_visibility)?;
        if let Some(entry) = entries.remove(source) {
            entries.insert(destination.clone(), entry);
        }
        Ok(())
    }

    async fn copy_file(
        &self,
        source: &StoragePath,
        destination: &StoragePath,
        config: &WriteConfig,
    ) -> AdapterResult<()> {
        let mut entries = self.entries.write().await;
        let entry = match entries.get(source) {
            Some(entry @ Entry::File { .. }) => entry.clone(),
            Some(Entry::Directory { .. }) => {
                return Err(AdapterError::rejected("source is a directory"));
            }
            None => return Err(AdapterError::not_found(source.as_str())),
        };
        Self::reject_directory(&entries, destination)?;
        Self::ensure_parents(&mut entries, destination, config.directory_visibility)?;
        let entry = match entry {
            Entry::File {
                contents,
                visibility,
                ..
            } => Entry::File {
                contents,
                visibility,
                last_modified: now_epoch_seconds(),
            },
            dir => dir,
        };
        entries.insert(destination.clone(), entry);
        Ok(())
    }
}
