//! Object-store adapter.
//!
//! Object stores have a flat key namespace. This adapter maps the
//! hierarchical model onto it:
//!
//! | Concept | Key layout |
//! |---------|------------|
//! | File `docs/a.txt` | object `docs/a.txt` |
//! | Explicit directory `docs` | zero-byte placeholder `docs/` |
//! | Implied directory `docs` | any key starting with `docs/` |
//! | Visibility | canned ACL token through [`AclVisibility`] |
//!
//! Wire-level requests are the job of an [`ObjectStoreClient`], normally a
//! thin wrapper around a cloud SDK. [`MemoryObjectStore`] is an in-process
//! client with the same paging behavior.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream;
use thiserror::Error;
use tokio::sync::RwLock;

use super::{Adapter, ListingStream};
use crate::attributes::{FileAttributes, guess_mime_type, now_epoch_seconds};
use crate::config::WriteConfig;
use crate::error::{AdapterError, AdapterResult};
use crate::path::StoragePath;
use crate::visibility::{AclVisibility, Visibility};

/// Default page size requested from [`ObjectStoreClient::list_objects`].
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Errors surfaced by an [`ObjectStoreClient`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The key does not exist.
    #[error("no such key: {0}")]
    NoSuchKey(String),

    /// The service answered with an error code.
    #[error("service error {code}: {message}")]
    Service { code: String, message: String },

    /// The request never got an answer.
    #[error("transport error: {0}")]
    Transport(String),
}

impl ClientError {
    pub fn is_no_such_key(&self) -> bool {
        matches!(self, ClientError::NoSuchKey(_))
    }
}

/// Object metadata returned by a HEAD request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectHead {
    pub size: u64,
    /// Epoch seconds, service clock.
    pub last_modified: i64,
    pub content_type: Option<String>,
}

/// One object in a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
    pub last_modified: i64,
}

/// One page of a prefix listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    pub objects: Vec<ObjectSummary>,
    /// Key prefixes rolled up by the delimiter, each ending with it.
    pub common_prefixes: Vec<String>,
    /// Token for the next page, `None` on the last page.
    pub next_token: Option<String>,
}

/// Request for [`ObjectStoreClient::list_objects`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    pub prefix: String,
    pub delimiter: Option<char>,
    pub continuation: Option<String>,
    pub max_keys: usize,
}

/// Options for [`ObjectStoreClient::put_object`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutOptions {
    pub acl: Option<String>,
    pub content_type: Option<String>,
}

/// The storage-client seam.
///
/// Mirrors the handful of requests an S3-compatible SDK exposes. Retries,
/// signing and connection pooling belong to the implementation.
#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    /// `None` when the key does not exist.
    async fn head_object(&self, key: &str) -> Result<Option<ObjectHead>, ClientError>;

    async fn get_object(&self, key: &str) -> Result<Vec<u8>, ClientError>;

    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        options: PutOptions,
    ) -> Result<(), ClientError>;

    /// Deleting a missing key succeeds.
    async fn delete_object(&self, key: &str) -> Result<(), ClientError>;

    async fn copy_object(
        &self,
        source: &str,
        destination: &str,
        acl: Option<String>,
    ) -> Result<(), ClientError>;

    async fn list_objects(&self, request: ListRequest) -> Result<ListPage, ClientError>;

    /// The canned ACL token of an object.
    async fn get_object_acl(&self, key: &str) -> Result<String, ClientError>;

    async fn put_object_acl(&self, key: &str, acl: &str) -> Result<(), ClientError>;

    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String, ClientError>;
}

/// Adapter over an [`ObjectStoreClient`].
///
/// ```rust
/// use std::sync::Arc;
/// use flykit::{Filesystem, FilesystemConfig, MemoryObjectStore, ObjectStoreAdapter};
///
/// # async fn run() -> flykit::Result<()> {
/// let client = Arc::new(MemoryObjectStore::new("assets"));
/// let adapter = ObjectStoreAdapter::new(client).with_prefix("tenant-1");
/// let fs = Filesystem::new(adapter, FilesystemConfig::default());
/// fs.write("logo.svg", b"<svg/>", None).await?;
/// assert!(fs.file_exists("logo.svg").await?);
/// # Ok(())
/// # }
/// ```
pub struct ObjectStoreAdapter {
    client: Arc<dyn ObjectStoreClient>,
    prefix: String,
    visibility: AclVisibility,
    page_size: usize,
}

impl ObjectStoreAdapter {
    pub fn new(client: Arc<dyn ObjectStoreClient>) -> Self {
        Self {
            client,
            prefix: String::new(),
            visibility: AclVisibility::default(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Store every key below `prefix`.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix
            .split('/')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        self
    }

    pub fn with_visibility(mut self, visibility: AclVisibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Keys requested per listing page.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn file_key(&self, path: &StoragePath) -> String {
        match (self.prefix.is_empty(), path.is_root()) {
            (true, _) => path.as_str().to_string(),
            (false, true) => self.prefix.clone(),
            (false, false) => format!("{}/{}", self.prefix, path),
        }
    }

    /// Key prefix covering everything below `path`, ending in `/` unless it
    /// addresses the bucket root.
    fn dir_key(&self, path: &StoragePath) -> String {
        let key = self.file_key(path);
        if key.is_empty() { key } else { key + "/" }
    }

    /// Storage path for a key, `None` for keys outside the prefix.
    ///
    /// Keys not already in normalized form (`trash/../a.txt`, `a//b`) map to
    /// `None` so they never alias another path.
    fn path_for(&self, key: &str) -> Option<StoragePath> {
        let relative = if self.prefix.is_empty() {
            key
        } else {
            key.strip_prefix(&self.prefix)?.strip_prefix('/')?
        };
        match StoragePath::parse(relative) {
            Ok(path) if path.as_str() == relative => Some(path),
            _ => {
                tracing::warn!(key, "skipping object key that is not a normalized path");
                None
            }
        }
    }

    /// Key holding the metadata of an entry: the object itself for a file,
    /// the placeholder for an explicit directory.
    ///
    /// Implied directories have no object to carry metadata and are
    /// rejected.
    async fn metadata_key(&self, path: &StoragePath) -> AdapterResult<String> {
        let file_key = self.file_key(path);
        if self.client.head_object(&file_key).await?.is_some() {
            return Ok(file_key);
        }
        let placeholder = self.dir_key(path);
        if self.client.head_object(&placeholder).await?.is_some() {
            return Ok(placeholder);
        }
        if self.directory_exists(path).await? {
            return Err(AdapterError::rejected("implied directory has no stored metadata"));
        }
        Err(AdapterError::not_found(path.as_str()))
    }

    /// Refuse to put a file object where a directory lives.
    async fn reject_directory(&self, path: &StoragePath) -> AdapterResult<()> {
        if self.directory_exists(path).await? {
            return Err(AdapterError::rejected("is a directory"));
        }
        Ok(())
    }

    async fn head(&self, path: &StoragePath) -> AdapterResult<ObjectHead> {
        match self.client.head_object(&self.file_key(path)).await? {
            Some(head) => Ok(head),
            None => Err(AdapterError::not_found(path.as_str())),
        }
    }

    async fn require_file(&self, path: &StoragePath) -> AdapterResult<()> {
        if self.client.head_object(&self.file_key(path)).await?.is_some() {
            return Ok(());
        }
        if self.directory_exists(path).await? {
            return Err(AdapterError::rejected("is a directory"));
        }
        Err(AdapterError::not_found(path.as_str()))
    }

    fn map_client(err: ClientError, path: &StoragePath) -> AdapterError {
        if err.is_no_such_key() {
            AdapterError::not_found(path.as_str())
        } else {
            err.into()
        }
    }
}

/// Listing state carried between pages.
struct Pager {
    base: StoragePath,
    prefix: String,
    deep: bool,
    token: Option<String>,
    done: bool,
    buffered: VecDeque<AdapterResult<FileAttributes>>,
    seen_dirs: HashSet<StoragePath>,
}

impl Pager {
    fn push_dir(&mut self, path: StoragePath) {
        if path == self.base || !path.starts_with(&self.base) {
            return;
        }
        if self.seen_dirs.insert(path.clone()) {
            self.buffered.push_back(Ok(FileAttributes::directory(path)));
        }
    }

    fn absorb(&mut self, page: ListPage, adapter: &ObjectStoreAdapter) {
        for prefix in page.common_prefixes {
            if let Some(path) = adapter.path_for(prefix.trim_end_matches('/')) {
                self.push_dir(path);
            }
        }
        for object in page.objects {
            let is_placeholder = object.key.ends_with('/');
            let Some(path) = adapter.path_for(object.key.trim_end_matches('/')) else {
                continue;
            };
            if !path.starts_with(&self.base) {
                continue;
            }
            if self.deep {
                for ancestor in path.ancestors() {
                    self.push_dir(ancestor);
                }
            }
            if is_placeholder {
                self.push_dir(path);
            } else if path != self.base {
                let mut attrs = FileAttributes::file(path.clone(), object.size)
                    .with_last_modified(object.last_modified);
                if let Some(mime) = guess_mime_type(path.as_str()) {
                    attrs = attrs.with_mime_type(mime);
                }
                self.buffered.push_back(Ok(attrs));
            }
        }
    }
}

#[async_trait]
impl Adapter for ObjectStoreAdapter {
    async fn file_exists(&self, path: &StoragePath) -> AdapterResult<bool> {
        if path.is_root() {
            return Ok(false);
        }
        Ok(self.client.head_object(&self.file_key(path)).await?.is_some())
    }

    async fn directory_exists(&self, path: &StoragePath) -> AdapterResult<bool> {
        if path.is_root() {
            return Ok(true);
        }
        let page = self
            .client
            .list_objects(ListRequest {
                prefix: self.dir_key(path),
                delimiter: None,
                continuation: None,
                max_keys: 1,
            })
            .await?;
        Ok(!page.objects.is_empty() || !page.common_prefixes.is_empty())
    }

    async fn write(
        &self,
        path: &StoragePath,
        contents: &[u8],
        config: &WriteConfig,
    ) -> AdapterResult<()> {
        self.reject_directory(path).await?;
        let options = PutOptions {
            acl: Some(self.visibility.acl_for(config.visibility).to_string()),
            content_type: guess_mime_type(path.as_str()).map(String::from),
        };
        self.client
            .put_object(&self.file_key(path), contents.to_vec(), options)
            .await?;
        Ok(())
    }

    async fn read(&self, path: &StoragePath) -> AdapterResult<Vec<u8>> {
        self.client
            .get_object(&self.file_key(path))
            .await
            .map_err(|err| Self::map_client(err, path))
    }

    async fn delete(&self, path: &StoragePath) -> AdapterResult<()> {
        self.head(path).await?;
        self.client.delete_object(&self.file_key(path)).await?;
        Ok(())
    }

    async fn delete_directory(&self, path: &StoragePath) -> AdapterResult<()> {
        let placeholder = self.dir_key(path);
        if self.client.head_object(&placeholder).await?.is_none() {
            if self.directory_exists(path).await? {
                return Err(AdapterError::rejected("directory not empty"));
            }
            return Err(AdapterError::not_found(path.as_str()));
        }
        self.client.delete_object(&placeholder).await?;
        Ok(())
    }

    async fn create_directory(
        &self,
        path: &StoragePath,
        config: &WriteConfig,
    ) -> AdapterResult<()> {
        if self.file_exists(path).await? {
            return Err(AdapterError::rejected("file exists"));
        }
        let options = PutOptions {
            acl: Some(self.visibility.acl_for(config.visibility).to_string()),
            content_type: None,
        };
        self.client
            .put_object(&self.dir_key(path), Vec::new(), options)
            .await?;
        Ok(())
    }

    fn list_contents<'a>(&'a self, path: &StoragePath, deep: bool) -> ListingStream<'a> {
        let pager = Pager {
            base: path.clone(),
            prefix: self.dir_key(path),
            deep,
            token: None,
            done: false,
            buffered: VecDeque::new(),
            seen_dirs: HashSet::new(),
        };
        stream::unfold(pager, move |mut pager| async move {
            loop {
                if let Some(item) = pager.buffered.pop_front() {
                    return Some((item, pager));
                }
                if pager.done {
                    return None;
                }
                let request = ListRequest {
                    prefix: pager.prefix.clone(),
                    delimiter: if pager.deep { None } else { Some('/') },
                    continuation: pager.token.take(),
                    max_keys: self.page_size,
                };
                match self.client.list_objects(request).await {
                    Ok(page) => {
                        tracing::trace!(
                            prefix = %pager.prefix,
                            objects = page.objects.len(),
                            prefixes = page.common_prefixes.len(),
                            "listed object page"
                        );
                        pager.token = page.next_token.clone();
                        pager.done = pager.token.is_none();
                        pager.absorb(page, self);
                    }
                    Err(err) => {
                        pager.done = true;
                        return Some((Err(err.into()), pager));
                    }
                }
            }
        })
        .boxed()
    }

    async fn last_modified(&self, path: &StoragePath) -> AdapterResult<i64> {
        let key = self.metadata_key(path).await?;
        match self.client.head_object(&key).await? {
            Some(head) => Ok(head.last_modified),
            None => Err(AdapterError::not_found(path.as_str())),
        }
    }

    async fn file_size(&self, path: &StoragePath) -> AdapterResult<u64> {
        self.require_file(path).await?;
        Ok(self.head(path).await?.size)
    }

    async fn mime_type(&self, path: &StoragePath) -> AdapterResult<Option<String>> {
        self.require_file(path).await?;
        Ok(self.head(path).await?.content_type)
    }

    async fn visibility(&self, path: &StoragePath) -> AdapterResult<Visibility> {
        let key = self.metadata_key(path).await?;
        let acl = self
            .client
            .get_object_acl(&key)
            .await
            .map_err(|err| Self::map_client(err, path))?;
        Ok(self.visibility.visibility_for(&acl))
    }

    async fn set_visibility(
        &self,
        path: &StoragePath,
        visibility: Visibility,
    ) -> AdapterResult<()> {
        let key = self.metadata_key(path).await?;
        self.client
            .put_object_acl(&key, self.visibility.acl_for(visibility))
            .await
            .map_err(|err| Self::map_client(err, path))
    }

    async fn move_file(
        &self,
        source: &StoragePath,
        destination: &StoragePath,
        config: &WriteConfig,
    ) -> AdapterResult<()> {
        if source == destination {
            return self.require_file(source).await;
        }
        self.copy_file(source, destination, config).await?;
        self.client.delete_object(&self.file_key(source)).await?;
        Ok(())
    }

    async fn copy_file(
        &self,
        source: &StoragePath,
        destination: &StoragePath,
        _config: &WriteConfig,
    ) -> AdapterResult<()> {
        self.require_file(source).await?;
        self.reject_directory(destination).await?;
        // Copies do not carry ACLs over; re-apply the source's.
        let acl = self
            .client
            .get_object_acl(&self.file_key(source))
            .await
            .map_err(|err| Self::map_client(err, source))?;
        self.client
            .copy_object(
                &self.file_key(source),
                &self.file_key(destination),
                Some(acl),
            )
            .await
            .map_err(|err| Self::map_client(err, source))
    }

    async fn temporary_url(
        &self,
        path: &StoragePath,
        expires_in: Duration,
    ) -> AdapterResult<String> {
        self.require_file(path).await?;
        Ok(self
            .client
            .presign_get(&self.file_key(path), expires_in)
            .await?)
    }
}

#[derive(Debug, Clone)]
struct StoredObject {
    body: Vec<u8>,
    last_modified: i64,
    content_type: Option<String>,
    acl: String,
}

/// In-process [`ObjectStoreClient`].
///
/// Keys live in a sorted map so listings come back in key order, paged by
/// `max_keys` with the last returned key as continuation token.
pub struct MemoryObjectStore {
    bucket: String,
    objects: RwLock<BTreeMap<String, StoredObject>>,
}

impl MemoryObjectStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Raw keys currently stored, in order.
    pub async fn keys(&self) -> Vec<String> {
        self.objects.read().await.keys().cloned().collect()
    }
}

#[async_trait]
impl ObjectStoreClient for MemoryObjectStore {
    async fn head_object(&self, key: &str) -> Result<Option<ObjectHead>, ClientError> {
        let objects = self.objects.read().await;
        Ok(objects.get(key).map(|o| ObjectHead {
            size: o.body.len() as u64,
            last_modified: o.last_modified,
            content_type: o.content_type.clone(),
        }))
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>, ClientError> {
        let objects = self.objects.read().await;
        objects
            .get(key)
            .map(|o| o.body.clone())
            .ok_or_else(|| ClientError::NoSuchKey(key.to_string()))
    }

    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        options: PutOptions,
    ) -> Result<(), ClientError> {
        if key.is_empty() || key == "/" {
            return Err(ClientError::Service {
                code: "InvalidKey".into(),
                message: "object key must not be empty".into(),
            });
        }
        let mut objects = self.objects.write().await;
        objects.insert(
            key.to_string(),
            StoredObject {
                body,
                last_modified: now_epoch_seconds(),
                content_type: options.content_type,
                acl: options.acl.unwrap_or_else(|| "private".to_string()),
            },
        );
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> Result<(), ClientError> {
        self.objects.write().await.remove(key);
        Ok(())
    }

    async fn copy_object(
        &self,
        source: &str,
        destination: &str,
        acl: Option<String>,
    ) -> Result<(), ClientError> {
        let mut objects = self.objects.write().await;
        let mut object = objects
            .get(source)
            .cloned()
            .ok_or_else(|| ClientError::NoSuchKey(source.to_string()))?;
        object.last_modified = now_epoch_seconds();
        object.acl = acl.unwrap_or_else(|| "private".to_string());
        objects.insert(destination.to_string(), object);
        Ok(())
    }

    async fn list_objects(&self, request: ListRequest) -> Result<ListPage, ClientError> {
        let objects = self.objects.read().await;
        let max_keys = request.max_keys.max(1);
        let mut page = ListPage::default();
        let mut seen_prefixes = HashSet::new();
        let mut returned = 0;

        let range = objects
            .range(request.prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&request.prefix))
            .filter(|(key, _)| match &request.continuation {
                Some(token) => key.as_str() > token.as_str(),
                None => true,
            });

        for (key, object) in range {
            if returned == max_keys {
                page.next_token = Some(last_key(&page));
                break;
            }
            let rest = &key[request.prefix.len()..];
            if let Some(idx) = request.delimiter.and_then(|d| rest.find(d)) {
                let rolled = format!("{}{}", request.prefix, &rest[..=idx]);
                if seen_prefixes.insert(rolled.clone()) {
                    page.common_prefixes.push(rolled);
                    returned += 1;
                }
                continue;
            }
            page.objects.push(ObjectSummary {
                key: key.clone(),
                size: object.body.len() as u64,
                last_modified: object.last_modified,
            });
            returned += 1;
        }
        Ok(page)
    }

    async fn get_object_acl(&self, key: &str) -> Result<String, ClientError> {
        let objects = self.objects.read().await;
        objects
            .get(key)
            .map(|o| o.acl.clone())
            .ok_or_else(|| ClientError::NoSuchKey(key.to_string()))
    }

    async fn put_object_acl(&self, key: &str, acl: &str) -> Result<(), ClientError> {
        let mut objects = self.objects.write().await;
        match objects.get_mut(key) {
            Some(object) => {
                object.acl = acl.to_string();
                Ok(())
            }
            None => Err(ClientError::NoSuchKey(key.to_string())),
        }
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String, ClientError> {
        let expires = now_epoch_seconds() + expires_in.as_secs() as i64;
        Ok(format!(
            "memory://{}/{}?expires={}",
            self.bucket, key, expires
        ))
    }
}

fn last_key(page: &ListPage) -> String {
    let object = page.objects.last().map(|o| o.key.as_str());
    let prefix = page.common_prefixes.last().map(String::as_str);
    // Continuation must skip everything rolled into the last prefix.
    match (object, prefix) {
        (Some(o), Some(p)) if p > o => prefix_upper_bound(p),
        (Some(o), _) => o.to_string(),
        (None, Some(p)) => prefix_upper_bound(p),
        (None, None) => String::new(),
    }
}

/// Smallest string greater than every key starting with `prefix`.
fn prefix_upper_bound(prefix: &str) -> String {
    let mut bound = prefix.to_string();
    bound.push(char::MAX);
    bound
}
