//! Raw input sources.
//!
//! The mapper reads flat values through [`ValueSource`]. Sources may defer
//! their work (parsing a request body, say) until the first lookup; the
//! mapper awaits every lookup before acting on it.

use crate::error::{SourceError, SourceResult};
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

/// Flat key → raw value lookup.
#[async_trait]
pub trait ValueSource: Send + Sync {
    /// Returns the raw value submitted under `key`, if any.
    async fn get(&self, key: &str) -> SourceResult<Option<String>>;
}

/// Metadata for one uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub field_name: String,
    pub file_name: String,
    pub content_type: String,
    pub size: u64,
}

/// Uploaded files keyed by form field name.
pub type FileMap = HashMap<String, UploadedFile>;

/// Access to the files of a request.
#[async_trait]
pub trait FileSource: Send + Sync {
    async fn get(&self) -> SourceResult<Arc<FileMap>>;
}

// ── In-memory sources ────────────────────────────────────────────

/// Values held in a map, available immediately.
#[derive(Debug, Clone, Default)]
pub struct MemoryValueSource {
    values: HashMap<String, String>,
}

impl MemoryValueSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<HashMap<String, String>> for MemoryValueSource {
    fn from(values: HashMap<String, String>) -> Self {
        Self { values }
    }
}

#[async_trait]
impl ValueSource for MemoryValueSource {
    async fn get(&self, key: &str) -> SourceResult<Option<String>> {
        Ok(self.values.get(key).cloned())
    }
}

/// Files held in a map, available immediately.
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSource {
    files: Arc<FileMap>,
}

impl MemoryFileSource {
    pub fn new(files: FileMap) -> Self {
        Self {
            files: Arc::new(files),
        }
    }
}

#[async_trait]
impl FileSource for MemoryFileSource {
    async fn get(&self) -> SourceResult<Arc<FileMap>> {
        Ok(Arc::clone(&self.files))
    }
}

// ── Lazily loaded sources ────────────────────────────────────────

type ValueLoader = Box<dyn FnOnce() -> BoxFuture<'static, SourceResult<HashMap<String, String>>> + Send>;
type FileLoader = Box<dyn FnOnce() -> BoxFuture<'static, SourceResult<FileMap>> + Send>;

/// Values produced by a loader that runs once, on first lookup.
///
/// A failed load is remembered and reported to every later lookup.
pub struct LazyValueSource {
    loader: std::sync::Mutex<Option<ValueLoader>>,
    loaded: OnceCell<Result<HashMap<String, String>, SourceError>>,
}

impl LazyValueSource {
    pub fn new<F, Fut>(loader: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = SourceResult<HashMap<String, String>>> + Send + 'static,
    {
        Self {
            loader: std::sync::Mutex::new(Some(Box::new(move || loader().boxed()))),
            loaded: OnceCell::new(),
        }
    }

    /// Whether the loader has completed.
    pub fn is_loaded(&self) -> bool {
        self.loaded.initialized()
    }

    async fn values(&self) -> SourceResult<&HashMap<String, String>> {
        let loaded = self
            .loaded
            .get_or_init(|| async {
                let loader = self
                    .loader
                    .lock()
                    .map_err(|_| SourceError::Load("loader lock poisoned".into()))
                    .and_then(|mut slot| {
                        slot.take()
                            .ok_or_else(|| SourceError::Load("loader already consumed".into()))
                    });
                match loader {
                    Ok(load) => {
                        debug!("loading lazy value source");
                        load().await
                    }
                    Err(e) => Err(e),
                }
            })
            .await;
        loaded.as_ref().map_err(Clone::clone)
    }
}

#[async_trait]
impl ValueSource for LazyValueSource {
    async fn get(&self, key: &str) -> SourceResult<Option<String>> {
        Ok(self.values().await?.get(key).cloned())
    }
}

/// Files produced by a loader that runs once, on first access.
pub struct LazyFileSource {
    loader: std::sync::Mutex<Option<FileLoader>>,
    loaded: OnceCell<Result<Arc<FileMap>, SourceError>>,
}

impl LazyFileSource {
    pub fn new<F, Fut>(loader: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = SourceResult<FileMap>> + Send + 'static,
    {
        Self {
            loader: std::sync::Mutex::new(Some(Box::new(move || loader().boxed()))),
            loaded: OnceCell::new(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.initialized()
    }
}

#[async_trait]
impl FileSource for LazyFileSource {
    async fn get(&self) -> SourceResult<Arc<FileMap>> {
        let loaded = self
            .loaded
            .get_or_init(|| async {
                let loader = self
                    .loader
                    .lock()
                    .map_err(|_| SourceError::Load("loader lock poisoned".into()))
                    .and_then(|mut slot| {
                        slot.take()
                            .ok_or_else(|| SourceError::Load("loader already consumed".into()))
                    });
                match loader {
                    Ok(load) => {
                        debug!("loading lazy file source");
                        load().await.map(Arc::new)
                    }
                    Err(e) => Err(e),
                }
            })
            .await;
        loaded.clone()
    }
}

// ── Urlencoded form bodies ───────────────────────────────────────

/// An `application/x-www-form-urlencoded` body, decoded on first lookup.
///
/// `+` decodes to a space. When a key repeats, the last value wins.
#[derive(Debug)]
pub struct FormBody {
    raw: Vec<u8>,
    decoded: OnceCell<Result<HashMap<String, String>, SourceError>>,
}

impl FormBody {
    pub fn new(raw: impl Into<Vec<u8>>) -> Self {
        Self {
            raw: raw.into(),
            decoded: OnceCell::new(),
        }
    }

    pub fn is_decoded(&self) -> bool {
        self.decoded.initialized()
    }

    async fn values(&self) -> SourceResult<&HashMap<String, String>> {
        let decoded = self
            .decoded
            .get_or_init(|| async { decode_form(&self.raw) })
            .await;
        decoded.as_ref().map_err(Clone::clone)
    }
}

#[async_trait]
impl ValueSource for FormBody {
    async fn get(&self, key: &str) -> SourceResult<Option<String>> {
        Ok(self.values().await?.get(key).cloned())
    }
}

/// Decodes an urlencoded body into flat pairs.
pub fn decode_form(raw: &[u8]) -> SourceResult<HashMap<String, String>> {
    let body = std::str::from_utf8(raw)
        .map_err(|e| SourceError::Decode(format!("body is not UTF-8: {e}")))?;
    let mut values = HashMap::new();
    for pair in body.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode_component(key)?;
        if key.is_empty() {
            continue;
        }
        values.insert(key, decode_component(value)?);
    }
    debug!(fields = values.len(), "decoded form body");
    Ok(values)
}

fn decode_component(component: &str) -> SourceResult<String> {
    let spaced = component.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| SourceError::Decode(format!("invalid percent-encoding in '{component}': {e}")))
}

// ── Request surface ──────────────────────────────────────────────

/// The inputs of one request: flat values plus uploaded files.
#[derive(Clone)]
pub struct RequestInput {
    pub values: Arc<dyn ValueSource>,
    pub files: Arc<dyn FileSource>,
}

impl RequestInput {
    pub fn new(values: Arc<dyn ValueSource>, files: Arc<dyn FileSource>) -> Self {
        Self { values, files }
    }

    /// Values only; the file map is empty.
    pub fn values_only(values: Arc<dyn ValueSource>) -> Self {
        Self {
            values,
            files: Arc::new(MemoryFileSource::default()),
        }
    }

    /// Looks up a single uploaded file.
    pub async fn file(&self, field: &str) -> SourceResult<Option<UploadedFile>> {
        Ok(self.files.get().await?.get(field).cloned())
    }
}

#[async_trait]
impl ValueSource for RequestInput {
    async fn get(&self, key: &str) -> SourceResult<Option<String>> {
        self.values.get(key).await
    }
}

#[async_trait]
impl<S: ValueSource + ?Sized> ValueSource for Arc<S> {
    async fn get(&self, key: &str) -> SourceResult<Option<String>> {
        (**self).get(key).await
    }
}

#[async_trait]
impl<'a, S: ValueSource + ?Sized> ValueSource for &'a S {
    async fn get(&self, key: &str) -> SourceResult<Option<String>> {
        (**self).get(key).await
    }
}
