/// Asset references, uploaded blobs and their temporary preview handles
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use exhibilo_core::ModelFormat;
use parking_lot::Mutex;
use percent_encoding::percent_decode_str;
use tracing::{debug, trace};
use url::Url;

/// Raw bytes supplied by the user, with the file name they came with
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedBlob {
    name: String,
    bytes: Bytes,
}

impl UploadedBlob {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a local file the way a file picker would hand it over
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }
}

impl fmt::Debug for UploadedBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedBlob")
            .field("name", &self.name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// What the user asked the viewer to show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetReference {
    Upload(UploadedBlob),
    /// Absolute URL, or a path relative to the page origin
    Remote(String),
}

impl AssetReference {
    /// Interpret a command line argument: an existing local file becomes an
    /// upload, anything else is treated as a URL.
    pub fn from_argument(arg: &str) -> std::io::Result<Self> {
        let is_url = Url::parse(arg)
            .map(|url| matches!(url.scheme(), "http" | "https"))
            .unwrap_or(false);
        if !is_url && Path::new(arg).is_file() {
            return UploadedBlob::from_path(Path::new(arg)).map(Self::Upload);
        }
        Ok(Self::Remote(arg.to_owned()))
    }

    /// File name for uploads, the reference string for remote assets
    pub fn name(&self) -> &str {
        match self {
            Self::Upload(blob) => blob.name(),
            Self::Remote(reference) => reference,
        }
    }

    pub fn format(&self) -> ModelFormat {
        ModelFormat::from_name(self.name())
    }
}

/// Gather the sources given on the command line, in the order they are
/// shown. Local files come first, then URLs, then the page's `?model=`
/// parameter, so an upload always wins over the link.
pub fn collect_sources(
    arguments: &[String],
    page_url: Option<&str>,
) -> std::io::Result<Vec<AssetReference>> {
    let references = arguments
        .iter()
        .map(|arg| AssetReference::from_argument(arg))
        .collect::<std::io::Result<Vec<_>>>()?;
    let (mut sources, remotes): (Vec<_>, Vec<_>) = references
        .into_iter()
        .partition(|reference| matches!(reference, AssetReference::Upload(_)));
    sources.extend(remotes);
    sources.extend(page_url.and_then(model_param).map(AssetReference::Remote));
    Ok(sources)
}

/// Extract the `model` query parameter from a page URL.
///
/// The value is decoded once by the query parser and once more on top, so
/// links that double-encode their target still work. When the second pass
/// does not yield valid UTF-8 the once-decoded value is kept.
pub fn model_param(page_url: &str) -> Option<String> {
    let url = Url::parse(page_url).ok()?;
    let (_, value) = url.query_pairs().find(|(key, _)| key == "model")?;
    if value.is_empty() {
        return None;
    }

    match percent_decode_str(&value).decode_utf8() {
        Ok(decoded) => Some(decoded.into_owned()),
        Err(_) => Some(value.into_owned()),
    }
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    live: HashMap<String, Bytes>,
    released: u64,
}

/// In-process stand-in for browser object URLs: uploads get a temporary
/// `blob:` handle that the decoder reads from.
#[derive(Default)]
pub struct ObjectUrls {
    inner: Mutex<Registry>,
}

impl ObjectUrls {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register `blob` and hand out a handle that is released when dropped
    pub fn create(self: &Arc<Self>, blob: &UploadedBlob) -> ObjectUrl {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let url = format!("blob:exhibilo/{}", inner.next_id);
        inner.live.insert(url.clone(), blob.bytes().clone());
        trace!(%url, name = blob.name(), "created object URL");

        ObjectUrl {
            url,
            registry: Arc::clone(self),
        }
    }

    pub fn read(&self, url: &str) -> Option<Bytes> {
        self.inner.lock().live.get(url).cloned()
    }

    /// Handles created and not yet released
    pub fn live_count(&self) -> usize {
        self.inner.lock().live.len()
    }

    /// Handles released so far
    pub fn released_count(&self) -> u64 {
        self.inner.lock().released
    }

    fn release(&self, url: &str) {
        let mut inner = self.inner.lock();
        if inner.live.remove(url).is_some() {
            inner.released += 1;
            debug!(%url, "released object URL");
        }
    }
}

impl fmt::Debug for ObjectUrls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("ObjectUrls")
            .field("live", &inner.live.len())
            .field("released", &inner.released)
            .finish()
    }
}

/// A temporary handle to an uploaded blob. Not cloneable; dropping it
/// releases the handle exactly once.
#[derive(Debug)]
pub struct ObjectUrl {
    url: String,
    registry: Arc<ObjectUrls>,
}

impl ObjectUrl {
    pub fn as_str(&self) -> &str {
        &self.url
    }

    pub fn read(&self) -> Option<Bytes> {
        self.registry.read(&self.url)
    }
}

impl Drop for ObjectUrl {
    fn drop(&mut self) {
        self.registry.release(&self.url);
    }
}
