/// Turns asset references into fetchable sources
use std::sync::Arc;

use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use tracing::{debug, warn};
use url::Url;

use crate::asset::{AssetReference, ObjectUrl, ObjectUrls};
use crate::error::LoadError;

/// A reference that passed resolution
#[derive(Debug)]
pub enum ResolvedSource {
    /// Upload served from a temporary object URL. Dropping it releases the URL.
    Blob { name: String, object_url: ObjectUrl },
    /// Remote asset that answered the existence check
    Remote { url: Url },
}

impl ResolvedSource {
    pub fn locator(&self) -> &str {
        match self {
            Self::Blob { object_url, .. } => object_url.as_str(),
            Self::Remote { url } => url.as_str(),
        }
    }
}

/// Resolves references against a page origin and checks remote assets with
/// a HEAD request before anything is downloaded.
#[derive(Debug, Clone)]
pub struct Resolver {
    client: Client,
    origin: Url,
    object_urls: Arc<ObjectUrls>,
}

impl Resolver {
    pub fn new(origin: Url) -> Self {
        Self::with_client(Client::new(), origin)
    }

    pub fn with_client(client: Client, origin: Url) -> Self {
        Self {
            client,
            origin,
            object_urls: ObjectUrls::new(),
        }
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn object_urls(&self) -> &Arc<ObjectUrls> {
        &self.object_urls
    }

    /// Join `reference` onto the origin. Absolute URLs pass through.
    pub fn absolutize(&self, reference: &str) -> Result<Url, LoadError> {
        self.origin
            .join(reference)
            .map_err(|err| LoadError::FetchFailed {
                url: reference.to_owned(),
                reason: err.to_string(),
            })
    }

    pub async fn resolve(&self, reference: AssetReference) -> Result<ResolvedSource, LoadError> {
        match reference {
            AssetReference::Upload(blob) => {
                let object_url = self.object_urls.create(&blob);
                debug!(name = blob.name(), url = object_url.as_str(), "resolved upload");
                Ok(ResolvedSource::Blob {
                    name: blob.name().to_owned(),
                    object_url,
                })
            }
            AssetReference::Remote(reference) => {
                let url = self.absolutize(&reference)?;
                self.check_exists(&url).await?;
                debug!(%url, "resolved remote asset");
                Ok(ResolvedSource::Remote { url })
            }
        }
    }

    /// HEAD request: the asset must exist and must not be an HTML page
    pub async fn check_exists(&self, url: &Url) -> Result<(), LoadError> {
        let response = self
            .client
            .head(url.clone())
            .send()
            .await
            .map_err(|err| fetch_failed(url, err))?;
        check_status(url, &response)?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if content_type.contains("text/html") {
            warn!(%url, %content_type, "asset URL serves HTML");
            return Err(LoadError::InvalidContentType {
                url: url.to_string(),
                content_type,
            });
        }
        Ok(())
    }

    /// Read the full payload of a resolved source
    pub async fn fetch(&self, source: &ResolvedSource) -> Result<Bytes, LoadError> {
        match source {
            ResolvedSource::Blob { object_url, .. } => {
                object_url.read().ok_or_else(|| LoadError::FetchFailed {
                    url: object_url.as_str().to_owned(),
                    reason: "object URL was released".to_owned(),
                })
            }
            ResolvedSource::Remote { url } => self.get(url).await,
        }
    }

    /// GET a file referenced from a remote asset, relative to that asset's URL
    pub async fn fetch_related(&self, base: &Url, reference: &str) -> Result<Bytes, LoadError> {
        let url = base.join(reference).map_err(|err| LoadError::FetchFailed {
            url: reference.to_owned(),
            reason: err.to_string(),
        })?;
        debug!(%url, "fetching related file");
        self.get(&url).await
    }

    async fn get(&self, url: &Url) -> Result<Bytes, LoadError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|err| fetch_failed(url, err))?;
        check_status(url, &response)?;
        response.bytes().await.map_err(|err| fetch_failed(url, err))
    }
}

fn check_status(url: &Url, response: &Response) -> Result<(), LoadError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    Err(LoadError::NotFound {
        status: status.as_u16(),
        url: url.to_string(),
    })
}

fn fetch_failed(url: &Url, err: reqwest::Error) -> LoadError {
    LoadError::FetchFailed {
        url: url.to_string(),
        reason: err.to_string(),
    }
}
