/// The resolve, decode and normalize pipeline for a single asset
use exhibilo_core::format::extension_of;
use exhibilo_core::{
    external_buffer_uris, normalize, DecodedAsset, Decoders, ExternalBuffers, ModelFormat,
    Normalization,
};
use tracing::{debug, info, warn};
use url::Url;

use crate::asset::AssetReference;
use crate::error::LoadError;
use crate::resolver::{ResolvedSource, Resolver};
use crate::state::LoadPhase;

/// A decoded and normalized asset, ready to be shown
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedModel {
    pub name: String,
    pub asset: DecodedAsset,
    pub normalization: Normalization,
}

impl LoadedModel {
    pub fn extent(&self) -> f32 {
        self.normalization.extent
    }

    pub fn floor_height(&self) -> f32 {
        self.normalization.floor_height()
    }

    pub fn format(&self) -> ModelFormat {
        self.asset.format
    }
}

#[derive(Debug, Clone)]
pub struct AssetLoader {
    resolver: Resolver,
    decoders: Decoders,
}

impl AssetLoader {
    pub fn new(resolver: Resolver, decoders: Decoders) -> Self {
        Self { resolver, decoders }
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Run the whole pipeline, reporting each phase as it starts.
    ///
    /// Unsupported extensions fail before any request is made. A remote
    /// glTF also gets the buffers it references, fetched relative to its URL;
    /// uploads must embed theirs. A blob's object URL is released once
    /// decoding has settled, on success and failure alike.
    pub async fn load<F>(&self, reference: AssetReference, mut on_phase: F) -> Result<LoadedModel, LoadError>
    where
        F: FnMut(LoadPhase),
    {
        let name = reference.name().to_owned();
        let format = ModelFormat::from_name(&name);
        if !format.is_supported() {
            let extension = extension_of(&name);
            warn!(%name, %extension, "unsupported model format");
            return Err(LoadError::UnsupportedFormat { extension });
        }

        on_phase(LoadPhase::Resolving);
        let source = self.resolver.resolve(reference).await?;
        let data = self.resolver.fetch(&source).await?;
        debug!(locator = source.locator(), bytes = data.len(), "fetched asset");
        let external = match &source {
            ResolvedSource::Remote { url } if is_gltf(format) => {
                self.fetch_buffers(url, &data).await?
            }
            _ => ExternalBuffers::new(),
        };

        on_phase(LoadPhase::Decoding);
        let decoders = self.decoders.clone();
        let decoded = tokio::task::spawn_blocking(move || {
            decoders.decode_with_buffers(format, &data, &external)
        })
        .await;
        drop(source);

        let mut asset = match decoded {
            Ok(Ok(asset)) => asset,
            Ok(Err(err)) => {
                warn!(%name, error = %err, "decoding failed");
                return Err(err.into());
            }
            Err(join) => {
                warn!(%name, error = %join, "decoder task aborted");
                return Err(LoadError::DecodeFailed(join.to_string()));
            }
        };

        on_phase(LoadPhase::Normalizing);
        let normalization = normalize(&mut asset);
        info!(
            %name,
            %format,
            triangles = asset.triangle_count(),
            scale = normalization.scale,
            "model loaded"
        );

        Ok(LoadedModel {
            name,
            asset,
            normalization,
        })
    }

    async fn fetch_buffers(&self, url: &Url, data: &[u8]) -> Result<ExternalBuffers, LoadError> {
        // an unparsable document is reported by the decoder
        let Ok(uris) = external_buffer_uris(data) else {
            return Ok(ExternalBuffers::new());
        };
        let mut buffers = ExternalBuffers::new();
        for uri in uris {
            let bytes = self.resolver.fetch_related(url, &uri).await?;
            buffers.insert(uri, bytes.to_vec());
        }
        Ok(buffers)
    }
}

fn is_gltf(format: ModelFormat) -> bool {
    matches!(format, ModelFormat::GltfBinary | ModelFormat::GltfJson)
}
