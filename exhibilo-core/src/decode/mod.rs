/// Format-specific decoders and the dispatcher in front of them
use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::error::DecodeError;
use crate::format::{extension_of, ModelFormat};
use crate::scene::DecodedAsset;

pub mod draco;
pub mod gltf;
pub mod obj;
pub mod stl;

#[cfg(test)]
pub(crate) mod fixtures;

pub use self::gltf::{external_buffer_uris, ExternalBuffers};
pub use draco::{DracoDecoder, MeshCodec};

/// Decoder settings, usually read from the viewer's config file
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Directory holding the Draco decoding tool (or the tool itself)
    pub draco_decoder_path: Option<PathBuf>,
}

/// Stateless dispatcher over the supported formats.
///
/// Cheap to clone; every call to [`Decoders::decode`] is independent.
#[derive(Debug, Clone, Default)]
pub struct Decoders {
    draco: Option<Arc<dyn MeshCodec>>,
}

impl Decoders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the decoders, wiring up Draco when a decoder path is configured
    pub fn from_config(config: &DecoderConfig) -> Result<Self, DecodeError> {
        let mut decoders = Self::new();
        if let Some(path) = &config.draco_decoder_path {
            let codec = DracoDecoder::from_decoder_path(path)?;
            debug!(tool = %codec.executable().display(), "Draco decoding enabled");
            decoders = decoders.with_codec(Arc::new(codec));
        }
        Ok(decoders)
    }

    pub fn with_codec(mut self, codec: Arc<dyn MeshCodec>) -> Self {
        self.draco = Some(codec);
        self
    }

    pub fn has_draco(&self) -> bool {
        self.draco.is_some()
    }

    pub fn decode(&self, format: ModelFormat, data: &[u8]) -> Result<DecodedAsset, DecodeError> {
        self.decode_with_buffers(format, data, &ExternalBuffers::new())
    }

    /// Decode, handing glTF files the buffers stored beside them. Other
    /// formats ignore `external`.
    ///
    /// Panics inside third-party parsers are not caught here; callers that
    /// need containment run this on a task whose panic they observe.
    pub fn decode_with_buffers(
        &self,
        format: ModelFormat,
        data: &[u8],
        external: &ExternalBuffers,
    ) -> Result<DecodedAsset, DecodeError> {
        match format {
            ModelFormat::GltfBinary | ModelFormat::GltfJson => {
                self::gltf::decode_with_buffers(data, format, self.draco.as_deref(), external)
            }
            ModelFormat::Obj => obj::decode(data),
            ModelFormat::Stl => stl::decode(data),
            ModelFormat::Unknown => Err(DecodeError::UnsupportedFormat {
                extension: String::new(),
            }),
        }
    }

    /// Dispatch on the extension of `name`
    pub fn decode_named(&self, name: &str, data: &[u8]) -> Result<DecodedAsset, DecodeError> {
        match ModelFormat::from_name(name) {
            ModelFormat::Unknown => Err(DecodeError::UnsupportedFormat {
                extension: extension_of(name),
            }),
            format => self.decode(format, data),
        }
    }
}
