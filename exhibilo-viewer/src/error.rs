use exhibilo_core::DecodeError;

/// Terminal outcome of a failed load attempt.
///
/// Never retried: the user has to pick another source. Cloneable so it can
/// live in the viewer state and be shown as-is.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("model not found ({status}) at {url}")]
    NotFound { status: u16, url: String },

    #[error("the URL returns {content_type}, not a model: {url}")]
    InvalidContentType { url: String, content_type: String },

    #[error("unsupported format {extension:?}, use .glb, .gltf, .obj or .stl")]
    UnsupportedFormat { extension: String },

    #[error("could not fetch {url}: {reason}")]
    FetchFailed { url: String, reason: String },

    #[error("could not load the model: {0}")]
    DecodeFailed(String),
}

impl From<DecodeError> for LoadError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::UnsupportedFormat { extension } => Self::UnsupportedFormat { extension },
            other => Self::DecodeFailed(other.to_string()),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid origin {origin:?}: {source}")]
    Origin {
        origin: String,
        #[source]
        source: url::ParseError,
    },
}
