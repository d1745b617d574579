/// Viewer configuration file
use std::path::{Path, PathBuf};

use exhibilo_core::DecoderConfig;
use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_ORIGIN: &str = "http://localhost:5173/";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Origin that relative model references are resolved against
    pub origin: String,
    /// Directory holding the Draco decoding tool
    pub draco_decoder_path: Option<PathBuf>,
    /// Frames per second of the terminal view
    pub frame_rate: u32,
    /// Start with the light background
    pub light_background: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_owned(),
            draco_decoder_path: None,
            frame_rate: 30,
            light_background: false,
        }
    }
}

impl ViewerConfig {
    /// Read a TOML config file, or fall back to defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.origin).map_err(|source| ConfigError::Origin {
            origin: self.origin.clone(),
            source,
        })
    }

    pub fn decoder_config(&self) -> DecoderConfig {
        DecoderConfig {
            draco_decoder_path: self.draco_decoder_path.clone(),
        }
    }
}
