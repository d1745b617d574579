/// Site configuration file
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use axum::http::HeaderValue;
use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_ALLOWED_ORIGINS: [&str; 3] = [
    "https://exhibilo.com.ar",
    "https://www.exhibilo.com.ar",
    "http://localhost:5173",
];

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Address the contact relay listens on
    pub bind: SocketAddr,
    /// Origins allowed to post to the relay from a browser
    pub allowed_origins: Vec<String>,
    pub mail: MailSettings,
    /// Base URL of the content backend
    pub backend_url: Option<String>,
    /// Content is only fetched from the backend when this is set
    pub use_backend: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            allowed_origins: DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect(),
            mail: MailSettings::default(),
            backend_url: None,
            use_backend: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MailSettings {
    pub to: String,
    pub from: String,
    pub from_name: String,
    pub subject: String,
    /// sendmail-compatible program the relay pipes messages to
    pub sendmail: PathBuf,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            to: "ventas@exhibilo.com.ar".to_owned(),
            from: "no-reply@exhibilo.com.ar".to_owned(),
            from_name: "Exhibilo".to_owned(),
            subject: "Nueva consulta desde la web".to_owned(),
            sendmail: PathBuf::from("/usr/sbin/sendmail"),
        }
    }
}

impl SiteConfig {
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

    /// Allowed origins as header values, rejecting anything that cannot be one.
    /// The relay only echoes listed origins, so a `*` wildcard is refused too.
    pub fn origin_headers(&self) -> Result<Vec<HeaderValue>, ConfigError> {
        self.allowed_origins
            .iter()
            .map(|origin| {
                if origin.trim() == "*" {
                    return Err(ConfigError::Origin(origin.clone()));
                }
                HeaderValue::from_str(origin).map_err(|_| ConfigError::Origin(origin.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SiteConfig::from_toml("").unwrap();
        assert_eq!(config, SiteConfig::default());
        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.allowed_origins.len(), 3);
        assert_eq!(config.mail.to, "ventas@exhibilo.com.ar");
        assert!(!config.use_backend);
    }

    #[test]
    fn test_nested_mail_settings() {
        let config = SiteConfig::from_toml(
            r#"
            bind = "0.0.0.0:9000"
            allowed_origins = ["https://preview.exhibilo.com.ar"]
            backend_url = "https://api.exhibilo.com.ar/"
            use_backend = true

            [mail]
            to = "hola@exhibilo.com.ar"
            "#,
        )
        .unwrap();

        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.origin_headers().unwrap().len(), 1);
        assert_eq!(config.mail.to, "hola@exhibilo.com.ar");
        assert_eq!(config.mail.from, "no-reply@exhibilo.com.ar");
        assert_eq!(config.backend_url.as_deref(), Some("https://api.exhibilo.com.ar/"));
    }

    #[test]
    fn test_bad_origin_is_reported() {
        let config = SiteConfig {
            allowed_origins: vec!["https://ok.example".into(), "bad\norigin".into()],
            ..SiteConfig::default()
        };
        assert!(matches!(config.origin_headers(), Err(ConfigError::Origin(_))));
    }

    #[test]
    fn test_wildcard_origin_is_rejected() {
        let config = SiteConfig::from_toml(r#"allowed_origins = ["*"]"#).unwrap();
        match config.origin_headers() {
            Err(ConfigError::Origin(origin)) => assert_eq!(origin, "*"),
            other => panic!("expected wildcard rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.toml");
        std::fs::write(&path, "use_backend = true\n").unwrap();
        assert!(SiteConfig::load(Some(&path)).unwrap().use_backend);
        assert!(SiteConfig::load(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
