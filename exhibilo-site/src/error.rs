use std::process::ExitStatus;

#[derive(thiserror::Error, Debug)]
pub enum MailError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to hand the message over: {0}")]
    Io(#[from] std::io::Error),

    #[error("mail program exited with {status}: {stderr}")]
    Exit { status: ExitStatus, stderr: String },

    #[error("mail transport rejected the message: {0}")]
    Rejected(String),
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

    #[error("invalid allowed origin {0:?}")]
    Origin(String),
}
