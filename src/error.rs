use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    ConfigValidation(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("event error: {0}")]
    Event(String),

    #[error("issue tracker error: {0}")]
    Tracker(String),

    #[error("template error: {0}")]
    Template(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Format `message` as a single-line `::error::` workflow command.
pub fn error_command(message: &str) -> String {
    let escaped = message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A");
    format!("::error::{escaped}")
}
