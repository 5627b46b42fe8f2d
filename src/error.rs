use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubextractError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Root folder not accessible: {0}")]
    RootNotFound(String),

    #[error("Media processing error: {0}")]
    Media(String),

    #[error("Subtitle sync error: {0}")]
    Sync(String),

    #[error("Worker error: {0}")]
    Worker(String),
}

pub type Result<T> = std::result::Result<T, SubextractError>;
