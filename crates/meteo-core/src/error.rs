use thiserror::Error;

#[derive(Debug, Error)]
pub enum MeteoError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing data_source.source_url in configuration")]
    MissingSourceUrl,

    #[error("Store bootstrap failed: {0}")]
    Bootstrap(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MeteoError {
    /// Process exit code for a fatal startup failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            MeteoError::MissingSourceUrl => 1,
            MeteoError::Config(_) => 2,
            MeteoError::Bootstrap(_) | MeteoError::HttpClient(_) | MeteoError::Io(_) => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, MeteoError>;
