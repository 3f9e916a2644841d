use thiserror::Error;

/// Every failure the library can surface.
#[derive(Debug, Error)]
pub enum CopilotError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{endpoint} failed with status {status}: {body}")]
    Api {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("game rejected {endpoint}: {message}")]
    Game { endpoint: String, message: String },

    #[error("session expired or cookie rejected")]
    SessionExpired,

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to write TOML: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    #[error("secret storage error: {0}")]
    Secret(String),

    #[error("session error: {0}")]
    Session(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("backup error: {0}")]
    Backup(String),

    #[error("zip archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("API broker is not running")]
    Broker,
}

pub type Result<T> = std::result::Result<T, CopilotError>;

impl CopilotError {
    /// Failures that another attempt cannot fix.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            CopilotError::SessionExpired
                | CopilotError::InvalidInput(_)
                | CopilotError::Config(_)
                | CopilotError::NotFound(_)
                | CopilotError::Backup(_)
        )
    }
}
