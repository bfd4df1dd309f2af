use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Failed to fetch data: {0}")]
    FetchError(String),

    #[error("Unexpected HTTP status: {0}")]
    HttpStatus(StatusCode),

    #[error("Error parsing content: {0}")]
    ParseError(String),

    #[error("No article content could be extracted")]
    NoContent,

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AppError {
    /// Short label used as the `kind` field of failure log events.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::FetchError(_) => "fetch",
            AppError::HttpStatus(_) => "status",
            AppError::ParseError(_) => "parse",
            AppError::NoContent => "empty",
            AppError::ConfigError(_) => "config",
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::FetchError(err.to_string())
    }
}

impl From<std::env::VarError> for AppError {
    fn from(err: std::env::VarError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
