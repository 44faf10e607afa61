use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("API error ({status}): {message}")]
    ApiError { status: u16, message: String },
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Not found: {0}")]
    NotFoundError(String),
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl CheckoutError {
    /// The message worth showing to the applicant.
    ///
    /// API errors surface the server's own `message` rather than the status prefix.
    pub fn user_message(&self) -> String {
        match self {
            CheckoutError::ApiError { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CheckoutError>;
