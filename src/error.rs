use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Invalid configuration for {field}: {details}")]
    InvalidConfig { field: String, details: String },

    #[error("Date calculation error: {0}")]
    DateError(String),

    #[error("Non-finite {field} on account '{card_name}': {value}")]
    NonFiniteAmount {
        card_name: String,
        field: &'static str,
        value: f64,
    },

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
