use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid engine config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config field `{field}` out of range: {reason}")]
    OutOfRange { field: &'static str, reason: String },
}
