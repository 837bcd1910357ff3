use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Config: {0}")]
    Config(String),

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("Unknown application status: {0}")]
    InvalidStatus(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),
}
