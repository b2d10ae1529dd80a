use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum CoreError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("invalid state: {0}")]
    State(String),
    #[error("io error: {0}")]
    Io(String),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
