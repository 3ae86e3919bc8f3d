use thiserror::Error;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),

    #[error("Tracing initialization failed: {0}")]
    TracingInit(String),
}

pub type Result<T> = std::result::Result<T, TelemetryError>;
