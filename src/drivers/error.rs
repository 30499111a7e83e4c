use thiserror::Error;
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DimensionError {
    #[error("'{0}' is not a whole number")]
    NotANumber(String),
    #[error("{value} is outside {min}..={max}")]
    OutOfRange { value: i64, min: u16, max: u16 },
}
#[derive(Debug, Error)]
pub enum GridViewerError {
    #[error("sample rate must be greater than zero")]
    InvalidSampleRate,
    #[error("update interval must be at least one sample")]
    InvalidUpdateInterval,
    #[error("channel count mismatch: expected {expected}, got {actual}")]
    ChannelMismatch { expected: usize, actual: usize },
    #[error("invalid grid dimension: {0}")]
    InvalidDimension(#[from] DimensionError),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("acquisition engine is no longer running")]
    EngineDisconnected,
}
impl From<serde_json::Error> for GridViewerError {
    fn from(value: serde_json::Error) -> Self {
        GridViewerError::InvalidConfig(value.to_string())
    }
}
