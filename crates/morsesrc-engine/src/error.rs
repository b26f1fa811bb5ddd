use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("unknown sample format: {0}")]
    UnknownFormat(String),
    #[error("sample rate must be non-zero")]
    ZeroRate,
    #[error("channel count must be non-zero")]
    ZeroChannels,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("output format has not been negotiated")]
    NotNegotiated,
    #[error(transparent)]
    Format(#[from] FormatError),
}
