use thiserror::Error;

/// Failure kinds the pipeline distinguishes.
///
/// Workers catch these at top level and abort the current run; the previous
/// KV value keeps serving until it expires or is overwritten.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("missing configuration: {0}")]
    Config(String),

    #[error("upstream transport: {0}")]
    Transport(String),

    #[error("feed decode: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("schedule build: {0}")]
    Build(String),

    #[error("schedule validation: {} violation(s): {}", .0.len(), .0.join("; "))]
    Validation(Vec<String>),

    #[error("store: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

impl From<reqwest::Error> for PipelineError {
    fn from(err: reqwest::Error) -> Self {
        PipelineError::Transport(err.to_string())
    }
}

impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        PipelineError::Build(err.to_string())
    }
}

impl From<zip::result::ZipError> for PipelineError {
    fn from(err: zip::result::ZipError) -> Self {
        PipelineError::Build(err.to_string())
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Build(err.to_string())
    }
}

impl From<redis::RedisError> for PipelineError {
    fn from(err: redis::RedisError) -> Self {
        PipelineError::Store(err.to_string())
    }
}
