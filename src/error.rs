//! Error types shared by every stage of the analysis engine.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A monitor row could not be turned into samples. The whole run aborts.
    #[error("malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    /// An aggregation had no contributing channels or samples.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// Analysis parameters rejected before any processing starts.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("analysis interrupted")]
    Interrupted,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl EngineError {
    pub fn malformed(line: usize, reason: impl Into<String>) -> Self {
        EngineError::MalformedRecord {
            line,
            reason: reason.into(),
        }
    }

    pub fn config(reason: impl Into<String>) -> Self {
        EngineError::Configuration(reason.into())
    }
}
