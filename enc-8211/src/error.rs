use enc_diagnostics::StrictModeViolation;
use thiserror::Error;

/// Specific kinds of fatal reader errors
#[derive(Debug, Error)]
pub enum ReadErrorKind {
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(
        #[from]
        #[source]
        std::str::Utf8Error,
    ),

    #[error("invalid record leader: {0}")]
    InvalidLeader(String),

    #[error("invalid base address: {0}")]
    InvalidBaseAddress(String),

    #[error("invalid directory entry: {0}")]
    InvalidDirectory(String),

    #[error("record length {record_length} exceeds available data {available}")]
    RecordTooLarge {
        record_length: usize,
        available: usize,
    },

    #[error("unexpected end of buffer")]
    UnexpectedEof,

    #[error(transparent)]
    Strict(#[from] StrictModeViolation),
}

/// Fatal reader error with byte offset context
#[derive(Debug, Error)]
#[error("{kind} at byte offset {offset}")]
pub struct ReadError {
    pub kind: ReadErrorKind,
    pub offset: usize,
}

impl ReadError {
    /// Create a new reader error with the given kind and byte offset
    pub fn at(kind: ReadErrorKind, offset: usize) -> Self {
        Self { kind, offset }
    }
}

impl From<StrictModeViolation> for ReadError {
    fn from(violation: StrictModeViolation) -> Self {
        ReadError::at(ReadErrorKind::Strict(violation), 0)
    }
}

/// Result type for ISO 8211 reading
pub type Result<T> = std::result::Result<T, ReadError>;
