use enc_diagnostics::StrictModeViolation;
use thiserror::Error;

/// Fatal parse failures.
///
/// Everything recoverable travels through the warning collector instead;
/// a `ChartError` means no `ParsedData` is produced at all.
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("ISO 8211 read failed: {0}")]
    Read(
        #[from]
        #[source]
        enc_8211::ReadError,
    ),

    #[error(transparent)]
    Strict(#[from] StrictModeViolation),
}

/// Result type for chart parsing
pub type Result<T> = std::result::Result<T, ChartError>;
