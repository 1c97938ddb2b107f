// Error handling for the raw-recording transform pipeline

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: invalid hex calibration offset `{token}`")]
    HeaderParse { line: usize, token: String },

    #[error("no `# A/D Zero Cal Data` line found; cannot calibrate this recording")]
    MissingCalibration,

    #[error("expected {expected} calibration offsets, found {found}")]
    OffsetCount { expected: usize, found: usize },

    #[error("line {line}: invalid 16-bit hex sample `{token}`")]
    SampleParse { line: usize, token: String },
}
