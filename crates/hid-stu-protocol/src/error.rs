//! Protocol-level errors.

use signpad_hid_common::HidCommonError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// A response or input report is shorter than its layout requires.
    #[error("report 0x{report_id:02X} too short: expected at least {expected} bytes, got {actual}")]
    Truncated {
        report_id: u8,
        expected: usize,
        actual: usize,
    },

    /// The device reported capabilities the driver cannot work with.
    #[error("invalid capability: {0}")]
    InvalidCapability(&'static str),

    #[error("invalid color '{0}': expected #RRGGBB")]
    InvalidColor(String),

    #[error("image chunk of {len} bytes is outside 1..={max}")]
    InvalidChunk { len: usize, max: usize },

    #[error("chunk size {0} is outside 1..=253")]
    InvalidChunkSize(usize),

    #[error("image buffer is {actual} bytes, expected {expected} (width x height x 3)")]
    ImageSizeMismatch { expected: usize, actual: usize },

    #[error("report parse error: {0}")]
    Report(#[from] HidCommonError),
}

impl ProtocolError {
    /// Map a parser error from `report_id` into [`ProtocolError::Truncated`]
    /// when it is a length failure.
    pub fn from_report(report_id: u8, err: HidCommonError) -> Self {
        match err {
            HidCommonError::ShortReport { needed, available } => ProtocolError::Truncated {
                report_id,
                expected: needed,
                actual: available,
            },
            other => ProtocolError::Report(other),
        }
    }
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
