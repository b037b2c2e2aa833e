//! Driver error taxonomy.

use crate::uploader::UploadStage;
use signpad_hid_common::HidCommonError;
use signpad_hid_stu_protocol::ProtocolError;

/// Errors surfaced by [`crate::SignaturePad`] and its components.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DriverError {
    /// No device handle is attached, or it was closed mid-operation.
    #[error("signature pad is not connected")]
    NotConnected,

    /// The host returned no device from the access request.
    #[error("no matching signature pad was selected")]
    NoDeviceSelected,

    #[error("failed to open signature pad: {0}")]
    OpenFailed(String),

    /// One of the negotiation reads failed; `source` holds the cause.
    #[error("capability negotiation failed: {source}")]
    CapabilityReadFailed { source: Box<DriverError> },

    #[error("no response to feature report 0x{report_id:02X}")]
    NoResponse { report_id: u8 },

    #[error(
        "malformed response to report 0x{report_id:02X}: expected at least {expected} bytes, got {actual}"
    )]
    MalformedResponse {
        report_id: u8,
        expected: usize,
        actual: usize,
    },

    #[error("failed to write feature report 0x{report_id:02X}: {reason}")]
    TransportWriteFailed { report_id: u8, reason: String },

    /// An image upload stopped part-way; no further reports were sent.
    #[error("image transfer aborted at {stage}: {source}")]
    TransferAborted {
        stage: UploadStage,
        source: Box<DriverError>,
    },

    #[error("image buffer is {actual} bytes, expected {expected}")]
    ImageSizeMismatch { expected: usize, actual: usize },

    #[error("invalid driver configuration: {0}")]
    InvalidConfig(String),

    #[error("protocol error: {0}")]
    Protocol(ProtocolError),

    #[error("transport error: {0}")]
    Transport(#[from] HidCommonError),
}

impl DriverError {
    /// The device is gone or was never reachable; reconnecting is required.
    pub fn is_connection_failure(&self) -> bool {
        match self {
            DriverError::NotConnected
            | DriverError::NoDeviceSelected
            | DriverError::OpenFailed(_) => true,
            DriverError::Transport(e) => e.is_disconnect(),
            DriverError::CapabilityReadFailed { source } => source.is_connection_failure(),
            _ => false,
        }
    }

    /// The same operation may succeed if issued again on a live connection.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DriverError::NoResponse { .. }
                | DriverError::TransportWriteFailed { .. }
                | DriverError::TransferAborted { .. }
        )
    }

    pub(crate) fn capability_read(source: DriverError) -> Self {
        DriverError::CapabilityReadFailed {
            source: Box::new(source),
        }
    }

    pub(crate) fn transfer_aborted(stage: UploadStage, source: DriverError) -> Self {
        DriverError::TransferAborted {
            stage,
            source: Box::new(source),
        }
    }
}

impl From<ProtocolError> for DriverError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::Truncated {
                report_id,
                expected,
                actual,
            } => DriverError::MalformedResponse {
                report_id,
                expected,
                actual,
            },
            ProtocolError::ImageSizeMismatch { expected, actual } => {
                DriverError::ImageSizeMismatch { expected, actual }
            }
            ProtocolError::InvalidChunkSize(size) => {
                DriverError::InvalidConfig(format!("chunk size {size} is outside 1..=253"))
            }
            other => DriverError::Protocol(other),
        }
    }
}

pub type DriverResult<T> = Result<T, DriverError>;
