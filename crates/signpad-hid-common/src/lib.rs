//! Common HID plumbing for signature-pad drivers
//!
//! This crate holds the pieces that sit between a concrete HID transport and
//! a vendor protocol: the transport port traits, device identity matching,
//! and bounds-checked report parsing/building. An in-memory mock transport
//! lives in [`transport::mock`] for driver tests.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod device_info;
pub mod report_parser;
pub mod transport;

pub use device_info::*;
pub use report_parser::*;
pub use transport::*;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HidCommonError {
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Failed to open device: {0}")]
    OpenError(String),

    #[error("Failed to write to device: {0}")]
    WriteError(String),

    #[error("Report too short: need {needed} bytes, have {available}")]
    ShortReport { needed: usize, available: usize },

    #[error("Invalid report format: {0}")]
    InvalidReport(String),

    #[error("Device disconnected")]
    Disconnected,
}

impl HidCommonError {
    /// Whether the error means the device handle is gone for good.
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            HidCommonError::Disconnected | HidCommonError::DeviceNotFound(_)
        )
    }
}

pub type HidCommonResult<T> = Result<T, HidCommonError>;
