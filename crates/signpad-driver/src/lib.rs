//! Async driver for Wacom STU signature pads.
//!
//! [`SignaturePad`] ties the pieces together:
//!
//! - [`FeatureChannel`]: FIFO-serialized feature-report I/O with
//!   cancellation on disconnect.
//! - [`ConnectionManager`]: access, open, capability negotiation, teardown.
//! - [`DeviceConfigCache`]: capabilities snapshot and write-avoiding
//!   backlight/background setters.
//! - [`PenStreamDecoder`]: input-report decoding on a background task.
//! - [`ImageUploader`]: chunked framebuffer upload and resend.
//! - [`HotplugDispatcher`]: identity-filtered hotplug forwarding.
//!
//! The transport is injected as an [`signpad_hid_common::HidHost`], so the
//! driver runs unchanged against a real HID stack or the in-memory mock.

#![deny(static_mut_refs)]

pub mod cache;
pub mod channel;
pub mod config;
pub mod connection;
pub mod error;
pub mod hotplug;
pub mod pad;
pub mod pen;
pub mod subscribers;
pub mod task;
pub mod uploader;

pub use cache::{DeviceConfigCache, WriteOutcome};
pub use channel::{ChannelGuard, FeatureChannel};
pub use config::DriverConfig;
pub use connection::{ConnectionManager, ConnectionState};
pub use error::{DriverError, DriverResult};
pub use hotplug::HotplugDispatcher;
pub use pad::SignaturePad;
pub use pen::PenStreamDecoder;
pub use subscribers::{SubscriberList, SubscriptionId};
pub use task::BackgroundTask;
pub use uploader::{ImageUploader, UploadOutcome, UploadStage};

// Re-exported so applications need only this crate.
pub use signpad_hid_common::{
    DeviceFilter, HidDeviceInfo, HidHost, HotplugEvent, HotplugKind, InputReport,
};
pub use signpad_hid_stu_protocol::{
    Color, DeviceCapabilities, FirmwareVersion, PenSample, PenTiming, WritingArea, WritingMode,
    bgr_from_rgba,
};
