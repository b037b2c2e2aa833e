//! Wacom STU signature-pad HID protocol: report ids, payload encoders,
//! response parsers, pen decoding and image chunking.
//!
//! This crate is I/O-free. It provides pure functions and types that can be
//! tested and benchmarked without hardware; the stateful driver lives in
//! `signpad-driver`.

#![deny(static_mut_refs)]

pub mod command;
pub mod error;
pub mod ids;
pub mod image;
pub mod payload;
pub mod pen;
pub mod report;
pub mod types;

// Flat re-exports so callers can use `signpad_hid_stu_protocol::Foo`.
pub use command::Command;
pub use error::{ProtocolError, ProtocolResult};
pub use ids::{WACOM_VENDOR_ID, product_ids, report_ids};
pub use image::{
    BYTES_PER_PIXEL, ChunkedImage, DEFAULT_CHUNK_SIZE, IMAGE_FORMAT_24BPP_BGR, ImageFormat,
    ImageGeometry, MAX_CHUNK_SIZE, bgr_from_rgba, split_to_chunks, validate_chunk_size,
};
pub use pen::{
    DEFAULT_PRESSURE_FACTOR, DEFAULT_SCALE_FACTOR, PenReportKind, PenSample, PenScaling,
    PenTiming, decode_input_report, decode_pen_report,
};
pub use report::{
    CapabilityReport, DeviceCapabilities, InformationReport, parse_background_color_report,
    parse_brightness_report, parse_capability_report, parse_information_report,
    parse_serial_report,
};
pub use types::{Color, FirmwareVersion, WritingArea, WritingMode};
