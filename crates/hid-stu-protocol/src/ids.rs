//! Wacom vendor ID, STU product IDs and report identifiers.
//!
//! # Sources
//!
//! - **USB ID database**: VID `0x056A` is registered to Wacom Co., Ltd.
//! - **STU-540 descriptor capture**: PID `0x00A8`.
//! - Report identifiers follow the STU SDK feature-report table. Only the
//!   reports this driver issues or consumes are listed; encryption and
//!   start/end-capture reports are not supported.

/// Wacom USB Vendor ID.
pub const WACOM_VENDOR_ID: u16 = 0x056A;

/// Known STU product IDs.
pub mod product_ids {
    /// STU-540 (800x480 colour LCD signature pad).
    pub const STU_540: u16 = 0x00A8;
}

/// Raw report identifiers.
///
/// Prefer [`crate::Command`] in driver code; these constants exist for
/// transport-level filtering and tests.
pub mod report_ids {
    pub const PEN_DATA: u8 = 0x01;
    pub const INFORMATION: u8 = 0x08;
    pub const CAPABILITY: u8 = 0x09;
    pub const WRITING_MODE: u8 = 0x0E;
    pub const E_SERIAL: u8 = 0x0F;
    pub const CLEAR_SCREEN: u8 = 0x20;
    pub const INK_MODE: u8 = 0x21;
    pub const WRITE_IMAGE_START: u8 = 0x25;
    pub const WRITE_IMAGE_DATA: u8 = 0x26;
    pub const WRITE_IMAGE_END: u8 = 0x27;
    pub const WRITING_AREA: u8 = 0x2A;
    pub const BRIGHTNESS: u8 = 0x2B;
    pub const PEN_COLOR_AND_WIDTH: u8 = 0x2D;
    pub const BACKGROUND_COLOR: u8 = 0x2E;
    pub const PEN_DATA_TIMING: u8 = 0x34;
}
