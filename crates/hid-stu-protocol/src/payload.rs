//! Feature-report payload encoders.
//!
//! Payloads exclude the report id; the transport prepends it. All multi-byte
//! fields are little-endian.

use crate::types::{Color, WritingArea, WritingMode};

pub const WRITING_AREA_LEN: usize = 8;

pub fn writing_area(area: &WritingArea) -> [u8; WRITING_AREA_LEN] {
    let mut out = [0u8; WRITING_AREA_LEN];
    for (slot, value) in out
        .chunks_exact_mut(2)
        .zip([area.x1, area.y1, area.x2, area.y2])
    {
        slot.copy_from_slice(&value.to_le_bytes());
    }
    out
}

pub fn pen_color_and_width(color: Color, width: u8) -> [u8; 4] {
    [color.r, color.g, color.b, width]
}

/// Intensity followed by a zero pad byte.
pub fn brightness(intensity: u8) -> [u8; 2] {
    [intensity, 0]
}

pub fn background_color(color: Color) -> [u8; 3] {
    color.to_bytes()
}

pub fn ink_mode(enabled: bool) -> [u8; 1] {
    [u8::from(enabled)]
}

pub fn writing_mode(mode: WritingMode) -> [u8; 1] {
    [mode as u8]
}

pub fn clear_screen() -> [u8; 1] {
    [0]
}
