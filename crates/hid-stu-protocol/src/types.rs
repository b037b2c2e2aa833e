//! Value types carried by STU commands.

use crate::error::{ProtocolError, ProtocolResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 24-bit RGB color as sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(0xFF, 0xFF, 0xFF);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn to_bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Parse `#RRGGBB` or `RRGGBB`.
    pub fn from_hex(hex: &str) -> ProtocolResult<Self> {
        let digits = hex.trim();
        let digits = digits.strip_prefix('#').unwrap_or(digits);
        let invalid = || ProtocolError::InvalidColor(hex.to_string());

        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |range: std::ops::Range<usize>| {
            digits
                .get(range)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(invalid)
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl FromStr for Color {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Rectangle, in tablet units, that accepts ink.
///
/// The protocol layer never clamps; use [`WritingArea::fits_within`] before
/// sending when capabilities are known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct WritingArea {
    pub x1: u16,
    pub y1: u16,
    pub x2: u16,
    pub y2: u16,
}

impl WritingArea {
    pub const fn new(x1: u16, y1: u16, x2: u16, y2: u16) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn fits_within(&self, tablet_width: u16, tablet_height: u16) -> bool {
        self.x1 <= self.x2
            && self.y1 <= self.y2
            && self.x2 <= tablet_width
            && self.y2 <= tablet_height
    }
}

/// Pen report layout selected on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum WritingMode {
    /// `penData` reports: position and pressure only.
    #[default]
    Basic = 0,
    /// `penDataTiming` reports: adds timestamp and sequence number.
    Timing = 1,
}

/// Firmware version as four numeric components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FirmwareVersion(pub [u8; 4]);

impl std::fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "{a}.{b}.{c}.{d}")
    }
}
