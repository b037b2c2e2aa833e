//! Feature-report response parsing and capability negotiation.
//!
//! Responses carry the report id at byte 0, so every field offset below is
//! relative to the full buffer. Each parser checks the buffer length against
//! the furthest byte it reads before extracting anything.

use crate::command::Command;
use crate::error::{ProtocolError, ProtocolResult};
use crate::pen::PenScaling;
use crate::types::{Color, FirmwareVersion};
use serde::{Deserialize, Serialize};
use signpad_hid_common::ReportParser;

/// Layout constants for the `capability` response.
pub mod capability_report {
    pub const TABLET_WIDTH: usize = 1;
    pub const TABLET_HEIGHT: usize = 3;
    pub const PRESSURE_FACTOR: usize = 5;
    pub const SCREEN_WIDTH: usize = 7;
    pub const SCREEN_HEIGHT: usize = 9;
    pub const REFRESH_RATE: usize = 11;
    pub const MIN_LEN: usize = 12;
}

/// Layout constants for the `information` response.
pub mod information_report {
    pub const DEVICE_NAME: usize = 1;
    pub const DEVICE_NAME_LEN: usize = 7;
    pub const FIRMWARE: usize = 8;
    pub const MIN_LEN: usize = 12;
}

pub const E_SERIAL_OFFSET: usize = 1;
pub const BRIGHTNESS_MIN_LEN: usize = 2;
pub const BACKGROUND_COLOR_MIN_LEN: usize = 4;

/// Raw fields of the `capability` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityReport {
    pub tablet_width: u16,
    pub tablet_height: u16,
    pub pressure_factor: u16,
    pub screen_width: u16,
    pub screen_height: u16,
    pub refresh_rate: u8,
}

/// Fields of the `information` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InformationReport {
    pub device_name: String,
    pub firmware: FirmwareVersion,
}

fn parser_for(command: Command, data: &[u8], min_len: usize) -> ProtocolResult<ReportParser<'_>> {
    let parser = ReportParser::new(data);
    parser
        .require(min_len)
        .map_err(|e| ProtocolError::from_report(command.report_id(), e))?;
    Ok(parser)
}

pub fn parse_capability_report(data: &[u8]) -> ProtocolResult<CapabilityReport> {
    use capability_report::*;
    let id = Command::Capability.report_id();
    let p = parser_for(Command::Capability, data, MIN_LEN)?;
    let field = |offset| p.u16_le_at(offset).map_err(|e| ProtocolError::from_report(id, e));

    Ok(CapabilityReport {
        tablet_width: field(TABLET_WIDTH)?,
        tablet_height: field(TABLET_HEIGHT)?,
        pressure_factor: field(PRESSURE_FACTOR)?,
        screen_width: field(SCREEN_WIDTH)?,
        screen_height: field(SCREEN_HEIGHT)?,
        refresh_rate: p
            .u8_at(REFRESH_RATE)
            .map_err(|e| ProtocolError::from_report(id, e))?,
    })
}

pub fn parse_information_report(data: &[u8]) -> ProtocolResult<InformationReport> {
    use information_report::*;
    let id = Command::Information.report_id();
    let p = parser_for(Command::Information, data, MIN_LEN)?;

    let device_name = p
        .ascii_at(DEVICE_NAME, Some(DEVICE_NAME_LEN))
        .map_err(|e| ProtocolError::from_report(id, e))?;
    let firmware = match p
        .bytes_at(FIRMWARE, 4)
        .map_err(|e| ProtocolError::from_report(id, e))?
    {
        [a, b, c, d] => FirmwareVersion([*a, *b, *c, *d]),
        _ => {
            return Err(ProtocolError::Truncated {
                report_id: id,
                expected: MIN_LEN,
                actual: data.len(),
            });
        }
    };

    Ok(InformationReport {
        device_name,
        firmware,
    })
}

/// Serial number: ASCII from byte 1 up to a NUL or the end of the report.
pub fn parse_serial_report(data: &[u8]) -> ProtocolResult<String> {
    let p = parser_for(Command::ESerial, data, E_SERIAL_OFFSET)?;
    p.ascii_at(E_SERIAL_OFFSET, None)
        .map_err(|e| ProtocolError::from_report(Command::ESerial.report_id(), e))
}

/// Current backlight intensity (byte 1 of the `brightness` response).
pub fn parse_brightness_report(data: &[u8]) -> ProtocolResult<u8> {
    let p = parser_for(Command::Brightness, data, BRIGHTNESS_MIN_LEN)?;
    p.u8_at(1)
        .map_err(|e| ProtocolError::from_report(Command::Brightness.report_id(), e))
}

/// Current background color (bytes 1..=3 of the `backgroundColor` response).
pub fn parse_background_color_report(data: &[u8]) -> ProtocolResult<Color> {
    let id = Command::BackgroundColor.report_id();
    let p = parser_for(Command::BackgroundColor, data, BACKGROUND_COLOR_MIN_LEN)?;
    let byte = |offset| p.u8_at(offset).map_err(|e| ProtocolError::from_report(id, e));
    Ok(Color::new(byte(1)?, byte(2)?, byte(3)?))
}

/// Capabilities negotiated at connect time.
///
/// Built once from the three negotiation reports and shared as an immutable
/// snapshot; a reconnect produces a new value instead of mutating this one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceCapabilities {
    tablet_width: u16,
    tablet_height: u16,
    pressure_factor: u16,
    screen_width: u16,
    screen_height: u16,
    refresh_rate: u8,
    scaling: PenScaling,
    device_name: String,
    firmware: FirmwareVersion,
    serial: String,
}

impl DeviceCapabilities {
    pub fn negotiate(
        capability: CapabilityReport,
        information: InformationReport,
        serial: String,
    ) -> ProtocolResult<Self> {
        if capability.tablet_width == 0 {
            return Err(ProtocolError::InvalidCapability("tablet width is zero"));
        }
        if capability.screen_width == 0 {
            return Err(ProtocolError::InvalidCapability("screen width is zero"));
        }
        if capability.pressure_factor == 0 {
            return Err(ProtocolError::InvalidCapability("pressure factor is zero"));
        }

        let scale_factor = f32::from(capability.tablet_width) / f32::from(capability.screen_width);
        let scaling = PenScaling::new(scale_factor, capability.pressure_factor)
            .ok_or(ProtocolError::InvalidCapability("pen scaling is unusable"))?;

        Ok(Self {
            tablet_width: capability.tablet_width,
            tablet_height: capability.tablet_height,
            pressure_factor: capability.pressure_factor,
            screen_width: capability.screen_width,
            screen_height: capability.screen_height,
            refresh_rate: capability.refresh_rate,
            scaling,
            device_name: information.device_name,
            firmware: information.firmware,
            serial,
        })
    }

    pub fn tablet_width(&self) -> u16 {
        self.tablet_width
    }

    pub fn tablet_height(&self) -> u16 {
        self.tablet_height
    }

    pub fn pressure_factor(&self) -> u16 {
        self.pressure_factor
    }

    pub fn screen_width(&self) -> u16 {
        self.screen_width
    }

    pub fn screen_height(&self) -> u16 {
        self.screen_height
    }

    pub fn refresh_rate(&self) -> u8 {
        self.refresh_rate
    }

    /// Tablet units per screen pixel (`tablet_width / screen_width`).
    pub fn scale_factor(&self) -> f32 {
        self.scaling.scale_factor()
    }

    /// Pen conversion factors, validated at negotiation.
    pub fn pen_scaling(&self) -> PenScaling {
        self.scaling
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn firmware(&self) -> FirmwareVersion {
        self.firmware
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    /// Size in bytes of a full-screen 24bpp image.
    pub fn image_len(&self) -> usize {
        usize::from(self.screen_width)
            .saturating_mul(usize::from(self.screen_height))
            .saturating_mul(3)
    }
}
