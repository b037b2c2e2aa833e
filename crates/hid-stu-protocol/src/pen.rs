//! Pen input-report decoding.
//!
//! Layout (report id stripped):
//!
//! | Offset | Field |
//! |---|---|
//! | 0 | bit0 proximity, bit1 contact, bits 0..4 also pressure low nibble |
//! | 0..2 | pressure, LE u16 after masking byte 0 to its low nibble |
//! | 2..4 | x, LE u16, tablet units |
//! | 4..6 | y, LE u16, tablet units |
//! | 6..8 | timestamp, LE u16 (timing reports only) |
//! | 8..10 | sequence, LE u16 (timing reports only) |

use crate::command::Command;
use crate::error::{ProtocolError, ProtocolResult};
use crate::report::DeviceCapabilities;
use serde::{Deserialize, Serialize};

pub const PEN_REPORT_LEN: usize = 6;
pub const PEN_TIMING_REPORT_LEN: usize = 10;

/// Pressure normalization used before capabilities are negotiated.
pub const DEFAULT_PRESSURE_FACTOR: u16 = 1023;
/// Tablet units per screen pixel on the STU-540 (10800 / 800).
pub const DEFAULT_SCALE_FACTOR: f32 = 13.5;

const PROXIMITY_BIT: u8 = 1 << 0;
const CONTACT_BIT: u8 = 1 << 1;
const PRESSURE_HIGH_MASK: u8 = 0x0F;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PenReportKind {
    Basic,
    Timing,
}

impl PenReportKind {
    pub fn from_report_id(report_id: u8) -> Option<Self> {
        match Command::from_report_id(report_id)? {
            Command::PenData => Some(Self::Basic),
            Command::PenDataTiming => Some(Self::Timing),
            _ => None,
        }
    }

    pub const fn report_id(self) -> u8 {
        match self {
            Self::Basic => Command::PenData.report_id(),
            Self::Timing => Command::PenDataTiming.report_id(),
        }
    }

    pub const fn min_len(self) -> usize {
        match self {
            Self::Basic => PEN_REPORT_LEN,
            Self::Timing => PEN_TIMING_REPORT_LEN,
        }
    }
}

/// Conversion factors captured from negotiated capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PenScaling {
    scale_factor: f32,
    pressure_factor: u16,
}

impl PenScaling {
    /// Returns `None` when either factor would make decoding undefined.
    pub fn new(scale_factor: f32, pressure_factor: u16) -> Option<Self> {
        let usable = scale_factor.is_finite() && scale_factor > 0.0 && pressure_factor != 0;
        usable.then_some(Self {
            scale_factor,
            pressure_factor,
        })
    }

    pub fn scale_factor(&self) -> f32 {
        self.scale_factor
    }

    pub fn pressure_factor(&self) -> u16 {
        self.pressure_factor
    }
}

impl Default for PenScaling {
    fn default() -> Self {
        Self {
            scale_factor: DEFAULT_SCALE_FACTOR,
            pressure_factor: DEFAULT_PRESSURE_FACTOR,
        }
    }
}

impl From<&DeviceCapabilities> for PenScaling {
    fn from(caps: &DeviceCapabilities) -> Self {
        caps.pen_scaling()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenTiming {
    pub timestamp: u16,
    pub sequence: u16,
}

/// One decoded pen report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PenSample {
    /// Pen is within sensing range.
    pub proximity: bool,
    /// Pen tip touches the surface.
    pub contact: bool,
    pub raw_x: u16,
    pub raw_y: u16,
    /// `raw_x / scale_factor`, truncated toward zero.
    ///
    /// Saturates at `u16::MAX` when a scale factor below 1 pushes the
    /// result out of range.
    pub scaled_x: u16,
    /// Same conversion and saturation as `scaled_x`.
    pub scaled_y: u16,
    /// `raw_pressure / pressure_factor`, nominally in `[0, 1]`.
    pub pressure: f32,
    /// Present only for `penDataTiming` reports.
    pub timing: Option<PenTiming>,
}

fn le_u16(data: &[u8], offset: usize) -> Option<u16> {
    match data.get(offset..offset.checked_add(2)?)? {
        [lo, hi] => Some(u16::from_le_bytes([*lo, *hi])),
        _ => None,
    }
}

fn scale(raw: u16, scale_factor: f32) -> u16 {
    // float-to-int `as` saturates; trunc() makes the rounding mode explicit
    (f32::from(raw) / scale_factor).trunc() as u16
}

/// Decode a pen report of a known kind.
pub fn decode_pen_report(
    kind: PenReportKind,
    data: &[u8],
    scaling: &PenScaling,
) -> ProtocolResult<PenSample> {
    let truncated = || ProtocolError::Truncated {
        report_id: kind.report_id(),
        expected: kind.min_len(),
        actual: data.len(),
    };
    if data.len() < kind.min_len() {
        return Err(truncated());
    }

    let (flags, pressure_high) = match data {
        [flags, high, ..] => (*flags, *high),
        _ => return Err(truncated()),
    };
    let raw_pressure = u16::from_le_bytes([flags & PRESSURE_HIGH_MASK, pressure_high]);
    let raw_x = le_u16(data, 2).ok_or_else(truncated)?;
    let raw_y = le_u16(data, 4).ok_or_else(truncated)?;

    let timing = match kind {
        PenReportKind::Basic => None,
        PenReportKind::Timing => Some(PenTiming {
            timestamp: le_u16(data, 6).ok_or_else(truncated)?,
            sequence: le_u16(data, 8).ok_or_else(truncated)?,
        }),
    };

    Ok(PenSample {
        proximity: flags & PROXIMITY_BIT != 0,
        contact: flags & CONTACT_BIT != 0,
        raw_x,
        raw_y,
        scaled_x: scale(raw_x, scaling.scale_factor),
        scaled_y: scale(raw_y, scaling.scale_factor),
        pressure: f32::from(raw_pressure) / f32::from(scaling.pressure_factor),
        timing,
    })
}

/// Decode any input report.
///
/// Returns `Ok(None)` for report ids that are not pen data.
pub fn decode_input_report(
    report_id: u8,
    data: &[u8],
    scaling: &PenScaling,
) -> ProtocolResult<Option<PenSample>> {
    match PenReportKind::from_report_id(report_id) {
        Some(kind) => decode_pen_report(kind, data, scaling).map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_basic_report() -> ProtocolResult<()> {
        let sample = decode_pen_report(
            PenReportKind::Basic,
            &[0x03, 0x00, 0x64, 0x00, 0xC8, 0x00],
            &PenScaling::default(),
        )?;

        assert!(sample.proximity);
        assert!(sample.contact);
        assert_eq!(sample.raw_x, 100);
        assert_eq!(sample.raw_y, 200);
        assert_eq!(sample.scaled_x, 7);
        assert_eq!(sample.scaled_y, 14);
        assert!((sample.pressure - 3.0 / 1023.0).abs() < f32::EPSILON);
        assert_eq!(sample.timing, None);
        Ok(())
    }

    #[test]
    fn test_timing_report_reads_timestamp_and_sequence() -> ProtocolResult<()> {
        let data = [0x01, 0x00, 0x10, 0x27, 0x20, 0x4E, 0x34, 0x12, 0x02, 0x00];
        let sample = decode_pen_report(PenReportKind::Timing, &data, &PenScaling::default())?;

        assert!(sample.proximity);
        assert!(!sample.contact);
        assert_eq!(sample.raw_x, 10_000);
        assert_eq!(sample.raw_y, 20_000);
        assert_eq!(
            sample.timing,
            Some(PenTiming {
                timestamp: 0x1234,
                sequence: 2
            })
        );
        Ok(())
    }

    #[test]
    fn test_flag_bits_do_not_leak_into_pressure() -> ProtocolResult<()> {
        // high nibble and both flag bits set; low nibble 0xF survives masking
        let data = [0xFF, 0x03, 0x00, 0x00, 0x00, 0x00];
        let sample = decode_pen_report(PenReportKind::Basic, &data, &PenScaling::default())?;
        assert_eq!(
            sample.pressure,
            f32::from(0x030F_u16) / f32::from(DEFAULT_PRESSURE_FACTOR)
        );
        Ok(())
    }

    #[test]
    fn test_full_pressure_is_exactly_one() -> ProtocolResult<()> {
        // masked raw pressure is 0x030F; use it as the factor
        let data = [0xFF, 0x03, 0x00, 0x00, 0x00, 0x00];
        let scaling = PenScaling::new(13.5, 0x030F).ok_or(ProtocolError::InvalidCapability("x"))?;
        let sample = decode_pen_report(PenReportKind::Basic, &data, &scaling)?;
        assert_eq!(sample.pressure, 1.0);
        Ok(())
    }

    #[test]
    fn test_short_reports_are_rejected() {
        let short = [0x03, 0x00, 0x64, 0x00, 0xC8];
        assert_eq!(
            decode_pen_report(PenReportKind::Basic, &short, &PenScaling::default()),
            Err(ProtocolError::Truncated {
                report_id: 0x01,
                expected: 6,
                actual: 5
            })
        );

        let basic_len = [0u8; 6];
        assert!(matches!(
            decode_pen_report(PenReportKind::Timing, &basic_len, &PenScaling::default()),
            Err(ProtocolError::Truncated {
                report_id: 0x34,
                expected: 10,
                ..
            })
        ));
    }

    #[test]
    fn test_non_pen_report_ids_are_skipped() -> ProtocolResult<()> {
        let data = [0x03, 0x00, 0x64, 0x00, 0xC8, 0x00];
        assert_eq!(decode_input_report(0x09, &data, &PenScaling::default())?, None);
        assert_eq!(decode_input_report(0x02, &data, &PenScaling::default())?, None);
        assert!(decode_input_report(0x01, &data, &PenScaling::default())?.is_some());
        Ok(())
    }

    #[test]
    fn test_scaling_rejects_unusable_factors() {
        assert!(PenScaling::new(0.0, 1023).is_none());
        assert!(PenScaling::new(f32::NAN, 1023).is_none());
        assert!(PenScaling::new(13.5, 0).is_none());
        assert!(PenScaling::new(13.5, 1023).is_some());
    }

    #[test]
    fn test_sub_unit_scale_saturates_coordinates() -> ProtocolResult<()> {
        let scaling = PenScaling::new(0.5, 1023).ok_or(ProtocolError::InvalidCapability("scale"))?;
        // x = 40000 -> 80000 clamps; y = 100 -> 200 fits
        let sample = decode_pen_report(
            PenReportKind::Basic,
            &[0x01, 0x00, 0x40, 0x9C, 0x64, 0x00],
            &scaling,
        )?;
        assert_eq!(sample.raw_x, 40000);
        assert_eq!(sample.scaled_x, u16::MAX);
        assert_eq!(sample.scaled_y, 200);
        Ok(())
    }
}
