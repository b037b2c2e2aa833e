//! Symbolic report identifiers.

use crate::ids::report_ids;
use serde::{Deserialize, Serialize};

/// Every report the driver sends, reads or decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Command {
    PenData = report_ids::PEN_DATA,
    Information = report_ids::INFORMATION,
    Capability = report_ids::CAPABILITY,
    WritingMode = report_ids::WRITING_MODE,
    ESerial = report_ids::E_SERIAL,
    ClearScreen = report_ids::CLEAR_SCREEN,
    InkMode = report_ids::INK_MODE,
    WriteImageStart = report_ids::WRITE_IMAGE_START,
    WriteImageData = report_ids::WRITE_IMAGE_DATA,
    WriteImageEnd = report_ids::WRITE_IMAGE_END,
    WritingArea = report_ids::WRITING_AREA,
    Brightness = report_ids::BRIGHTNESS,
    PenColorAndWidth = report_ids::PEN_COLOR_AND_WIDTH,
    BackgroundColor = report_ids::BACKGROUND_COLOR,
    PenDataTiming = report_ids::PEN_DATA_TIMING,
}

impl Command {
    pub const ALL: [Command; 15] = [
        Command::PenData,
        Command::Information,
        Command::Capability,
        Command::WritingMode,
        Command::ESerial,
        Command::ClearScreen,
        Command::InkMode,
        Command::WriteImageStart,
        Command::WriteImageData,
        Command::WriteImageEnd,
        Command::WritingArea,
        Command::Brightness,
        Command::PenColorAndWidth,
        Command::BackgroundColor,
        Command::PenDataTiming,
    ];

    pub const fn report_id(self) -> u8 {
        self as u8
    }

    pub fn from_report_id(report_id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.report_id() == report_id)
    }

    /// Input reports arrive unsolicited and are never written.
    pub const fn is_input_report(self) -> bool {
        matches!(self, Command::PenData | Command::PenDataTiming)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Command::PenData => "penData",
            Command::Information => "information",
            Command::Capability => "capability",
            Command::WritingMode => "writingMode",
            Command::ESerial => "eSerial",
            Command::ClearScreen => "clearScreen",
            Command::InkMode => "inkMode",
            Command::WriteImageStart => "writeImageStart",
            Command::WriteImageData => "writeImageData",
            Command::WriteImageEnd => "writeImageEnd",
            Command::WritingArea => "writingArea",
            Command::Brightness => "brightness",
            Command::PenColorAndWidth => "penColorAndWidth",
            Command::BackgroundColor => "backgroundColor",
            Command::PenDataTiming => "penDataTiming",
        }
    }
}

impl TryFrom<u8> for Command {
    type Error = u8;

    fn try_from(report_id: u8) -> Result<Self, Self::Error> {
        Self::from_report_id(report_id).ok_or(report_id)
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (0x{:02X})", self.name(), self.report_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_id_round_trip_for_all_commands() {
        for command in Command::ALL {
            assert_eq!(Command::from_report_id(command.report_id()), Some(command));
        }
    }

    #[test]
    fn test_unknown_report_id() {
        assert_eq!(Command::from_report_id(0x02), None);
        assert_eq!(Command::try_from(0xFF), Err(0xFF));
    }

    #[test]
    fn test_input_reports() {
        let inputs: Vec<_> = Command::ALL
            .into_iter()
            .filter(|c| c.is_input_report())
            .collect();
        assert_eq!(inputs, vec![Command::PenData, Command::PenDataTiming]);
    }

    #[test]
    fn test_display() {
        assert_eq!(Command::Brightness.to_string(), "brightness (0x2B)");
    }
}
