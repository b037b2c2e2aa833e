//! Bounds-checked HID report parsing and building
//!
//! Feature-report responses are addressed by absolute byte offset, so the
//! parser reads at explicit offsets instead of walking a cursor. Every read
//! checks the buffer length first and fails with
//! [`HidCommonError::ShortReport`] rather than indexing out of bounds.

use crate::{HidCommonError, HidCommonResult};

pub struct ReportParser<'a> {
    buffer: &'a [u8],
}

impl<'a> ReportParser<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Fail unless the report holds at least `needed` bytes.
    pub fn require(&self, needed: usize) -> HidCommonResult<()> {
        if self.buffer.len() < needed {
            return Err(HidCommonError::ShortReport {
                needed,
                available: self.buffer.len(),
            });
        }
        Ok(())
    }

    pub fn u8_at(&self, offset: usize) -> HidCommonResult<u8> {
        self.bytes_at(offset, 1)
            .map(|b| b.first().copied().unwrap_or_default())
    }

    pub fn u16_le_at(&self, offset: usize) -> HidCommonResult<u16> {
        let bytes = self.bytes_at(offset, 2)?;
        match bytes {
            [lo, hi] => Ok(u16::from_le_bytes([*lo, *hi])),
            _ => Err(self.short(offset.saturating_add(2))),
        }
    }

    pub fn bytes_at(&self, offset: usize, count: usize) -> HidCommonResult<&'a [u8]> {
        let end = offset
            .checked_add(count)
            .ok_or_else(|| HidCommonError::InvalidReport("offset overflow".to_string()))?;
        self.buffer.get(offset..end).ok_or_else(|| self.short(end))
    }

    /// Read an ASCII string starting at `offset`.
    ///
    /// The string ends at the first NUL, after `max_len` bytes, or at the end
    /// of the report, whichever comes first. Non-ASCII bytes are replaced.
    pub fn ascii_at(&self, offset: usize, max_len: Option<usize>) -> HidCommonResult<String> {
        self.require(offset)?;
        let tail = self.buffer.get(offset..).unwrap_or_default();
        let limit = max_len.map_or(tail.len(), |max| max.min(tail.len()));
        let text = tail
            .iter()
            .take(limit)
            .take_while(|b| **b != 0)
            .map(|b| if b.is_ascii() { char::from(*b) } else { '?' })
            .collect();
        Ok(text)
    }

    pub fn as_slice(&self) -> &'a [u8] {
        self.buffer
    }

    fn short(&self, needed: usize) -> HidCommonError {
        HidCommonError::ShortReport {
            needed,
            available: self.buffer.len(),
        }
    }
}

pub struct ReportBuilder {
    buffer: Vec<u8>,
}

impl ReportBuilder {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    pub fn write_u8(&mut self, value: u8) -> &mut Self {
        self.buffer.push(value);
        self
    }

    pub fn write_u16_le(&mut self, value: u16) -> &mut Self {
        self.buffer.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn write_bytes(&mut self, data: &[u8]) -> &mut Self {
        self.buffer.extend_from_slice(data);
        self
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::with_capacity(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u8_at_bounds() -> HidCommonResult<()> {
        let data = [0x09, 0x02, 0x03];
        let parser = ReportParser::new(&data);

        assert_eq!(parser.u8_at(0)?, 0x09);
        assert_eq!(parser.u8_at(2)?, 0x03);
        assert_eq!(
            parser.u8_at(3),
            Err(HidCommonError::ShortReport {
                needed: 4,
                available: 3
            })
        );
        Ok(())
    }

    #[test]
    fn test_u16_le_at() -> HidCommonResult<()> {
        let data = [0x00, 0x34, 0x12];
        let parser = ReportParser::new(&data);

        assert_eq!(parser.u16_le_at(1)?, 0x1234);
        assert!(parser.u16_le_at(2).is_err());
        Ok(())
    }

    #[test]
    fn test_require() {
        let data = [0u8; 4];
        let parser = ReportParser::new(&data);
        assert!(parser.require(4).is_ok());
        assert_eq!(
            parser.require(12),
            Err(HidCommonError::ShortReport {
                needed: 12,
                available: 4
            })
        );
    }

    #[test]
    fn test_ascii_stops_at_nul_and_limit() -> HidCommonResult<()> {
        let data = [0x08, b'S', b'T', b'U', 0x00, b'X', b'Y'];
        let parser = ReportParser::new(&data);

        assert_eq!(parser.ascii_at(1, None)?, "STU");
        assert_eq!(parser.ascii_at(1, Some(2))?, "ST");
        assert_eq!(parser.ascii_at(5, None)?, "XY");
        assert_eq!(parser.ascii_at(7, None)?, "");
        assert!(parser.ascii_at(8, None).is_err());
        Ok(())
    }

    #[test]
    fn test_offset_overflow_is_invalid_report() {
        let data = [0u8; 2];
        let parser = ReportParser::new(&data);
        assert!(matches!(
            parser.bytes_at(usize::MAX, 2),
            Err(HidCommonError::InvalidReport(_))
        ));
    }

    #[test]
    fn test_report_builder() {
        let mut builder = ReportBuilder::with_capacity(8);

        builder
            .write_u8(0x01)
            .write_u16_le(0x1234)
            .write_bytes(&[0xAA, 0xBB]);

        assert_eq!(builder.len(), 5);
        assert_eq!(builder.into_inner(), vec![0x01, 0x34, 0x12, 0xAA, 0xBB]);
    }
}
