//! Image upload framing.
//!
//! An upload is `writeImageStart [format]`, one `writeImageData` per chunk,
//! then `writeImageEnd [0]`. Chunks are taken in order from a flat BGR
//! framebuffer; the last chunk carries only the remaining bytes.

use crate::error::{ProtocolError, ProtocolResult};
use serde::{Deserialize, Serialize};
use signpad_hid_common::ReportBuilder;
use tracing::trace;

/// 24 bits per pixel, blue-green-red byte order.
pub const IMAGE_FORMAT_24BPP_BGR: u8 = 0x04;
pub const BYTES_PER_PIXEL: usize = 3;
pub const DEFAULT_CHUNK_SIZE: usize = 253;
/// The length prefix is one byte and the data report holds 255 bytes.
pub const MAX_CHUNK_SIZE: usize = 253;

/// Pixel formats accepted by `writeImageStart`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFormat {
    #[default]
    Bgr24,
}

impl ImageFormat {
    pub const fn code(self) -> u8 {
        match self {
            Self::Bgr24 => IMAGE_FORMAT_24BPP_BGR,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            IMAGE_FORMAT_24BPP_BGR => Some(Self::Bgr24),
            _ => None,
        }
    }
}

/// Screen dimensions an image must match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageGeometry {
    pub width: u16,
    pub height: u16,
}

impl ImageGeometry {
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    pub fn byte_len(&self) -> usize {
        usize::from(self.width)
            .saturating_mul(usize::from(self.height))
            .saturating_mul(BYTES_PER_PIXEL)
    }

    pub fn validate(&self, image: &[u8]) -> ProtocolResult<()> {
        let expected = self.byte_len();
        if image.len() == expected {
            Ok(())
        } else {
            Err(ProtocolError::ImageSizeMismatch {
                expected,
                actual: image.len(),
            })
        }
    }
}

pub fn validate_chunk_size(chunk_size: usize) -> ProtocolResult<()> {
    if (1..=MAX_CHUNK_SIZE).contains(&chunk_size) {
        Ok(())
    } else {
        Err(ProtocolError::InvalidChunkSize(chunk_size))
    }
}

/// Split `data` into `ceil(len / chunk_size)` owned chunks.
///
/// Empty input yields no chunks.
pub fn split_to_chunks(data: &[u8], chunk_size: usize) -> ProtocolResult<Vec<Vec<u8>>> {
    validate_chunk_size(chunk_size)?;
    let chunks: Vec<Vec<u8>> = data.chunks(chunk_size).map(<[u8]>::to_vec).collect();
    trace!(
        bytes = data.len(),
        chunk_size,
        chunks = chunks.len(),
        "split image into chunks"
    );
    Ok(chunks)
}

/// An image already partitioned for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedImage {
    format: ImageFormat,
    chunks: Vec<Vec<u8>>,
}

impl ChunkedImage {
    pub fn new(format: ImageFormat, data: &[u8], chunk_size: usize) -> ProtocolResult<Self> {
        Ok(Self {
            format,
            chunks: split_to_chunks(data, chunk_size)?,
        })
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn chunks(&self) -> &[Vec<u8>] {
        &self.chunks
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn byte_len(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }

    pub fn start_payload(&self) -> [u8; 1] {
        image_start(self.format)
    }
}

pub fn image_start(format: ImageFormat) -> [u8; 1] {
    [format.code()]
}

/// `[len, 0x00, bytes...]`
pub fn image_data(chunk: &[u8]) -> ProtocolResult<Vec<u8>> {
    let len = u8::try_from(chunk.len())
        .ok()
        .filter(|len| (1..=MAX_CHUNK_SIZE).contains(&usize::from(*len)))
        .ok_or(ProtocolError::InvalidChunk {
            len: chunk.len(),
            max: MAX_CHUNK_SIZE,
        })?;

    let mut builder = ReportBuilder::with_capacity(chunk.len() + 2);
    builder.write_u8(len).write_u8(0).write_bytes(chunk);
    Ok(builder.into_inner())
}

pub fn image_end() -> [u8; 1] {
    [0]
}

/// Convert packed RGBA pixels into the device's BGR layout, dropping alpha.
///
/// A trailing partial pixel is ignored.
pub fn bgr_from_rgba(rgba: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(rgba.len() / 4 * BYTES_PER_PIXEL);
    for px in rgba.chunks_exact(4) {
        if let [r, g, b, _a] = px {
            out.extend_from_slice(&[*b, *g, *r]);
        }
    }
    out
}
