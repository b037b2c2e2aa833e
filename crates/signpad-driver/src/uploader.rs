//! Chunked framebuffer upload.

use crate::channel::{ChannelGuard, FeatureChannel};
use crate::config::DriverConfig;
use crate::error::{DriverError, DriverResult};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use signpad_hid_stu_protocol::{ChunkedImage, Command, ImageFormat, ImageGeometry, image, payload};
use std::sync::Arc;
use tracing::{debug, warn};

/// Step of the upload sequence that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UploadStage {
    Start,
    /// Zero-based chunk index.
    Data { index: usize },
    End,
}

impl std::fmt::Display for UploadStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadStage::Start => f.write_str("start"),
            UploadStage::Data { index } => write!(f, "data chunk {index}"),
            UploadStage::End => f.write_str("end"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    Sent { chunks: usize },
    /// No image was supplied and none is retained.
    NothingToSend,
}

/// Uploads images and retains the last one for resending.
#[derive(Debug)]
pub struct ImageUploader {
    format: ImageFormat,
    chunk_size: usize,
    retained: Mutex<Option<Arc<ChunkedImage>>>,
}

impl ImageUploader {
    pub fn new(format: ImageFormat, chunk_size: usize) -> DriverResult<Self> {
        signpad_hid_stu_protocol::validate_chunk_size(chunk_size)?;
        Ok(Self {
            format,
            chunk_size,
            retained: Mutex::new(None),
        })
    }

    pub fn from_config(config: &DriverConfig) -> DriverResult<Self> {
        Self::new(config.format()?, config.chunk_size)
    }

    pub fn has_image(&self) -> bool {
        self.retained.lock().is_some()
    }

    /// Upload `image`, or resend the retained image when `None`.
    ///
    /// A new image must be exactly `geometry.byte_len()` bytes; a mismatch
    /// fails before any I/O and leaves the retained image untouched.
    pub async fn set_image(
        &self,
        channel: &FeatureChannel,
        geometry: ImageGeometry,
        image: Option<&[u8]>,
    ) -> DriverResult<UploadOutcome> {
        let Some(chunked) = self.select(geometry, image)? else {
            debug!("no image retained, nothing to send");
            return Ok(UploadOutcome::NothingToSend);
        };
        let mut guard = channel.lock().await?;
        upload_locked(&mut guard, &chunked).await
    }

    /// Turn inking off, redraw the retained image over the ink, turn inking
    /// back on.
    pub async fn clear_drawing(&self, channel: &FeatureChannel) -> DriverResult<UploadOutcome> {
        let retained = self.retained.lock().clone();
        let mut guard = channel.lock().await?;

        guard.send(Command::InkMode, &payload::ink_mode(false)).await?;
        let outcome = match retained {
            Some(chunked) => upload_locked(&mut guard, &chunked).await?,
            None => UploadOutcome::NothingToSend,
        };
        guard.send(Command::InkMode, &payload::ink_mode(true)).await?;
        Ok(outcome)
    }

    fn select(
        &self,
        geometry: ImageGeometry,
        image: Option<&[u8]>,
    ) -> DriverResult<Option<Arc<ChunkedImage>>> {
        let Some(data) = image else {
            return Ok(self.retained.lock().clone());
        };
        geometry.validate(data)?;
        let chunked = Arc::new(ChunkedImage::new(self.format, data, self.chunk_size)?);
        *self.retained.lock() = Some(Arc::clone(&chunked));
        Ok(Some(chunked))
    }
}

/// Run start, data and end on an already-held channel.
async fn upload_locked(
    guard: &mut ChannelGuard<'_>,
    chunked: &ChunkedImage,
) -> DriverResult<UploadOutcome> {
    let chunks = chunked.chunk_count();
    debug!(chunks, bytes = chunked.byte_len(), "image upload started");

    guard
        .send(Command::WriteImageStart, &chunked.start_payload())
        .await
        .map_err(|e| abort(UploadStage::Start, e))?;

    for (index, chunk) in chunked.chunks().iter().enumerate() {
        let framed = image::image_data(chunk)
            .map_err(|e| abort(UploadStage::Data { index }, e.into()))?;
        guard
            .send(Command::WriteImageData, &framed)
            .await
            .map_err(|e| abort(UploadStage::Data { index }, e))?;
    }

    guard
        .send(Command::WriteImageEnd, &image::image_end())
        .await
        .map_err(|e| abort(UploadStage::End, e))?;

    debug!(chunks, "image upload finished");
    Ok(UploadOutcome::Sent { chunks })
}

fn abort(stage: UploadStage, source: DriverError) -> DriverError {
    warn!(%stage, error = %source, "image upload aborted");
    DriverError::transfer_aborted(stage, source)
}
