//! Negotiated capabilities and write-avoiding settings cache.
//!
//! Backlight and background color live in the device's non-volatile
//! storage, so both setters read the current value first and only write
//! when it differs.

use crate::channel::FeatureChannel;
use crate::error::DriverResult;
use parking_lot::RwLock;
use signpad_hid_stu_protocol::{
    Color, Command, DeviceCapabilities, parse_background_color_report, parse_brightness_report,
    payload,
};
use std::sync::Arc;
use tracing::debug;

/// Result of a read-compare-write setter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The device already held the requested value; nothing was sent.
    Unchanged,
    Written,
}

#[derive(Debug, Default)]
struct CacheState {
    capabilities: Option<Arc<DeviceCapabilities>>,
    backlight: Option<u8>,
    background: Option<Color>,
}

#[derive(Debug, Default)]
pub struct DeviceConfigCache {
    state: RwLock<CacheState>,
}

impl DeviceConfigCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the capabilities snapshot. Cached settings are dropped since
    /// they may belong to a different device.
    pub fn install(&self, capabilities: Arc<DeviceCapabilities>) {
        let mut state = self.state.write();
        state.capabilities = Some(capabilities);
        state.backlight = None;
        state.background = None;
    }

    pub fn clear(&self) {
        *self.state.write() = CacheState::default();
    }

    pub fn capabilities(&self) -> Option<Arc<DeviceCapabilities>> {
        self.state.read().capabilities.clone()
    }

    /// Last backlight intensity read from or written to the device.
    pub fn backlight(&self) -> Option<u8> {
        self.state.read().backlight
    }

    pub fn background_color(&self) -> Option<Color> {
        self.state.read().background
    }

    pub async fn set_backlight(
        &self,
        channel: &FeatureChannel,
        level: u8,
    ) -> DriverResult<WriteOutcome> {
        let mut guard = channel.lock().await?;
        let response = guard.read(Command::Brightness).await?;
        let current = parse_brightness_report(&response)?;
        self.state.write().backlight = Some(current);

        if current == level {
            debug!(level, "backlight unchanged, skipping write");
            return Ok(WriteOutcome::Unchanged);
        }

        guard
            .send(Command::Brightness, &payload::brightness(level))
            .await?;
        self.state.write().backlight = Some(level);
        debug!(from = current, to = level, "backlight written");
        Ok(WriteOutcome::Written)
    }

    pub async fn set_background_color(
        &self,
        channel: &FeatureChannel,
        color: Color,
    ) -> DriverResult<WriteOutcome> {
        let mut guard = channel.lock().await?;
        let response = guard.read(Command::BackgroundColor).await?;
        let current = parse_background_color_report(&response)?;
        self.state.write().background = Some(current);

        if current == color {
            debug!(%color, "background color unchanged, skipping write");
            return Ok(WriteOutcome::Unchanged);
        }

        guard
            .send(Command::BackgroundColor, &payload::background_color(color))
            .await?;
        self.state.write().background = Some(color);
        debug!(from = %current, to = %color, "background color written");
        Ok(WriteOutcome::Written)
    }
}
