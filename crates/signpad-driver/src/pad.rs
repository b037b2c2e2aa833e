//! Application-facing signature pad handle.

use crate::cache::WriteOutcome;
use crate::config::DriverConfig;
use crate::connection::{ConnectionManager, ConnectionState};
use crate::error::{DriverError, DriverResult};
use crate::hotplug::HotplugDispatcher;
use crate::subscribers::{SubscriberList, SubscriptionId};
use crate::task::BackgroundTask;
use crate::uploader::{ImageUploader, UploadOutcome};
use signpad_hid_common::{HidHost, HotplugEvent};
use signpad_hid_stu_protocol::{
    Color, Command, DeviceCapabilities, ImageGeometry, PenSample, WritingArea, WritingMode, payload,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// A single signature pad.
///
/// Commands require a `Ready` connection and return
/// [`DriverError::NotConnected`] without touching the transport otherwise.
/// Dropping the pad stops the hotplug monitor and the pen decoder; call
/// [`SignaturePad::disconnect`] first to close the device handle cleanly.
pub struct SignaturePad {
    config: DriverConfig,
    connection: ConnectionManager,
    uploader: ImageUploader,
    pen_subscribers: Arc<SubscriberList<PenSample>>,
    hotplug_subscribers: Arc<SubscriberList<HotplugEvent>>,
    _hotplug_task: Option<BackgroundTask>,
}

impl SignaturePad {
    /// Validate `config` and start monitoring hotplug events.
    ///
    /// A host without hotplug support is not an error; the pad simply never
    /// reports hotplug events.
    pub async fn new(host: Arc<dyn HidHost>, config: DriverConfig) -> DriverResult<Self> {
        config.validate()?;
        let uploader = ImageUploader::from_config(&config)?;
        let pen_subscribers = Arc::new(SubscriberList::new());
        let hotplug_subscribers = Arc::new(SubscriberList::new());

        let hotplug_task = match host.monitor_devices().await {
            Ok(events) => Some(
                HotplugDispatcher::new(config.device_filter(), Arc::clone(&hotplug_subscribers))
                    .spawn(events),
            ),
            Err(e) => {
                warn!(error = %e, "hotplug monitoring unavailable");
                None
            }
        };

        let connection =
            ConnectionManager::new(host, config.device_filter(), Arc::clone(&pen_subscribers));
        debug!(
            filter = %config.device_filter(),
            chunk_size = config.chunk_size,
            "signature pad created"
        );

        Ok(Self {
            config,
            connection,
            uploader,
            pen_subscribers,
            hotplug_subscribers,
            _hotplug_task: hotplug_task,
        })
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    // ---- lifecycle ----

    pub async fn connect(&self) -> DriverResult<Arc<DeviceCapabilities>> {
        self.connection.connect().await
    }

    pub async fn disconnect(&self) {
        self.connection.disconnect().await;
    }

    /// Whether a matching pad is connected or already granted. Never prompts.
    pub async fn is_available(&self) -> bool {
        self.connection.is_available().await
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn capabilities(&self) -> Option<Arc<DeviceCapabilities>> {
        self.connection.capabilities()
    }

    /// Last backlight intensity seen on the device.
    pub fn cached_backlight(&self) -> Option<u8> {
        self.connection.cache().backlight()
    }

    pub fn cached_background_color(&self) -> Option<Color> {
        self.connection.cache().background_color()
    }

    fn ready(&self) -> DriverResult<Arc<DeviceCapabilities>> {
        if !self.connection.is_ready() {
            return Err(DriverError::NotConnected);
        }
        self.connection.capabilities().ok_or(DriverError::NotConnected)
    }

    // ---- commands ----

    /// Restrict inking to `area` (tablet units).
    pub async fn set_writing_area(&self, area: WritingArea) -> DriverResult<()> {
        let caps = self.ready()?;
        if !area.fits_within(caps.tablet_width(), caps.tablet_height()) {
            warn!(?area, "writing area exceeds the tablet surface");
        }
        self.connection
            .channel()
            .send(Command::WritingArea, &payload::writing_area(&area))
            .await
    }

    /// `color` is `#RRGGBB` or `RRGGBB`.
    pub async fn set_pen_color_and_width(&self, color: &str, width: u8) -> DriverResult<()> {
        self.ready()?;
        let color = Color::from_hex(color)?;
        self.connection
            .channel()
            .send(
                Command::PenColorAndWidth,
                &payload::pen_color_and_width(color, width),
            )
            .await
    }

    /// Writes only when the device reports a different intensity.
    pub async fn set_backlight(&self, level: u8) -> DriverResult<WriteOutcome> {
        self.ready()?;
        self.connection
            .cache()
            .set_backlight(self.connection.channel(), level)
            .await
    }

    /// Writes only when the device reports a different color.
    pub async fn set_background_color(&self, color: &str) -> DriverResult<WriteOutcome> {
        self.ready()?;
        let color = Color::from_hex(color)?;
        self.connection
            .cache()
            .set_background_color(self.connection.channel(), color)
            .await
    }

    pub async fn set_inking(&self, enabled: bool) -> DriverResult<()> {
        self.ready()?;
        self.connection
            .channel()
            .send(Command::InkMode, &payload::ink_mode(enabled))
            .await
    }

    pub async fn set_writing_mode(&self, mode: WritingMode) -> DriverResult<()> {
        self.ready()?;
        self.connection
            .channel()
            .send(Command::WritingMode, &payload::writing_mode(mode))
            .await
    }

    pub async fn clear_screen(&self) -> DriverResult<()> {
        self.ready()?;
        self.connection
            .channel()
            .send(Command::ClearScreen, &payload::clear_screen())
            .await
    }

    /// Upload a `screen_width x screen_height` 24-bit BGR image, or resend
    /// the last one when `image` is `None`.
    pub async fn set_image(&self, image: Option<&[u8]>) -> DriverResult<UploadOutcome> {
        let caps = self.ready()?;
        let geometry = ImageGeometry::new(caps.screen_width(), caps.screen_height());
        self.uploader
            .set_image(self.connection.channel(), geometry, image)
            .await
    }

    /// Erase device-side ink by redrawing the last image.
    pub async fn clear_drawing(&self) -> DriverResult<UploadOutcome> {
        self.ready()?;
        self.uploader.clear_drawing(self.connection.channel()).await
    }

    // ---- subscriptions ----

    /// Called on the pen decoder task for every decoded sample, in order.
    pub fn on_pen_sample<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&PenSample) + Send + Sync + 'static,
    {
        self.pen_subscribers.subscribe(callback)
    }

    pub fn remove_pen_subscriber(&self, id: SubscriptionId) -> bool {
        self.pen_subscribers.unsubscribe(id)
    }

    /// Called for connect/disconnect events of devices matching the
    /// configured identity.
    pub fn on_hotplug<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&HotplugEvent) + Send + Sync + 'static,
    {
        self.hotplug_subscribers.subscribe(callback)
    }

    pub fn remove_hotplug_subscriber(&self, id: SubscriptionId) -> bool {
        self.hotplug_subscribers.unsubscribe(id)
    }
}

impl std::fmt::Debug for SignaturePad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignaturePad")
            .field("config", &self.config)
            .field("connection", &self.connection)
            .field("pen_subscribers", &self.pen_subscribers.len())
            .field("hotplug_subscribers", &self.hotplug_subscribers.len())
            .finish_non_exhaustive()
    }
}
