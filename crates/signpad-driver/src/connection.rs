//! Connection lifecycle: access, open, capability negotiation, teardown.

use crate::cache::DeviceConfigCache;
use crate::channel::FeatureChannel;
use crate::error::{DriverError, DriverResult};
use crate::pen::PenStreamDecoder;
use crate::subscribers::SubscriberList;
use crate::task::BackgroundTask;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use signpad_hid_common::{DeviceFilter, FeatureReportDevice, HidHost};
use signpad_hid_stu_protocol::{
    Command, DeviceCapabilities, PenSample, PenScaling, parse_capability_report,
    parse_information_report, parse_serial_report,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    RequestingAccess,
    Opening,
    NegotiatingCapabilities,
    /// Capabilities are installed and commands are accepted.
    Ready,
}

impl ConnectionState {
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::RequestingAccess => "requesting_access",
            ConnectionState::Opening => "opening",
            ConnectionState::NegotiatingCapabilities => "negotiating_capabilities",
            ConnectionState::Ready => "ready",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owns the device handle for its whole lifetime.
///
/// `connect` and `disconnect` are serialized by the lifecycle lock, which
/// also guards the pen decoder task.
pub struct ConnectionManager {
    host: Arc<dyn HidHost>,
    filter: DeviceFilter,
    channel: Arc<FeatureChannel>,
    cache: Arc<DeviceConfigCache>,
    pen_subscribers: Arc<SubscriberList<PenSample>>,
    state: RwLock<ConnectionState>,
    lifecycle: Mutex<Option<BackgroundTask>>,
}

impl ConnectionManager {
    pub fn new(
        host: Arc<dyn HidHost>,
        filter: DeviceFilter,
        pen_subscribers: Arc<SubscriberList<PenSample>>,
    ) -> Self {
        Self {
            host,
            filter,
            channel: Arc::new(FeatureChannel::new()),
            cache: Arc::new(DeviceConfigCache::new()),
            pen_subscribers,
            state: RwLock::new(ConnectionState::Disconnected),
            lifecycle: Mutex::new(None),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    pub fn is_ready(&self) -> bool {
        self.state() == ConnectionState::Ready
    }

    pub fn channel(&self) -> &FeatureChannel {
        &self.channel
    }

    pub fn cache(&self) -> &DeviceConfigCache {
        &self.cache
    }

    pub fn capabilities(&self) -> Option<Arc<DeviceCapabilities>> {
        self.cache.capabilities()
    }

    fn set_state(&self, next: ConnectionState) -> ConnectionState {
        let previous = std::mem::replace(&mut *self.state.write(), next);
        if previous != next {
            debug!(from = %previous, to = %next, "connection state changed");
        }
        previous
    }

    /// Whether a pad can be used without prompting the user.
    pub async fn is_available(&self) -> bool {
        if self.is_ready() {
            return true;
        }
        match self.host.granted_devices().await {
            Ok(devices) => devices.iter().any(|device| self.filter.matches(device)),
            Err(e) => {
                debug!(error = %e, "granted device query failed");
                false
            }
        }
    }

    /// Connect and negotiate, or return the current snapshot if already
    /// `Ready`.
    pub async fn connect(&self) -> DriverResult<Arc<DeviceCapabilities>> {
        let mut pen_task = self.lifecycle.lock().await;

        if self.is_ready() {
            if let Some(capabilities) = self.cache.capabilities() {
                debug!("already connected");
                return Ok(capabilities);
            }
        }

        match self.establish(&mut pen_task).await {
            Ok(capabilities) => Ok(capabilities),
            Err(e) => {
                warn!(error = %e, "connect failed");
                self.set_state(ConnectionState::Disconnected);
                Err(e)
            }
        }
    }

    async fn establish(
        &self,
        pen_task: &mut Option<BackgroundTask>,
    ) -> DriverResult<Arc<DeviceCapabilities>> {
        self.set_state(ConnectionState::RequestingAccess);
        let info = self
            .host
            .request_device(&self.filter)
            .await
            .map_err(|e| DriverError::OpenFailed(e.to_string()))?
            .ok_or(DriverError::NoDeviceSelected)?;

        self.set_state(ConnectionState::Opening);
        debug!(device = %info.display_name(), path = %info.path, "opening device");
        let mut device = self
            .host
            .open_device(&info)
            .await
            .map_err(|e| DriverError::OpenFailed(e.to_string()))?;
        let input_reports = device.take_input_reports();
        if let Some(stale) = self.channel.attach(device).await {
            close_handle(stale).await;
        }

        self.set_state(ConnectionState::NegotiatingCapabilities);
        let capabilities = match self.negotiate().await {
            Ok(capabilities) => Arc::new(capabilities),
            Err(e) => {
                self.release().await;
                return Err(DriverError::capability_read(e));
            }
        };
        self.cache.install(Arc::clone(&capabilities));

        *pen_task = match input_reports {
            Some(reports) => Some(
                PenStreamDecoder::new(
                    PenScaling::from(capabilities.as_ref()),
                    Arc::clone(&self.pen_subscribers),
                )
                .spawn(reports),
            ),
            None => {
                warn!("device exposes no input report stream, pen samples disabled");
                None
            }
        };

        self.set_state(ConnectionState::Ready);
        info!(
            device = capabilities.device_name(),
            firmware = %capabilities.firmware(),
            serial = capabilities.serial(),
            screen_width = capabilities.screen_width(),
            screen_height = capabilities.screen_height(),
            scale_factor = capabilities.scale_factor(),
            "signature pad ready"
        );
        Ok(capabilities)
    }

    /// Read `capability`, `information` and `eSerial` without interleaving.
    async fn negotiate(&self) -> DriverResult<DeviceCapabilities> {
        let mut guard = self.channel.lock().await?;
        let capability = parse_capability_report(&guard.read(Command::Capability).await?)?;
        let information = parse_information_report(&guard.read(Command::Information).await?)?;
        let serial = parse_serial_report(&guard.read(Command::ESerial).await?)?;
        Ok(DeviceCapabilities::negotiate(capability, information, serial)?)
    }

    /// Detach and close the handle, if any.
    async fn release(&self) {
        if let Some(device) = self.channel.detach().await {
            close_handle(device).await;
        }
    }

    /// Tear down the connection. Safe to call in any state.
    pub async fn disconnect(&self) {
        // fail in-flight requests before queueing on the lifecycle lock
        self.channel.close();
        let mut pen_task = self.lifecycle.lock().await;

        if let Some(task) = pen_task.take() {
            task.stop();
        }
        self.release().await;
        self.cache.clear();

        if self.set_state(ConnectionState::Disconnected) != ConnectionState::Disconnected {
            info!("signature pad disconnected");
        }
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("filter", &self.filter)
            .field("state", &self.state())
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}

async fn close_handle(mut device: Box<dyn FeatureReportDevice>) {
    let name = device.info().display_name();
    match device.close().await {
        Ok(()) => debug!(device = %name, "device handle closed"),
        Err(e) => warn!(device = %name, error = %e, "failed to close device handle"),
    }
}
