//! FIFO-serialized feature-report I/O.
//!
//! Every device command goes through one [`FeatureChannel`]. Requests are
//! serialized by a fair `tokio` mutex, and a `watch` close signal is raced
//! against each transport call so that [`FeatureChannel::detach`] fails
//! in-flight and queued requests with [`DriverError::NotConnected`].

use crate::error::{DriverError, DriverResult};
use signpad_hid_common::FeatureReportDevice;
use signpad_hid_stu_protocol::Command;
use tokio::sync::{Mutex, MutexGuard, watch};
use tracing::{debug, trace, warn};

type DeviceSlot = Option<Box<dyn FeatureReportDevice>>;

pub struct FeatureChannel {
    device: Mutex<DeviceSlot>,
    closed: watch::Sender<bool>,
}

/// Resolves once the channel is closed (or the signal is gone).
async fn wait_closed(closed: &mut watch::Receiver<bool>) {
    if closed.wait_for(|is_closed| *is_closed).await.is_err() {
        trace!("close signal dropped");
    }
}

impl FeatureChannel {
    pub fn new() -> Self {
        let (closed, _) = watch::channel(true);
        Self {
            device: Mutex::new(None),
            closed,
        }
    }

    /// Install an opened handle and reopen the channel.
    ///
    /// Returns the previously attached handle, if any, so the caller can
    /// close it.
    pub async fn attach(&self, device: Box<dyn FeatureReportDevice>) -> DeviceSlot {
        let mut slot = self.device.lock().await;
        let previous = slot.replace(device);
        self.closed.send_replace(false);
        debug!("feature channel attached");
        previous
    }

    /// Close the channel and take the handle out of it.
    ///
    /// The close signal is raised before waiting for the slot, so a request
    /// stuck on the transport is abandoned instead of blocking the detach.
    pub async fn detach(&self) -> DeviceSlot {
        self.close();
        let device = self.device.lock().await.take();
        if device.is_some() {
            debug!("feature channel detached");
        }
        device
    }

    /// Raise the close signal without touching the slot.
    ///
    /// Requests fail with `NotConnected` until the next [`Self::attach`].
    pub fn close(&self) {
        self.closed.send_replace(true);
    }

    pub fn is_open(&self) -> bool {
        !*self.closed.borrow()
    }

    /// Wait for exclusive use of the channel.
    ///
    /// Hold the guard to run multi-step sequences without interleaving.
    pub async fn lock(&self) -> DriverResult<ChannelGuard<'_>> {
        let mut closed = self.closed.subscribe();
        if *closed.borrow_and_update() {
            return Err(DriverError::NotConnected);
        }

        let device = tokio::select! {
            biased;
            () = wait_closed(&mut closed) => return Err(DriverError::NotConnected),
            device = self.device.lock() => device,
        };
        if device.is_none() || *closed.borrow() {
            return Err(DriverError::NotConnected);
        }
        Ok(ChannelGuard { device, closed })
    }

    pub async fn send(&self, command: Command, payload: &[u8]) -> DriverResult<()> {
        self.lock().await?.send(command, payload).await
    }

    pub async fn read(&self, command: Command) -> DriverResult<Vec<u8>> {
        self.lock().await?.read(command).await
    }
}

impl Default for FeatureChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FeatureChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureChannel")
            .field("open", &self.is_open())
            .finish()
    }
}

/// Exclusive access to the attached handle.
pub struct ChannelGuard<'a> {
    device: MutexGuard<'a, DeviceSlot>,
    closed: watch::Receiver<bool>,
}

impl ChannelGuard<'_> {
    /// Write one feature report. No retry.
    pub async fn send(&mut self, command: Command, payload: &[u8]) -> DriverResult<()> {
        let report_id = command.report_id();
        let Self { device, closed } = self;
        let device = device.as_deref().ok_or(DriverError::NotConnected)?;
        if *closed.borrow() {
            return Err(DriverError::NotConnected);
        }

        trace!(%command, len = payload.len(), "send feature report");
        tokio::select! {
            biased;
            () = wait_closed(closed) => Err(DriverError::NotConnected),
            result = device.send_feature_report(report_id, payload) => {
                result.map_err(|e| DriverError::TransportWriteFailed {
                    report_id,
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Read one feature report. The returned buffer starts with the report id.
    pub async fn read(&mut self, command: Command) -> DriverResult<Vec<u8>> {
        let report_id = command.report_id();
        let Self { device, closed } = self;
        let device = device.as_deref().ok_or(DriverError::NotConnected)?;
        if *closed.borrow() {
            return Err(DriverError::NotConnected);
        }

        trace!(%command, "read feature report");
        let result = tokio::select! {
            biased;
            () = wait_closed(closed) => return Err(DriverError::NotConnected),
            result = device.receive_feature_report(report_id) => result,
        };

        match result {
            Ok(Some(buffer)) => Ok(buffer),
            Ok(None) => {
                debug!(%command, "device returned no data");
                Err(DriverError::NoResponse { report_id })
            }
            Err(e) => {
                warn!(%command, error = %e, "feature report read failed");
                Err(DriverError::NoResponse { report_id })
            }
        }
    }
}
