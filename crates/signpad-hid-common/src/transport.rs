//! Transport port traits
//!
//! A driver never talks to an OS HID stack directly. It consumes a
//! [`HidHost`] for discovery, access and hotplug, and a
//! [`FeatureReportDevice`] per opened handle for feature-report I/O and the
//! unsolicited input-report stream.

use crate::{DeviceFilter, HidCommonResult, HidDeviceInfo};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Unsolicited input report pushed by the device.
///
/// `data` excludes the report id byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputReport {
    pub report_id: u8,
    pub data: Vec<u8>,
}

impl InputReport {
    pub fn new(report_id: u8, data: impl Into<Vec<u8>>) -> Self {
        Self {
            report_id,
            data: data.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HotplugKind {
    Connect,
    Disconnect,
}

impl HotplugKind {
    pub fn as_str(self) -> &'static str {
        match self {
            HotplugKind::Connect => "connect",
            HotplugKind::Disconnect => "disconnect",
        }
    }
}

impl std::fmt::Display for HotplugKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Host-level connect/disconnect notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotplugEvent {
    pub kind: HotplugKind,
    pub device: HidDeviceInfo,
}

impl HotplugEvent {
    pub fn connect(device: HidDeviceInfo) -> Self {
        Self {
            kind: HotplugKind::Connect,
            device,
        }
    }

    pub fn disconnect(device: HidDeviceInfo) -> Self {
        Self {
            kind: HotplugKind::Disconnect,
            device,
        }
    }
}

/// An opened HID handle.
///
/// Feature-report responses include the report id at byte 0. Implementations
/// are not required to serialize concurrent calls; callers must keep at most
/// one request in flight.
#[async_trait]
pub trait FeatureReportDevice: Send + Sync {
    async fn send_feature_report(&self, report_id: u8, data: &[u8]) -> HidCommonResult<()>;

    /// Returns `Ok(None)` when the device produced no data for `report_id`.
    async fn receive_feature_report(&self, report_id: u8) -> HidCommonResult<Option<Vec<u8>>>;

    /// Hand over the input-report stream. Yields `Some` at most once per handle.
    fn take_input_reports(&mut self) -> Option<mpsc::Receiver<InputReport>>;

    fn info(&self) -> &HidDeviceInfo;

    async fn close(&mut self) -> HidCommonResult<()>;
}

/// Discovery, access and hotplug for the host HID stack.
#[async_trait]
pub trait HidHost: Send + Sync {
    /// Devices the host has already granted access to. Never prompts.
    async fn granted_devices(&self) -> HidCommonResult<Vec<HidDeviceInfo>>;

    /// Ask the host (or user) for access to a device matching `filter`.
    ///
    /// `Ok(None)` means nothing was selected.
    async fn request_device(&self, filter: &DeviceFilter)
    -> HidCommonResult<Option<HidDeviceInfo>>;

    async fn open_device(
        &self,
        info: &HidDeviceInfo,
    ) -> HidCommonResult<Box<dyn FeatureReportDevice>>;

    /// Subscribe to connect/disconnect notifications for all devices.
    async fn monitor_devices(&self) -> HidCommonResult<mpsc::Receiver<HotplugEvent>>;
}

pub mod mock {
    //! In-memory transport with a feature-report store and fault injection.
    //!
    //! Written feature reports are echoed back on the next read of the same
    //! id (`[report_id, payload..]`), which mimics the persistent settings
    //! reports of the real device.

    use super::*;
    use crate::HidCommonError;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    const INPUT_QUEUE_DEPTH: usize = 64;

    #[derive(Debug, Clone, Copy)]
    struct WriteFault {
        report_id: u8,
        occurrence: usize,
    }

    #[derive(Default)]
    struct DeviceState {
        feature_reports: HashMap<u8, Vec<u8>>,
        writes: Vec<(u8, Vec<u8>)>,
        reads: Vec<u8>,
        write_counts: HashMap<u8, usize>,
        write_fault: Option<WriteFault>,
        hang_reads: bool,
        granted: bool,
        open: bool,
        unplugged: bool,
        input_tx: Option<mpsc::Sender<InputReport>>,
    }

    /// Test-side handle to a simulated device.
    ///
    /// Clones share state, so a test keeps one handle while the driver owns
    /// the handle returned from [`MockHidHost::open_device`].
    #[derive(Clone)]
    pub struct MockFeatureDevice {
        info: HidDeviceInfo,
        state: Arc<Mutex<DeviceState>>,
        input_rx: Arc<Mutex<Option<mpsc::Receiver<InputReport>>>>,
    }

    impl MockFeatureDevice {
        pub fn new(vendor_id: u16, product_id: u16, path: impl Into<String>) -> Self {
            Self {
                info: HidDeviceInfo::new(vendor_id, product_id, path),
                state: Arc::new(Mutex::new(DeviceState::default())),
                input_rx: Arc::new(Mutex::new(None)),
            }
        }

        fn lock(&self) -> parking_lot::MutexGuard<'_, DeviceState> {
            self.state.lock()
        }

        /// Set the full response (report id included) for a feature report.
        pub fn set_feature_report(&self, report_id: u8, response: Vec<u8>) {
            self.lock().feature_reports.insert(report_id, response);
        }

        pub fn clear_feature_report(&self, report_id: u8) {
            self.lock().feature_reports.remove(&report_id);
        }

        /// Fail the `occurrence`-th write (1-based) of `report_id`.
        pub fn fail_write(&self, report_id: u8, occurrence: usize) {
            self.lock().write_fault = Some(WriteFault {
                report_id,
                occurrence,
            });
        }

        /// Make every feature-report read wait forever.
        pub fn hang_reads(&self, hang: bool) {
            self.lock().hang_reads = hang;
        }

        pub fn grant(&self) {
            self.lock().granted = true;
        }

        /// Simulate physical removal: further I/O fails with `Disconnected`.
        pub fn unplug(&self) {
            self.lock().unplugged = true;
        }

        pub fn is_open(&self) -> bool {
            self.lock().open
        }

        pub fn write_history(&self) -> Vec<(u8, Vec<u8>)> {
            self.lock().writes.clone()
        }

        pub fn written_report_ids(&self) -> Vec<u8> {
            self.lock().writes.iter().map(|(id, _)| *id).collect()
        }

        pub fn read_history(&self) -> Vec<u8> {
            self.lock().reads.clone()
        }

        pub fn clear_history(&self) {
            let mut state = self.lock();
            state.writes.clear();
            state.reads.clear();
        }

        /// Push an input report to the opened handle's stream.
        pub async fn push_input_report(&self, report: InputReport) -> HidCommonResult<()> {
            let sender = self.lock().input_tx.clone();
            match sender {
                Some(tx) => tx
                    .send(report)
                    .await
                    .map_err(|_| HidCommonError::Disconnected),
                None => Err(HidCommonError::Disconnected),
            }
        }

        pub fn info(&self) -> &HidDeviceInfo {
            &self.info
        }

        fn open_handle(&self) -> Box<dyn FeatureReportDevice> {
            let (tx, rx) = mpsc::channel(INPUT_QUEUE_DEPTH);
            {
                let mut state = self.lock();
                state.open = true;
                state.input_tx = Some(tx);
            }
            *self.input_rx.lock() = Some(rx);
            Box::new(self.clone())
        }

        fn check_io(state: &DeviceState) -> HidCommonResult<()> {
            if state.unplugged || !state.open {
                return Err(HidCommonError::Disconnected);
            }
            Ok(())
        }
    }

    #[async_trait]
    impl FeatureReportDevice for MockFeatureDevice {
        async fn send_feature_report(&self, report_id: u8, data: &[u8]) -> HidCommonResult<()> {
            let mut state = self.lock();
            Self::check_io(&state)?;

            state.writes.push((report_id, data.to_vec()));
            let count = state.write_counts.entry(report_id).or_insert(0);
            *count = count.saturating_add(1);
            let count = *count;

            let faulted = state
                .write_fault
                .is_some_and(|fault| fault.report_id == report_id && fault.occurrence == count);
            if faulted {
                return Err(HidCommonError::WriteError(format!(
                    "injected failure on report 0x{report_id:02X} write #{count}"
                )));
            }

            let mut stored = Vec::with_capacity(data.len().saturating_add(1));
            stored.push(report_id);
            stored.extend_from_slice(data);
            state.feature_reports.insert(report_id, stored);
            Ok(())
        }

        async fn receive_feature_report(&self, report_id: u8) -> HidCommonResult<Option<Vec<u8>>> {
            let hang = {
                let mut state = self.lock();
                Self::check_io(&state)?;
                state.reads.push(report_id);
                state.hang_reads
            };
            if hang {
                std::future::pending::<()>().await;
            }
            Ok(self.lock().feature_reports.get(&report_id).cloned())
        }

        fn take_input_reports(&mut self) -> Option<mpsc::Receiver<InputReport>> {
            self.input_rx.lock().take()
        }

        fn info(&self) -> &HidDeviceInfo {
            &self.info
        }

        async fn close(&mut self) -> HidCommonResult<()> {
            let mut state = self.lock();
            state.open = false;
            state.input_tx = None;
            Ok(())
        }
    }

    #[derive(Default)]
    struct HostState {
        devices: Vec<MockFeatureDevice>,
        deny_requests: bool,
        fail_open: Option<String>,
        open_count: usize,
        monitors: Vec<mpsc::Sender<HotplugEvent>>,
    }

    /// Simulated host HID stack.
    #[derive(Clone, Default)]
    pub struct MockHidHost {
        state: Arc<Mutex<HostState>>,
    }

    impl MockHidHost {
        pub fn new() -> Self {
            Self::default()
        }

        fn lock(&self) -> parking_lot::MutexGuard<'_, HostState> {
            self.state.lock()
        }

        pub fn add_device(&self, device: MockFeatureDevice) {
            self.lock().devices.push(device);
        }

        /// Simulate the user dismissing the access prompt.
        pub fn deny_requests(&self, deny: bool) {
            self.lock().deny_requests = deny;
        }

        pub fn fail_open(&self, reason: impl Into<String>) {
            self.lock().fail_open = Some(reason.into());
        }

        pub fn open_count(&self) -> usize {
            self.lock().open_count
        }

        /// Broadcast a hotplug event to every monitor.
        pub async fn emit_hotplug(&self, event: HotplugEvent) {
            let monitors = self.lock().monitors.clone();
            for monitor in monitors {
                if monitor.send(event.clone()).await.is_err() {
                    tracing::trace!("hotplug monitor dropped");
                }
            }
        }
    }

    #[async_trait]
    impl HidHost for MockHidHost {
        async fn granted_devices(&self) -> HidCommonResult<Vec<HidDeviceInfo>> {
            Ok(self
                .lock()
                .devices
                .iter()
                .filter(|d| d.lock().granted)
                .map(|d| d.info.clone())
                .collect())
        }

        async fn request_device(
            &self,
            filter: &DeviceFilter,
        ) -> HidCommonResult<Option<HidDeviceInfo>> {
            let state = self.lock();
            if state.deny_requests {
                return Ok(None);
            }
            let selected = state.devices.iter().find(|d| filter.matches(&d.info));
            Ok(selected.map(|device| {
                device.grant();
                device.info.clone()
            }))
        }

        async fn open_device(
            &self,
            info: &HidDeviceInfo,
        ) -> HidCommonResult<Box<dyn FeatureReportDevice>> {
            let mut state = self.lock();
            if let Some(reason) = state.fail_open.clone() {
                return Err(HidCommonError::OpenError(reason));
            }
            let device = state
                .devices
                .iter()
                .find(|d| d.info.path == info.path)
                .cloned()
                .ok_or_else(|| HidCommonError::DeviceNotFound(info.path.clone()))?;
            state.open_count = state.open_count.saturating_add(1);
            Ok(device.open_handle())
        }

        async fn monitor_devices(&self) -> HidCommonResult<mpsc::Receiver<HotplugEvent>> {
            let (tx, rx) = mpsc::channel(INPUT_QUEUE_DEPTH);
            self.lock().monitors.push(tx);
            Ok(rx)
        }
    }
}
