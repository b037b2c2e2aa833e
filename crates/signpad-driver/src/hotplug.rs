//! Forwards host hotplug notifications for the configured device identity.

use crate::subscribers::SubscriberList;
use crate::task::BackgroundTask;
use signpad_hid_common::{DeviceFilter, HotplugEvent};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, trace};

#[derive(Debug, Clone)]
pub struct HotplugDispatcher {
    filter: DeviceFilter,
    subscribers: Arc<SubscriberList<HotplugEvent>>,
}

impl HotplugDispatcher {
    pub fn new(filter: DeviceFilter, subscribers: Arc<SubscriberList<HotplugEvent>>) -> Self {
        Self {
            filter,
            subscribers,
        }
    }

    /// Forward `event` if it concerns the configured device.
    ///
    /// Returns `true` when the event matched.
    pub fn dispatch(&self, event: &HotplugEvent) -> bool {
        if !self.filter.matches(&event.device) {
            trace!(
                kind = %event.kind,
                device = %event.device.display_name(),
                "ignoring hotplug event for other device"
            );
            return false;
        }

        info!(
            kind = %event.kind,
            device = %event.device.display_name(),
            path = %event.device.path,
            "signature pad hotplug"
        );
        let delivered = self.subscribers.publish(event);
        debug!(delivered, "hotplug event forwarded");
        true
    }

    /// Dispatch every event from `events` on a new task.
    pub fn spawn(self, mut events: mpsc::Receiver<HotplugEvent>) -> BackgroundTask {
        BackgroundTask::spawn("hotplug", async move {
            debug!(filter = %self.filter, "hotplug monitor started");
            while let Some(event) = events.recv().await {
                self.dispatch(&event);
            }
            debug!("hotplug monitor ended");
        })
    }
}
