//! Pen stream decoding task.

use crate::subscribers::SubscriberList;
use crate::task::BackgroundTask;
use signpad_hid_common::InputReport;
use signpad_hid_stu_protocol::{PenSample, PenScaling, decode_input_report};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

/// Decodes input reports with a fixed scaling snapshot and fans samples out
/// to subscribers.
#[derive(Debug, Clone)]
pub struct PenStreamDecoder {
    scaling: PenScaling,
    subscribers: Arc<SubscriberList<PenSample>>,
}

impl PenStreamDecoder {
    pub fn new(scaling: PenScaling, subscribers: Arc<SubscriberList<PenSample>>) -> Self {
        Self {
            scaling,
            subscribers,
        }
    }

    /// Decode one report and deliver it.
    ///
    /// Non-pen reports are skipped silently; short pen reports are skipped
    /// with a warning.
    pub fn handle(&self, report: &InputReport) -> Option<PenSample> {
        match decode_input_report(report.report_id, &report.data, &self.scaling) {
            Ok(Some(sample)) => {
                self.subscribers.publish(&sample);
                Some(sample)
            }
            Ok(None) => {
                trace!(report_id = report.report_id, "ignoring non-pen input report");
                None
            }
            Err(e) => {
                warn!(report_id = report.report_id, error = %e, "dropping malformed pen report");
                None
            }
        }
    }

    /// Drain `reports` on a new task until the stream ends or the returned
    /// handle is stopped.
    pub fn spawn(self, mut reports: mpsc::Receiver<InputReport>) -> BackgroundTask {
        BackgroundTask::spawn("pen-stream", async move {
            debug!(
                scale_factor = self.scaling.scale_factor(),
                pressure_factor = self.scaling.pressure_factor(),
                "pen stream started"
            );
            while let Some(report) = reports.recv().await {
                self.handle(&report);
            }
            debug!("pen stream ended");
        })
    }
}
