//! Shared fixtures for driver integration tests.

#![expect(dead_code, reason = "each test binary uses a different subset of the fixtures")]

use signpad_driver::{DriverConfig, DriverError, SignaturePad};
use signpad_hid_common::mock::{MockFeatureDevice, MockHidHost};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// 10800 x 6480 tablet units, pressure 1023, 800 x 480 screen, 60 Hz.
pub const CAPABILITY: [u8; 12] = [
    0x09, 0x30, 0x2A, 0x50, 0x19, 0xFF, 0x03, 0x20, 0x03, 0xE0, 0x01, 0x3C,
];
pub const INFORMATION: [u8; 12] = [
    0x08, b'S', b'T', b'U', b'-', b'5', b'4', b'0', 1, 2, 0, 15,
];
pub const SCREEN_BYTES: usize = 800 * 480 * 3;

/// Install a test-writer subscriber once; `RUST_LOG` overrides the filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("signpad_driver=debug"));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
    if installed.is_err() {
        tracing::trace!("tracing subscriber already installed");
    }
}

/// A simulated STU-540 with negotiation reports and settings populated.
pub fn stu_540() -> MockFeatureDevice {
    let device = MockFeatureDevice::new(0x056A, 0x00A8, "mock://stu-540");
    device.set_feature_report(0x09, CAPABILITY.to_vec());
    device.set_feature_report(0x08, INFORMATION.to_vec());
    device.set_feature_report(0x0F, b"\x0F4GB0012345\0\0".to_vec());
    device.set_feature_report(0x2B, vec![0x2B, 2, 0]);
    device.set_feature_report(0x2E, vec![0x2E, 0xFF, 0xFF, 0xFF]);
    device
}

pub struct Fixture {
    pub host: MockHidHost,
    pub device: MockFeatureDevice,
    pub pad: Arc<SignaturePad>,
}

/// A pad created against a host holding one STU-540, not yet connected.
pub async fn fixture() -> Result<Fixture, DriverError> {
    init_tracing();
    let host = MockHidHost::new();
    let device = stu_540();
    host.add_device(device.clone());
    let pad = SignaturePad::new(Arc::new(host.clone()), DriverConfig::default()).await?;
    Ok(Fixture {
        host,
        device,
        pad: Arc::new(pad),
    })
}

/// Like [`fixture`], connected, with negotiation reads cleared from history.
pub async fn connected() -> Result<Fixture, DriverError> {
    let fixture = fixture().await?;
    fixture.pad.connect().await?;
    fixture.device.clear_history();
    Ok(fixture)
}

pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// A subscriber callback that forwards clones into a channel.
pub fn sink<T>() -> (
    impl Fn(&T) + Send + Sync + 'static,
    mpsc::UnboundedReceiver<T>,
)
where
    T: Clone + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let callback = move |item: &T| {
        if tx.send(item.clone()).is_err() {
            tracing::trace!("test receiver dropped");
        }
    };
    (callback, rx)
}

/// Next item from a sink, failing after one second.
pub async fn next<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> TestResult<T> {
    let item = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await?;
    Ok(item.ok_or("subscriber channel closed")?)
}
