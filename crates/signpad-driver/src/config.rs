//! Driver configuration: device identity and upload tuning.

use crate::error::{DriverError, DriverResult};
use serde::{Deserialize, Serialize};
use signpad_hid_common::DeviceFilter;
use signpad_hid_stu_protocol::{
    DEFAULT_CHUNK_SIZE, IMAGE_FORMAT_24BPP_BGR, ImageFormat, WACOM_VENDOR_ID, product_ids,
    validate_chunk_size,
};
use std::path::Path;
use tracing::debug;

/// Driver configuration.
///
/// Missing fields take their defaults, which target the STU-540.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DriverConfig {
    /// USB vendor id the driver accepts.
    pub vendor_id: u16,
    /// USB product id the driver accepts.
    pub product_id: u16,
    /// Bytes per `writeImageData` report (1..=253).
    pub chunk_size: usize,
    /// Format code sent in `writeImageStart`.
    pub image_format: u8,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            vendor_id: WACOM_VENDOR_ID,
            product_id: product_ids::STU_540,
            chunk_size: DEFAULT_CHUNK_SIZE,
            image_format: IMAGE_FORMAT_24BPP_BGR,
        }
    }
}

impl DriverConfig {
    pub fn from_yaml_str(content: &str) -> DriverResult<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| DriverError::InvalidConfig(format!("YAML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> DriverResult<Self> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| DriverError::InvalidConfig(format!("JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.yaml`/`.yml` or `.json` file.
    pub async fn load_from_path<P: AsRef<Path>>(path: P) -> DriverResult<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            DriverError::InvalidConfig(format!("failed to read {}: {e}", path.display()))
        })?;

        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content)?,
            Some("yaml" | "yml") => Self::from_yaml_str(&content)?,
            other => {
                return Err(DriverError::InvalidConfig(format!(
                    "unsupported config extension {other:?} for {}",
                    path.display()
                )));
            }
        };

        debug!(path = %path.display(), "Loaded driver config");
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> DriverResult<String> {
        serde_yaml::to_string(self).map_err(|e| DriverError::InvalidConfig(format!("YAML: {e}")))
    }

    pub fn validate(&self) -> DriverResult<()> {
        if self.vendor_id == 0 || self.product_id == 0 {
            return Err(DriverError::InvalidConfig(format!(
                "device identity {:04x}:{:04x} must be non-zero",
                self.vendor_id, self.product_id
            )));
        }
        validate_chunk_size(self.chunk_size)?;
        self.format()?;
        Ok(())
    }

    pub fn device_filter(&self) -> DeviceFilter {
        DeviceFilter::new(self.vendor_id, self.product_id)
    }

    pub fn format(&self) -> DriverResult<ImageFormat> {
        ImageFormat::from_code(self.image_format).ok_or_else(|| {
            DriverError::InvalidConfig(format!("unknown image format 0x{:02X}", self.image_format))
        })
    }
}
