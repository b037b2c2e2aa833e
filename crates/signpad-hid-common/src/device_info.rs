//! Device identity types for HID devices

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HidDeviceInfo {
    pub vendor_id: u16,
    pub product_id: u16,
    pub serial_number: Option<String>,
    pub manufacturer: Option<String>,
    pub product_name: Option<String>,
    pub path: String,
}

impl HidDeviceInfo {
    pub fn new(vendor_id: u16, product_id: u16, path: impl Into<String>) -> Self {
        Self {
            vendor_id,
            product_id,
            serial_number: None,
            manufacturer: None,
            product_name: None,
            path: path.into(),
        }
    }

    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.serial_number = Some(serial.into());
        self
    }

    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    pub fn with_product_name(mut self, name: impl Into<String>) -> Self {
        self.product_name = Some(name.into());
        self
    }

    pub fn matches(&self, vendor_id: u16, product_id: u16) -> bool {
        self.vendor_id == vendor_id && self.product_id == product_id
    }

    pub fn display_name(&self) -> String {
        self.product_name
            .clone()
            .or_else(|| self.manufacturer.clone())
            .unwrap_or_else(|| format!("{:04x}:{:04x}", self.vendor_id, self.product_id))
    }
}

/// Vendor/product identity used to select and filter devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceFilter {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl DeviceFilter {
    pub const fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
        }
    }

    pub fn matches(&self, info: &HidDeviceInfo) -> bool {
        info.matches(self.vendor_id, self.product_id)
    }
}

impl std::fmt::Display for DeviceFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor_id, self.product_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_info_creation() {
        let info = HidDeviceInfo::new(0x056A, 0x00A8, "/dev/hidraw0");
        assert_eq!(info.vendor_id, 0x056A);
        assert_eq!(info.product_id, 0x00A8);
        assert!(info.matches(0x056A, 0x00A8));
        assert!(!info.matches(0x056A, 0x00A9));
    }

    #[test]
    fn test_device_info_display_name() {
        let info =
            HidDeviceInfo::new(0x056A, 0x00A8, "/dev/hidraw0").with_product_name("STU-540");
        assert_eq!(info.display_name(), "STU-540");

        let info = HidDeviceInfo::new(0x056A, 0x00A8, "/dev/hidraw0").with_manufacturer("Wacom");
        assert_eq!(info.display_name(), "Wacom");

        let info = HidDeviceInfo::new(0x056A, 0x00A8, "/dev/hidraw0");
        assert_eq!(info.display_name(), "056a:00a8");
    }

    #[test]
    fn test_filter_matches_identity_only() {
        let filter = DeviceFilter::new(0x056A, 0x00A8);
        let info = HidDeviceInfo::new(0x056A, 0x00A8, "a").with_serial("123");
        assert!(filter.matches(&info));
        assert!(!filter.matches(&HidDeviceInfo::new(0x046D, 0x00A8, "b")));
        assert_eq!(filter.to_string(), "056a:00a8");
    }
}
