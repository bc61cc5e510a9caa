//! Static device classification consumed by the tuning policy.

use kinesis_config::{DeviceConfig, DeviceSetting};

/// Broad hardware class of the host device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    /// Desktop or laptop with a dedicated frame budget.
    Desktop,
    /// Phone or tablet.
    Mobile,
}

/// Classification and capability flags reported by the platform layer.
///
/// `class` is `None` when the platform could not classify the device; the
/// tuning policy then falls back to its most conservative table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceProfile {
    /// Detected (or forced) device class.
    pub class: Option<DeviceClass>,
    /// Battery-saving mode is active.
    pub low_power: bool,
}

impl DeviceProfile {
    /// A desktop profile running at full power.
    pub fn desktop() -> Self {
        Self {
            class: Some(DeviceClass::Desktop),
            low_power: false,
        }
    }

    /// A mobile profile.
    pub fn mobile() -> Self {
        Self {
            class: Some(DeviceClass::Mobile),
            low_power: false,
        }
    }

    /// Combines the configured override with what the platform detected.
    ///
    /// `Auto` keeps the detected class, which may itself be unknown.
    pub fn from_config(config: &DeviceConfig, detected: Option<DeviceClass>) -> Self {
        let class = match config.class {
            DeviceSetting::Auto => detected,
            DeviceSetting::Desktop => Some(DeviceClass::Desktop),
            DeviceSetting::Mobile => Some(DeviceClass::Mobile),
        };
        Self {
            class,
            low_power: config.low_power,
        }
    }

    /// Whether this profile qualifies for the full desktop tuning table.
    pub fn is_full_power_desktop(&self) -> bool {
        self.class == Some(DeviceClass::Desktop) && !self.low_power
    }
}
