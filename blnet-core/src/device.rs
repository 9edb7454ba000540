//! Logger modes, controller types and device identification tables

use crate::error::{BlnetError, BlnetResult};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Maximum number of data frames a logger can declare
pub const MAX_FRAMES: u8 = 8;

/// Transmission mode of a BL-NET/D-LOGG, taken from byte 1 of the header frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LoggerMode {
    /// 0xA8: one controller on the DL bus
    SingleLogger,
    /// 0xD1: two controllers on the DL bus
    DualLogger,
    /// 0xDC: up to eight CAN data frames
    CanMulti,
}

impl LoggerMode {
    pub const SINGLE_ID: u8 = 0xA8;
    pub const DUAL_ID: u8 = 0xD1;
    pub const CAN_ID: u8 = 0xDC;

    /// Create from the mode identifier byte
    pub fn from_byte(byte: u8) -> BlnetResult<Self> {
        match byte {
            Self::SINGLE_ID => Ok(Self::SingleLogger),
            Self::DUAL_ID => Ok(Self::DualLogger),
            Self::CAN_ID => Ok(Self::CanMulti),
            other => Err(BlnetError::UnknownMode(other)),
        }
    }

    /// Short label as shown by the vendor tools ("1DL", "2DL", "3CAN")
    pub fn label(self, frame_count: u8) -> String {
        match self {
            Self::SingleLogger => "1DL".to_string(),
            Self::DualLogger => "2DL".to_string(),
            Self::CanMulti => format!("{}CAN", frame_count),
        }
    }
}

/// Controller model behind a data frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DeviceType {
    /// UVR61-3, 25-byte frame
    Uvr61_3,
    /// UVR1611, 56-byte frame
    Uvr1611,
    /// Unrecognized type code
    Unknown(u8),
}

impl DeviceType {
    pub const UVR61_3_CODE: u8 = 0x5A;
    pub const UVR1611_CODE: u8 = 0x76;

    /// Create from a header type code
    pub fn from_code(code: u8) -> Self {
        match code {
            Self::UVR61_3_CODE => Self::Uvr61_3,
            Self::UVR1611_CODE => Self::Uvr1611,
            other => Self::Unknown(other),
        }
    }

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uvr61_3 => "UVR61-3",
            Self::Uvr1611 => "UVR1611",
            Self::Unknown(_) => "Unknown",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolve a header type code to a controller name
pub fn uvr_type_name(code: u8) -> &'static str {
    DeviceType::from_code(code).name()
}

/// Device identification of a BL-NET/D-LOGG
///
/// Built once per successful initialization and left untouched until the
/// logger is initialized again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceHeader {
    pub mode: LoggerMode,
    /// Number of data frames a poll cycle reads (1..=8)
    pub frame_count: u8,
    /// Raw type code per frame, in frame order
    pub device_type_codes: Vec<u8>,
    /// Module id as `0x` followed by upper-case hex
    pub module_id: String,
    /// Firmware version as decimal string
    pub firmware_version: String,
    /// Transmission mode as upper-case hex
    pub transmission_mode: String,
}

impl DeviceHeader {
    /// Controller type of a frame, 1-based as on the wire
    pub fn device_type(&self, frame_index: u8) -> DeviceType {
        frame_index
            .checked_sub(1)
            .and_then(|i| self.device_type_codes.get(usize::from(i)))
            .map(|code| DeviceType::from_code(*code))
            .unwrap_or(DeviceType::Unknown(0))
    }

    /// Controller types of all frames
    pub fn device_types(&self) -> Vec<DeviceType> {
        self.device_type_codes
            .iter()
            .map(|code| DeviceType::from_code(*code))
            .collect()
    }

    /// Frame indices a full poll cycle has to read
    pub fn frame_indices(&self) -> std::ops::RangeInclusive<u8> {
        1..=self.frame_count
    }
}

/// Flat key/value description of the polled device, handed to the sink
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    fields: BTreeMap<String, String>,
}

impl DeviceInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<&DeviceHeader> for DeviceInfo {
    fn from(header: &DeviceHeader) -> Self {
        let mut info = DeviceInfo::new()
            .with("uvr_mode", header.mode.label(header.frame_count))
            .with("module_id", header.module_id.clone())
            .with("firmware_version", header.firmware_version.clone())
            .with("transmission_mode", header.transmission_mode.clone());
        for (i, device) in header.device_types().iter().enumerate() {
            let key = if i == 0 {
                "uvr_type".to_string()
            } else {
                format!("uvr{}_type", i + 1)
            };
            info.fields.insert(key, device.name().to_string());
        }
        info
    }
}

/// CMI `Header.Device` codes
static CMI_DEVICES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("7F", "CoE"),
        ("80", "UVR1611"),
        ("81", "CAN-MT"),
        ("82", "CAN-I/O44"),
        ("83", "CAN-I/O35"),
        ("84", "CAN-BC"),
        ("85", "CAN-EZ"),
        ("86", "CAN-TOUCH"),
        ("87", "UVR16x2"),
        ("88", "RSM610"),
        ("89", "CAN-I/O45"),
        ("8A", "CMI"),
        ("8B", "CAN-EZ2"),
        ("8C", "CAN-MTx2"),
        ("8D", "CAN-BC2"),
        ("8E", "UVR65"),
        ("8F", "CAN-EZ3"),
        ("91", "UVR610"),
        ("92", "UVR67"),
        ("A3", "BL-NET"),
    ])
});

/// Resolve a CMI device code; unknown codes resolve to "Unknown"
pub fn cmi_device_name(code: &str) -> &'static str {
    CMI_DEVICES
        .get(code.trim().to_ascii_uppercase().as_str())
        .copied()
        .unwrap_or("Unknown")
}
