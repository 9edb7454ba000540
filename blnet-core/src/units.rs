//! Unit tables
//!
//! Two independent tables exist: the legacy binary protocol tags each analog
//! input with a 3-bit input type, the CMI JSON API references a numeric unit
//! code. The tables are not interchangeable.

use crate::error::{BlnetError, BlnetResult};

/// Unit string returned for tags the binary table does not know
pub const UNKNOWN_UNIT: &str = "unknown";

/// Binary input type table, indexed by `unit_bits >> 4`
///
/// Slots 4 and 5 are not used by the controllers.
pub const BINARY_UNITS: [Option<&str>; 8] = [
    Some(""),
    Some("digital"),
    Some("°C"),
    Some("l/h"),
    None,
    None,
    Some("W/m²"),
    Some("°C"),
];

/// Input type encoded in bits 4-6 of an analog input's high byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputType {
    /// Input not used
    Unused,
    /// Digital input
    Digital,
    /// Temperature in 0.1 °C
    Temperature,
    /// Volume flow in 4 l/h steps
    VolumeFlow,
    /// Solar radiation
    Radiation,
    /// Room sensor, temperature in the low 9 bits
    RoomSensor,
    /// Any other tag
    Other(u8),
}

impl InputType {
    /// Classify the tag extracted by [`crate::bits::decode_signed12`]
    pub fn from_unit_bits(unit_bits: u8) -> Self {
        match unit_bits & crate::bits::UNIT_MASK {
            0x00 => Self::Unused,
            0x10 => Self::Digital,
            0x20 => Self::Temperature,
            0x30 => Self::VolumeFlow,
            0x60 => Self::Radiation,
            0x70 => Self::RoomSensor,
            other => Self::Other(other),
        }
    }
}

/// Resolve a binary input tag to its unit string
///
/// Tags outside the table resolve to [`UNKNOWN_UNIT`].
pub fn binary_unit(unit_bits: u8) -> &'static str {
    BINARY_UNITS
        .get(usize::from(unit_bits >> 4))
        .copied()
        .flatten()
        .unwrap_or(UNKNOWN_UNIT)
}

/// CMI JSON API unit table, index = unit code
pub const CMI_UNITS: [&str; 77] = [
    "", "°C", "W/m²", "l/h", "sec", "min", "l/Imp", "K", "%", "", // 0-9
    "kW", "kWh", "MWh", "V", "mA", "hr", "Days", "Imp", "kΩ", "l", // 10-19
    "km/h", "Hz", "l/min", "bar", "", "km", "m", "mm", "m³", "", // 20-29
    "", "", "", "", "", "l/d", "m/s", "m³/min", "m³/h", "m³/d", // 30-39
    "mm/min", "mm/h", "mm/d", "ON/OFF", "NO/YES", "", "°C", "", "", "", // 40-49
    "€", "$", "g/m³", "", "°", "", "°", "sec", "", "%", // 50-59
    "h", "", "", "A", "", "mbar", "Pa", "ppm", "", "W", // 60-69
    "t", "kg", "g", "cm", "K", "lx", "Bg/m³", // 70-76
];

/// Resolve a CMI unit code
///
/// Codes come from the device itself, so a code outside the table means the
/// document is not understood and is reported as a decode error.
pub fn cmi_unit(code: u16) -> BlnetResult<&'static str> {
    CMI_UNITS
        .get(usize::from(code))
        .copied()
        .ok_or_else(|| BlnetError::UnknownUnit(code.to_string()))
}

/// Resolve a CMI unit code given as text, as the JSON API sends it
pub fn cmi_unit_str(code: &str) -> BlnetResult<&'static str> {
    let parsed = code
        .trim()
        .parse::<u16>()
        .map_err(|_| BlnetError::UnknownUnit(code.to_string()))?;
    cmi_unit(parsed)
}
