//! CMI JSON document decoder
//!
//! A response looks like
//!
//! ```json
//! {
//!   "Header": {"Version": 5, "Device": "87", "Timestamp": 1630000000},
//!   "Data": {"Inputs": [{"Number": 1, "AD": "A", "Value": {"Value": 21.4, "Unit": "1"}}]},
//!   "Status": "OK",
//!   "Status code": 0
//! }
//! ```
//!
//! Sections are free-form: every array under `Data` is decoded into the
//! record's section map, `Inputs` and `Outputs` are additionally projected
//! onto the analog inputs and outputs.

use blnet_core::device::cmi_device_name;
use blnet_core::units::{cmi_unit, cmi_unit_str};
use blnet_core::{BlnetError, BlnetResult, CmiStatus, DeviceInfo, Measurement, SensorRecord};
use serde::Deserialize;
use serde_json::{Map, Value};

pub const INPUTS_SECTION: &str = "Inputs";
pub const OUTPUTS_SECTION: &str = "Outputs";

/// `jsonparam` section codes and the `Data` keys they select
pub const SECTION_CODES: &[(&str, &str)] = &[
    ("I", "Inputs"),
    ("O", "Outputs"),
    ("D", "DL-Bus"),
    ("Sg", "General"),
    ("Sd", "Date"),
    ("St", "Time"),
    ("Ss", "Sun"),
    ("Sp", "Electrical power"),
    ("Na", "Network Analog"),
    ("Nd", "Network Digital"),
    ("M", "MBus"),
    ("AM", "Modbus"),
    ("AK", "KNX"),
    ("La", "Logging Analog"),
    ("Ld", "Logging Digital"),
];

/// Section name for a `jsonparam` code
pub fn section_name(code: &str) -> Option<&'static str> {
    SECTION_CODES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

#[derive(Debug, Deserialize)]
struct RawDocument {
    #[serde(rename = "Header")]
    header: Option<RawHeader>,
    #[serde(rename = "Data", default)]
    data: Map<String, Value>,
    #[serde(rename = "Status code")]
    status_code: u8,
}

#[derive(Debug, Deserialize)]
struct RawHeader {
    #[serde(rename = "Version", default)]
    version: u32,
    #[serde(rename = "Device", default)]
    device: String,
    #[serde(rename = "Timestamp", default)]
    timestamp: u64,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(rename = "Number")]
    number: u16,
    #[serde(rename = "AD")]
    ad: String,
    #[serde(rename = "Value")]
    value: RawValue,
}

#[derive(Debug, Deserialize)]
struct RawValue {
    #[serde(rename = "Value")]
    value: f64,
    #[serde(rename = "Unit", default)]
    unit: Option<RawUnit>,
    #[serde(rename = "State", default)]
    state: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawUnit {
    Code(u16),
    Text(String),
}

impl RawValue {
    fn unit(&self) -> BlnetResult<&'static str> {
        match &self.unit {
            None => cmi_unit(0),
            Some(RawUnit::Code(code)) => cmi_unit(*code),
            Some(RawUnit::Text(text)) => cmi_unit_str(text),
        }
    }

    /// `State` wins over `Value` when present
    fn is_on(&self) -> bool {
        match &self.state {
            Some(Value::Bool(on)) => *on,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
            Some(Value::String(s)) => s.trim() != "0" && !s.trim().is_empty(),
            _ => self.value != 0.0,
        }
    }
}

/// `Header` block of a CMI response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmiHeader {
    pub version: u32,
    /// Two hex digits as sent by the device
    pub device_code: String,
    pub device_name: &'static str,
    pub timestamp: u64,
}

impl From<&CmiHeader> for DeviceInfo {
    fn from(header: &CmiHeader) -> Self {
        DeviceInfo::new()
            .with("api_version", header.version.to_string())
            .with("device", header.device_name)
            .with("device_code", header.device_code.clone())
            .with("timestamp", header.timestamp.to_string())
    }
}

/// A decoded CMI response
#[derive(Debug, Clone)]
pub struct CmiDocument {
    pub header: Option<CmiHeader>,
    pub status: CmiStatus,
    pub record: SensorRecord,
}

/// Record key: the `AD` letter followed by the zero-padded number
pub fn entry_key(ad: &str, number: u16) -> String {
    format!("{}{:02}", ad, number)
}

/// Parse and decode a response body
///
/// # Returns
/// The document, [`BlnetError::ProtocolStatus`] if the device reported a
/// non-zero status code, or a decode error
pub fn parse_document(body: &str) -> BlnetResult<CmiDocument> {
    let value: Value = serde_json::from_str(body)?;
    decode_document(value)
}

/// Decode an already parsed response
pub fn decode_document(value: Value) -> BlnetResult<CmiDocument> {
    let raw: RawDocument = serde_json::from_value(value)?;

    let status = CmiStatus::from_code(raw.status_code);
    if !status.is_ok() {
        return Err(BlnetError::ProtocolStatus(status));
    }

    let header = raw.header.map(|h| CmiHeader {
        device_name: cmi_device_name(&h.device),
        version: h.version,
        device_code: h.device,
        timestamp: h.timestamp,
    });

    let mut builder = SensorRecord::builder();
    for (section, content) in raw.data {
        let Value::Array(entries) = content else {
            log::debug!("Skipping non-array CMI section {}", section);
            continue;
        };
        for entry in entries {
            let entry: RawEntry = serde_json::from_value(entry).map_err(|e| {
                BlnetError::InvalidData(format!("Malformed entry in section {}: {}", section, e))
            })?;
            let key = entry_key(&entry.ad, entry.number);
            let measurement = Measurement::new(entry.value.value, entry.value.unit()?);

            match section.as_str() {
                INPUTS_SECTION => {
                    builder.analog_input(key.clone(), measurement.clone());
                }
                OUTPUTS_SECTION => {
                    builder.output(key.clone(), entry.value.is_on());
                }
                _ => {}
            }
            builder.section_entry(&section, key, measurement);
        }
    }

    Ok(CmiDocument {
        header,
        status,
        record: builder.build(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(data: Value, status: u8) -> Value {
        json!({
            "Header": {"Version": 5, "Device": "87", "Timestamp": 1630000000},
            "Data": data,
            "Status": "OK",
            "Status code": status
        })
    }

    #[test]
    fn test_output_state_wins_over_value() {
        let doc = document(
            json!({"Outputs": [
                {"Number": 7, "AD": "A", "Value": {"State": 1, "Value": 65.0, "Unit": "8"}}
            ]}),
            0,
        );
        let decoded = decode_document(doc).unwrap();
        assert_eq!(decoded.record.output("A07"), Some(true));

        let doc = document(
            json!({"Outputs": [
                {"Number": 7, "AD": "A", "Value": {"State": 0, "Value": 65.0, "Unit": "8"}}
            ]}),
            0,
        );
        let decoded = decode_document(doc).unwrap();
        assert_eq!(decoded.record.output("A07"), Some(false));
    }

    #[test]
    fn test_output_without_state_uses_value() {
        let doc = document(
            json!({"Outputs": [
                {"Number": 1, "AD": "D", "Value": {"Value": 1, "Unit": 43}},
                {"Number": 2, "AD": "D", "Value": {"Value": 0, "Unit": 43}}
            ]}),
            0,
        );
        let record = decode_document(doc).unwrap().record;
        assert_eq!(record.output("D01"), Some(true));
        assert_eq!(record.output("D02"), Some(false));
    }

    #[test]
    fn test_inputs_and_units() {
        let doc = document(
            json!({"Inputs": [
                {"Number": 1, "AD": "A", "Value": {"Value": 21.4, "Unit": "1"}},
                {"Number": 12, "AD": "D", "Value": {"Value": 1, "Unit": "43"}}
            ]}),
            0,
        );
        let record = decode_document(doc).unwrap().record;
        let s1 = record.analog_input("A01").unwrap();
        assert_eq!(s1.value, 21.4);
        assert_eq!(s1.unit, "°C");
        assert!(record.analog_input("D12").is_some());
        assert_eq!(record.section("Inputs").unwrap().len(), 2);
    }

    #[test]
    fn test_missing_unit_is_dimensionless() {
        let doc = document(
            json!({"Logging Analog": [{"Number": 3, "AD": "A", "Value": {"Value": 4.0}}]}),
            0,
        );
        let record = decode_document(doc).unwrap().record;
        let entry = &record.section("Logging Analog").unwrap()["A03"];
        assert_eq!(entry.unit, cmi_unit(0).unwrap());
        assert!(record.analog_inputs().is_empty());
    }

    #[test]
    fn test_arbitrary_sections() {
        let doc = document(
            json!({
                "DL-Bus": [{"Number": 2, "AD": "A", "Value": {"Value": 55.5, "Unit": 1}}],
                "Electrical power": [{"Number": 1, "AD": "A", "Value": {"Value": 1.2, "Unit": 10}}],
                "Unsupported": "ignored"
            }),
            0,
        );
        let record = decode_document(doc).unwrap().record;
        assert_eq!(record.sections().len(), 2);
        assert_eq!(record.section("DL-Bus").unwrap()["A02"].value, 55.5);
        assert!(record.section("Unsupported").is_none());
    }

    #[test]
    fn test_unknown_unit_is_an_error() {
        let doc = document(
            json!({"Inputs": [{"Number": 1, "AD": "A", "Value": {"Value": 1.0, "Unit": "500"}}]}),
            0,
        );
        assert!(matches!(
            decode_document(doc),
            Err(BlnetError::UnknownUnit(_))
        ));
    }

    #[test]
    fn test_malformed_entry_fails_whole_document() {
        let doc = document(
            json!({"Inputs": [
                {"Number": 1, "AD": "A", "Value": {"Value": 1.0, "Unit": "1"}},
                {"Number": "x"}
            ]}),
            0,
        );
        assert!(matches!(decode_document(doc), Err(BlnetError::InvalidData(_))));
    }

    #[test]
    fn test_non_zero_status() {
        let doc = document(json!({}), 4);
        assert!(matches!(
            decode_document(doc),
            Err(BlnetError::ProtocolStatus(CmiStatus::TooManyRequests))
        ));
    }

    #[test]
    fn test_header_device_name() {
        let decoded = parse_document(&document(json!({}), 0).to_string()).unwrap();
        let header = decoded.header.unwrap();
        assert_eq!(header.device_name, "UVR16x2");
        assert_eq!(header.version, 5);

        let info = DeviceInfo::from(&header);
        assert_eq!(info.get("device"), Some("UVR16x2"));
        assert_eq!(info.get("device_code"), Some("87"));
    }

    #[test]
    fn test_unknown_device_code_is_not_fatal() {
        let doc = json!({
            "Header": {"Version": 1, "Device": "FF", "Timestamp": 0},
            "Data": {},
            "Status code": 0
        });
        let decoded = decode_document(doc).unwrap();
        assert_eq!(decoded.header.unwrap().device_name, "Unknown");
        assert!(decoded.record.is_empty());
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(parse_document("{not json"), Err(BlnetError::Json(_))));
    }

    #[test]
    fn test_entry_key_and_section_codes() {
        assert_eq!(entry_key("A", 7), "A07");
        assert_eq!(entry_key("D", 12), "D12");
        assert_eq!(section_name("La"), Some("Logging Analog"));
        assert_eq!(section_name("Zz"), None);
    }
}
