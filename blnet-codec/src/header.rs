//! Header frame parser
//!
//! Header frame layouts (offsets from the identifier byte):
//!
//! | mode | byte 1 | type codes | length |
//! |---|---|---|---|
//! | single DL | 0xA8 | byte 5 | 13 |
//! | dual DL | 0xD1 | bytes 5, 6 | 14 |
//! | CAN | 0xDC | byte 5 = frame count, bytes 6.. | 14 + count |

use blnet_core::device::MAX_FRAMES;
use blnet_core::{BlnetError, BlnetResult, DeviceHeader, LoggerMode};

/// Offset of the mode identifier
const MODE_OFFSET: usize = 1;
/// First device type code (single and dual DL), frame count (CAN)
const DEVICE1_OFFSET: usize = 5;
/// Second device type code (dual DL)
const DEVICE2_OFFSET: usize = 6;
/// First per-frame type code (CAN)
const CAN_TYPES_OFFSET: usize = 6;

/// Content of a header frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderFrame {
    pub mode: LoggerMode,
    pub frame_count: u8,
    pub device_type_codes: Vec<u8>,
}

fn require(frame: &[u8], len: usize) -> BlnetResult<()> {
    if frame.len() < len {
        return Err(BlnetError::TruncatedFrame {
            expected: len,
            actual: frame.len(),
        });
    }
    Ok(())
}

/// Parse the reply to a header read
///
/// A dual DL logger is read as two frames, one per controller.
pub fn parse_header(frame: &[u8]) -> BlnetResult<HeaderFrame> {
    require(frame, MODE_OFFSET + 1)?;
    let mode = LoggerMode::from_byte(frame[MODE_OFFSET])?;

    let header = match mode {
        LoggerMode::SingleLogger => {
            require(frame, DEVICE1_OFFSET + 1)?;
            HeaderFrame {
                mode,
                frame_count: 1,
                device_type_codes: vec![frame[DEVICE1_OFFSET]],
            }
        }
        LoggerMode::DualLogger => {
            require(frame, DEVICE2_OFFSET + 1)?;
            HeaderFrame {
                mode,
                frame_count: 2,
                device_type_codes: vec![frame[DEVICE1_OFFSET], frame[DEVICE2_OFFSET]],
            }
        }
        LoggerMode::CanMulti => {
            require(frame, DEVICE1_OFFSET + 1)?;
            let frame_count = frame[DEVICE1_OFFSET];
            if frame_count == 0 || frame_count > MAX_FRAMES {
                return Err(BlnetError::InvalidData(format!(
                    "CAN frame count must be 1..={}, got {}",
                    MAX_FRAMES, frame_count
                )));
            }
            let end = CAN_TYPES_OFFSET + usize::from(frame_count);
            require(frame, end)?;
            HeaderFrame {
                mode,
                frame_count,
                device_type_codes: frame[CAN_TYPES_OFFSET..end].to_vec(),
            }
        }
    };

    log::debug!(
        "Header: mode {} with {} frame(s), type codes {:02X?}",
        mode.label(header.frame_count),
        header.frame_count,
        header.device_type_codes
    );
    Ok(header)
}

/// Module id reply as `0x` followed by upper-case hex
pub fn format_module_id(reply: &[u8]) -> String {
    let hex: String = reply.iter().map(|b| format!("{:02X}", b)).collect();
    format!("0x{}", hex)
}

/// Firmware reply: the first byte divided by 100
pub fn format_firmware_version(reply: &[u8]) -> BlnetResult<String> {
    let byte = first_byte(reply, "firmware version")?;
    Ok((f64::from(byte) / 100.0).to_string())
}

/// Transmission mode reply: the first byte as upper-case hex
pub fn format_transmission_mode(reply: &[u8]) -> BlnetResult<String> {
    let byte = first_byte(reply, "transmission mode")?;
    Ok(format!("{:X}", byte))
}

fn first_byte(reply: &[u8], what: &str) -> BlnetResult<u8> {
    reply
        .first()
        .copied()
        .ok_or_else(|| BlnetError::InvalidData(format!("Empty {} reply", what)))
}

impl HeaderFrame {
    /// Combine the header with the version, firmware and mode replies
    pub fn into_device_header(
        self,
        version_reply: &[u8],
        firmware_reply: &[u8],
        mode_reply: &[u8],
    ) -> BlnetResult<DeviceHeader> {
        Ok(DeviceHeader {
            mode: self.mode,
            frame_count: self.frame_count,
            device_type_codes: self.device_type_codes,
            module_id: format_module_id(version_reply),
            firmware_version: format_firmware_version(firmware_reply)?,
            transmission_mode: format_transmission_mode(mode_reply)?,
        })
    }
}
