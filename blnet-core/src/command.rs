//! Requests understood by the loggers

use crate::device::MAX_FRAMES;
use crate::error::{BlnetError, BlnetResult};
use std::fmt;

/// Binary protocol opcodes
pub mod opcode {
    /// Module id of the BL-NET/D-LOGG
    pub const VERSION: u8 = 0x81;
    /// Firmware version
    pub const FIRMWARE: u8 = 0x82;
    /// Transmission mode
    pub const MODE: u8 = 0x21;
    /// Header frame
    pub const HEADER_READ: u8 = 0xAA;
    /// Current data of one frame
    pub const READ_CURRENT_DATA: u8 = 0xAB;
}

/// Binary protocol command: opcode plus optional parameter bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Command {
    opcode: u8,
    params: Vec<u8>,
}

impl Command {
    pub fn new(opcode: u8, params: Vec<u8>) -> Self {
        Self { opcode, params }
    }

    pub fn version() -> Self {
        Self::new(opcode::VERSION, Vec::new())
    }

    pub fn firmware() -> Self {
        Self::new(opcode::FIRMWARE, Vec::new())
    }

    pub fn mode() -> Self {
        Self::new(opcode::MODE, Vec::new())
    }

    pub fn header_read() -> Self {
        Self::new(opcode::HEADER_READ, Vec::new())
    }

    /// Current data of a frame, 1-based
    pub fn read_current_data(frame_index: u8) -> BlnetResult<Self> {
        if frame_index == 0 || frame_index > MAX_FRAMES {
            return Err(BlnetError::InvalidData(format!(
                "Frame index must be 1..={}, got {}",
                MAX_FRAMES, frame_index
            )));
        }
        Ok(Self::new(opcode::READ_CURRENT_DATA, vec![frame_index]))
    }

    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    pub fn params(&self) -> &[u8] {
        &self.params
    }

    /// Bytes written to the wire
    pub fn encode(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(1 + self.params.len());
        result.push(self.opcode);
        result.extend_from_slice(&self.params);
        result
    }

    /// Smallest reply that counts as a valid answer
    ///
    /// Block reads answer with a frame; a single byte is the logger's busy
    /// reply. Info requests answer with a single byte.
    pub fn min_response_len(&self) -> usize {
        match self.opcode {
            opcode::HEADER_READ | opcode::READ_CURRENT_DATA => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", self.opcode)?;
        for param in &self.params {
            write!(f, " 0x{:02X}", param)?;
        }
        Ok(())
    }
}

/// CMI JSON API request: one CAN node and a list of section codes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CmiRequest {
    pub node: u8,
    pub params: Vec<String>,
}

impl CmiRequest {
    pub fn new(node: u8, params: Vec<String>) -> Self {
        Self { node, params }
    }

    /// Query string pairs for `/INCLUDE/api.cgi`
    pub fn query(&self) -> [(&'static str, String); 2] {
        [
            ("jsonnode", self.node.to_string()),
            ("jsonparam", self.params.join(",")),
        ]
    }
}

impl fmt::Display for CmiRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node {} [{}]", self.node, self.params.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_encode() {
        assert_eq!(Command::header_read().encode(), vec![0xAA]);
        assert_eq!(Command::read_current_data(3).unwrap().encode(), vec![0xAB, 0x03]);
        assert_eq!(Command::read_current_data(1).unwrap().to_string(), "0xAB 0x01");
    }

    #[test]
    fn test_frame_index_range() {
        assert!(Command::read_current_data(0).is_err());
        assert!(Command::read_current_data(9).is_err());
        assert!(Command::read_current_data(8).is_ok());
    }

    #[test]
    fn test_min_response_len() {
        assert_eq!(Command::header_read().min_response_len(), 2);
        assert_eq!(Command::read_current_data(1).unwrap().min_response_len(), 2);
        assert_eq!(Command::firmware().min_response_len(), 1);
    }

    #[test]
    fn test_cmi_query() {
        let request = CmiRequest::new(1, vec!["I".to_string(), "O".to_string()]);
        let query = request.query();
        assert_eq!(query[0], ("jsonnode", "1".to_string()));
        assert_eq!(query[1], ("jsonparam", "I,O".to_string()));
    }
}
