//! CMI JSON API status codes

use std::fmt;

/// Application-level status reported in the `Status code` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmiStatus {
    /// 0: request served
    Ok,
    /// 1: CAN node not available
    NodeError,
    /// 2: parameter or value not supported by the node
    Fail,
    /// 3: malformed request
    SyntaxError,
    /// 4: rate limit exceeded (one request per minute)
    TooManyRequests,
    /// 5: device not supported
    DeviceNotSupported,
    /// 6: missing request arguments
    TooFewArguments,
    /// 7: CAN bus busy
    CanBusy,
    /// Any code not listed above
    Unknown(u8),
}

impl CmiStatus {
    /// Create from the numeric status code
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Ok,
            1 => Self::NodeError,
            2 => Self::Fail,
            3 => Self::SyntaxError,
            4 => Self::TooManyRequests,
            5 => Self::DeviceNotSupported,
            6 => Self::TooFewArguments,
            7 => Self::CanBusy,
            other => Self::Unknown(other),
        }
    }

    /// Numeric status code
    pub fn code(&self) -> u8 {
        match self {
            Self::Ok => 0,
            Self::NodeError => 1,
            Self::Fail => 2,
            Self::SyntaxError => 3,
            Self::TooManyRequests => 4,
            Self::DeviceNotSupported => 5,
            Self::TooFewArguments => 6,
            Self::CanBusy => 7,
            Self::Unknown(code) => *code,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Human-readable meaning
    pub fn description(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::NodeError => "node not available",
            Self::Fail => "parameter not supported by node",
            Self::SyntaxError => "syntax error in request",
            Self::TooManyRequests => "too many requests",
            Self::DeviceNotSupported => "device not supported",
            Self::TooFewArguments => "too few arguments",
            Self::CanBusy => "CAN bus busy",
            Self::Unknown(_) => "unknown status",
        }
    }
}

impl fmt::Display for CmiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        for code in 0..=7u8 {
            assert_eq!(CmiStatus::from_code(code).code(), code);
        }
        assert!(CmiStatus::from_code(0).is_ok());
        assert_eq!(CmiStatus::from_code(4), CmiStatus::TooManyRequests);
        assert_eq!(CmiStatus::from_code(42), CmiStatus::Unknown(42));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(CmiStatus::CanBusy.to_string(), "CAN bus busy (7)");
    }
}
