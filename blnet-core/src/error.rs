use crate::status::CmiStatus;
use thiserror::Error;

/// Main error type for BL-NET/D-LOGG and CMI operations
#[derive(Error, Debug)]
pub enum BlnetError {
    #[error("Connection error: {0}")]
    Connection(#[from] std::io::Error),

    #[error("Timeout")]
    Timeout,

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Unknown logger mode: 0x{0:02X}")]
    UnknownMode(u8),

    #[error("Unexpected frame format: expected identifier 0x{expected:02X}, got 0x{found:02X}")]
    UnexpectedFrameFormat { expected: u8, found: u8 },

    #[error("Truncated frame: expected at least {expected} bytes, got {actual}")]
    TruncatedFrame { expected: usize, actual: usize },

    #[error("Unknown unit code: {0}")]
    UnknownUnit(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("JSON decoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CMI status {}: {}", .0.code(), .0.description())]
    ProtocolStatus(CmiStatus),

    #[error("Max retries reached after {attempts} attempts")]
    MaxRetriesExceeded { attempts: u32 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Device header not initialized")]
    NotInitialized,
}

impl BlnetError {
    /// Malformed, short or unknown frame content
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            BlnetError::UnknownMode(_)
                | BlnetError::UnexpectedFrameFormat { .. }
                | BlnetError::TruncatedFrame { .. }
                | BlnetError::UnknownUnit(_)
                | BlnetError::InvalidData(_)
                | BlnetError::Json(_)
        )
    }

    /// Connection refused, reset, closed or timed out
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            BlnetError::Connection(_) | BlnetError::Timeout | BlnetError::Http(_)
        )
    }

    /// Whether another attempt at the fetch layer can succeed.
    ///
    /// An unknown logger mode is fatal for the initialization attempt and
    /// configuration errors never heal by themselves.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            BlnetError::UnknownMode(_)
                | BlnetError::Config(_)
                | BlnetError::MaxRetriesExceeded { .. }
                | BlnetError::NotInitialized
        )
    }
}

/// Result type alias for BL-NET/D-LOGG and CMI operations
pub type BlnetResult<T> = Result<T, BlnetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let err = BlnetError::TruncatedFrame { expected: 56, actual: 12 };
        assert!(err.is_decode_error());
        assert!(!err.is_transport_error());
        assert!(err.is_retryable());

        let err = BlnetError::Timeout;
        assert!(err.is_transport_error());
        assert!(err.is_retryable());

        assert!(!BlnetError::UnknownMode(0x42).is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = BlnetError::UnexpectedFrameFormat { expected: 0x80, found: 0xAB };
        assert_eq!(
            err.to_string(),
            "Unexpected frame format: expected identifier 0x80, got 0xAB"
        );
        let err = BlnetError::ProtocolStatus(CmiStatus::TooManyRequests);
        assert_eq!(err.to_string(), "CMI status 4: too many requests");
    }
}
