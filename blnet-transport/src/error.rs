//! Error types shared with the rest of the stack

pub use blnet_core::error::{BlnetError, BlnetResult};

/// Error for an operation on a stream that is not open
pub(crate) fn not_connected(what: &str) -> BlnetError {
    BlnetError::Connection(std::io::Error::new(
        std::io::ErrorKind::NotConnected,
        format!("{} not connected", what),
    ))
}
