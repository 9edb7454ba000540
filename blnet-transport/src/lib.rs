//! Transport layer module for the BL-NET/D-LOGG and CMI protocols
//!
//! This crate provides the byte-stream transports (TCP for the BL-NET,
//! serial for the D-LOGG), the one-command-per-connection exchange the
//! binary protocol uses, and the HTTP transport of the CMI JSON API.

pub mod error;
pub mod exchange;
pub mod http;
pub mod serial;
pub mod stream;
pub mod tcp;

pub use error::{BlnetError, BlnetResult};
pub use exchange::{CommandExchange, OneShotExchange};
pub use http::{CmiHttpTransport, HttpSettings, JsonExchange};
pub use serial::{SerialSettings, SerialTransport};
pub use stream::{StreamAccessor, TransportLayer};
pub use tcp::{TcpSettings, TcpTransport};
