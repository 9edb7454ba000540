//! Client side of the BL-NET/D-LOGG and CMI protocols
//!
//! Ties the transports and decoders together:
//!
//! - [`retry`]: command spacing, reply validation and bounded retries
//! - [`blnet`]: header discovery and frame reads over the binary protocol
//! - [`cmi`]: per-node document reads over the CMI JSON API
//! - [`poller`]: the timer-driven polling state machine
//! - [`sink`]: where decoded records go
//! - [`config`]: figment-backed configuration

pub mod blnet;
pub mod cmi;
pub mod config;
pub mod poller;
pub mod retry;
pub mod sink;
pub mod source;

pub use blnet::BlnetClient;
pub use cmi::CmiClient;
pub use config::{BlnetConfig, ConfigBuilder, LoggerKind};
pub use poller::{PollState, Poller};
pub use retry::{fetch_decoded, fetch_document, fetch_with_retry, RetryPolicy};
pub use sink::{ChannelSink, LogSink, RecordSink, SinkEvent};
pub use source::{source_from_config, DataSource, Discovery};
