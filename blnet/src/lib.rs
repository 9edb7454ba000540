//! blnet - Rust implementation of the BL-NET/D-LOGG and CMI protocols
//!
//! Reads heating and solar controller data (analog inputs, outputs, speed
//! levels, heat meters) from Technische Alternative data loggers.
//!
//! # Architecture
//!
//! - `blnet-core`: data model, errors, bit helpers, unit and device tables
//! - `blnet-transport`: TCP (BL-NET), serial (D-LOGG) and HTTP (CMI) transports
//! - `blnet-codec`: header, binary frame and CMI JSON decoders
//! - `blnet-client`: fetch-with-retry, device clients, polling state machine
//!
//! # Usage
//!
//! ```no_run
//! use blnet::client::{BlnetConfig, LogSink};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() -> blnet::BlnetResult<()> {
//! let config = BlnetConfig::load("blnet.toml")?;
//! blnet::run(&config, LogSink, CancellationToken::new()).await
//! # }
//! ```

pub use blnet_core::{
    BlnetError, BlnetResult, CmiStatus, DeviceHeader, DeviceInfo, DeviceType, LoggerMode,
    Measurement, SensorRecord,
};

pub mod client {
    pub use blnet_client::*;
}

pub mod codec {
    pub use blnet_codec::*;
}

pub mod transport {
    pub use blnet_transport::*;
}

use blnet_client::{source_from_config, BlnetConfig, Poller, RecordSink};
use tokio_util::sync::CancellationToken;

/// Poll the configured device into `sink` until `cancel` fires
pub async fn run<K: RecordSink>(
    config: &BlnetConfig,
    sink: K,
    cancel: CancellationToken,
) -> BlnetResult<()> {
    let source = source_from_config(config)?;
    let mut poller = Poller::new(source, sink, config.poll_interval());
    poller.run(cancel).await;
    log::info!("Stopped polling {}", config.target());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use blnet_client::{ChannelSink, SinkEvent};

    #[tokio::test]
    async fn test_run_reports_unreachable_logger() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = BlnetConfig::builder()
            .bl_net("127.0.0.1")
            .port(port)
            .max_attempts(1)
            .command_delay_ms(0)
            .build()
            .unwrap();
        let (sink, mut rx) = ChannelSink::new();
        let cancel = CancellationToken::new();

        let task = tokio::spawn({
            let cancel = cancel.clone();
            async move { run(&config, sink, cancel).await }
        });

        assert_eq!(rx.recv().await, Some(SinkEvent::Connection(false)));
        cancel.cancel();
        assert!(task.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_run_rejects_invalid_config() {
        let config = BlnetConfig::default();
        let (sink, _rx) = ChannelSink::new();
        assert!(matches!(
            run(&config, sink, CancellationToken::new()).await,
            Err(BlnetError::Config(_))
        ));
    }
}
