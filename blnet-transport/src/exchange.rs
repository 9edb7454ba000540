//! Command/response exchange of the binary protocol
//!
//! The loggers answer exactly one command per connection: connect, write
//! the command, wait for one burst of data, close.

use crate::error::{BlnetError, BlnetResult};
use crate::stream::TransportLayer;
use async_trait::async_trait;
use blnet_core::hexdump::hex_dump;
use blnet_core::Command;
use bytes::Bytes;

/// Receive buffer size; the largest reply (a UVR1611 frame) is 56 bytes
const READ_BUFFER_SIZE: usize = 512;

/// Sends one command and returns the raw reply
#[async_trait]
pub trait CommandExchange: Send {
    async fn exchange(&mut self, command: &Command) -> BlnetResult<Bytes>;
}

/// [`CommandExchange`] that opens a fresh connection per command
#[derive(Debug)]
pub struct OneShotExchange<T: TransportLayer> {
    transport: T,
}

impl<T: TransportLayer> OneShotExchange<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn round_trip(&mut self, command: &Command) -> BlnetResult<Bytes> {
        let encoded = command.encode();
        log::debug!(
            "Sent command to {} - hex dump:\n{}",
            self.transport.peer(),
            hex_dump(&encoded)
        );
        self.transport.write_all(&encoded).await?;
        self.transport.flush().await?;

        let mut buf = vec![0u8; READ_BUFFER_SIZE];
        let n = self.transport.read(&mut buf).await?;
        if n == 0 {
            return Err(BlnetError::Connection(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "Connection closed unexpectedly",
            )));
        }
        buf.truncate(n);
        log::debug!("Received {} bytes - hex dump:\n{}", n, hex_dump(&buf));
        Ok(Bytes::from(buf))
    }
}

#[async_trait]
impl<T: TransportLayer> CommandExchange for OneShotExchange<T> {
    async fn exchange(&mut self, command: &Command) -> BlnetResult<Bytes> {
        self.transport.open().await?;
        let result = self.round_trip(command).await;
        if let Err(e) = self.transport.close().await {
            log::debug!("Closing {} failed: {}", self.transport.peer(), e);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::StreamAccessor;
    use crate::tcp::{TcpSettings, TcpTransport};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn local_exchange(port: u16) -> OneShotExchange<TcpTransport> {
        OneShotExchange::new(TcpTransport::new(TcpSettings::new("127.0.0.1", port)))
    }

    async fn listener() -> (TcpListener, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, port)
    }

    #[tokio::test]
    async fn test_exchange_per_connection() {
        let (listener, port) = listener().await;
        let server = tokio::spawn(async move {
            for reply in [vec![0x0A], vec![0x8C]] {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = [0u8; 1];
                socket.read_exact(&mut buf).await.unwrap();
                socket.write_all(&reply).await.unwrap();
            }
        });

        let mut exchange = local_exchange(port);
        let version = exchange.exchange(&Command::version()).await.unwrap();
        assert_eq!(version.as_ref(), &[0x0A]);
        let firmware = exchange.exchange(&Command::firmware()).await.unwrap();
        assert_eq!(firmware.as_ref(), &[0x8C]);
        assert!(exchange.transport().is_closed());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_exchange_peer_closes() {
        let (listener, port) = listener().await;
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            drop(socket);
        });

        let mut exchange = local_exchange(port);
        let result = exchange.exchange(&Command::header_read()).await;
        assert!(matches!(result, Err(BlnetError::Connection(_))));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_exchange_connection_refused() {
        let (listener, port) = listener().await;
        drop(listener);
        let mut exchange = local_exchange(port);
        let err = exchange.exchange(&Command::header_read()).await.unwrap_err();
        assert!(err.is_transport_error());
    }
}
