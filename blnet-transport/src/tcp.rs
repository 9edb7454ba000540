//! TCP transport implementation (BL-NET)

use crate::error::{not_connected, BlnetError, BlnetResult};
use crate::stream::{StreamAccessor, TransportLayer};
use async_trait::async_trait;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Default BL-NET data port
pub const DEFAULT_PORT: u16 = 40000;

/// Wrapper for TcpStream that implements Debug
struct DebugTcpStream(TcpStream);

impl fmt::Debug for DebugTcpStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TcpStream").finish()
    }
}

impl Deref for DebugTcpStream {
    type Target = TcpStream;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for DebugTcpStream {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// TCP transport layer settings
#[derive(Debug, Clone)]
pub struct TcpSettings {
    /// Host name or IP address of the BL-NET
    pub host: String,
    pub port: u16,
    pub timeout: Option<Duration>,
}

impl TcpSettings {
    /// Create new TCP settings with a 10 second timeout
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: Some(Duration::from_secs(10)),
        }
    }

    /// Create TCP settings with timeout
    pub fn with_timeout(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: Some(timeout),
        }
    }
}

/// TCP transport layer implementation
#[derive(Debug)]
pub struct TcpTransport {
    stream: Option<DebugTcpStream>,
    settings: TcpSettings,
    closed: bool,
}

impl TcpTransport {
    /// Create a new TCP transport layer
    pub fn new(settings: TcpSettings) -> Self {
        Self {
            stream: None,
            settings,
            closed: true,
        }
    }

    pub fn settings(&self) -> &TcpSettings {
        &self.settings
    }
}

#[async_trait]
impl TransportLayer for TcpTransport {
    async fn open(&mut self) -> BlnetResult<()> {
        if !self.closed {
            return Err(BlnetError::Connection(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Connection has already been opened",
            )));
        }

        let address = (self.settings.host.as_str(), self.settings.port);
        let stream = if let Some(timeout) = self.settings.timeout {
            tokio::time::timeout(timeout, TcpStream::connect(address))
                .await
                .map_err(|_| BlnetError::Timeout)??
        } else {
            TcpStream::connect(address).await?
        };
        stream.set_nodelay(true)?;

        self.stream = Some(DebugTcpStream(stream));
        self.closed = false;
        Ok(())
    }

    fn peer(&self) -> String {
        format!("{}:{}", self.settings.host, self.settings.port)
    }
}

#[async_trait]
impl StreamAccessor for TcpTransport {
    async fn read(&mut self, buf: &mut [u8]) -> BlnetResult<usize> {
        let stream = self.stream.as_mut().ok_or_else(|| not_connected("TCP stream"))?;

        let result = if let Some(timeout) = self.settings.timeout {
            tokio::time::timeout(timeout, stream.read(buf))
                .await
                .map_err(|_| BlnetError::Timeout)?
                .map_err(BlnetError::Connection)
        } else {
            stream.read(buf).await.map_err(BlnetError::Connection)
        };

        match result {
            Ok(0) => {
                self.closed = true;
                Ok(0)
            }
            Ok(n) => Ok(n),
            Err(e) => {
                self.closed = true;
                Err(e)
            }
        }
    }

    async fn write(&mut self, buf: &[u8]) -> BlnetResult<usize> {
        let stream = self.stream.as_mut().ok_or_else(|| not_connected("TCP stream"))?;

        if let Some(timeout) = self.settings.timeout {
            tokio::time::timeout(timeout, stream.write(buf))
                .await
                .map_err(|_| BlnetError::Timeout)?
                .map_err(BlnetError::Connection)
        } else {
            stream.write(buf).await.map_err(BlnetError::Connection)
        }
    }

    async fn flush(&mut self) -> BlnetResult<()> {
        let stream = self.stream.as_mut().ok_or_else(|| not_connected("TCP stream"))?;
        stream.flush().await.map_err(BlnetError::Connection)
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    async fn close(&mut self) -> BlnetResult<()> {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
        }
        self.closed = true;
        Ok(())
    }
}
