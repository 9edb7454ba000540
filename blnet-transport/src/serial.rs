//! Serial port transport implementation (D-LOGG over USB)

use crate::error::{not_connected, BlnetError, BlnetResult};
use crate::stream::{StreamAccessor, TransportLayer};
use async_trait::async_trait;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{SerialPortBuilderExt, SerialStream};

/// Line speed of the D-LOGG USB interface
pub const DLOGG_BAUD_RATE: u32 = 115_200;

/// Wrapper for SerialStream that implements Debug
struct DebugSerialStream(SerialStream);

impl fmt::Debug for DebugSerialStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialStream").finish()
    }
}

impl Deref for DebugSerialStream {
    type Target = SerialStream;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for DebugSerialStream {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// Serial port transport layer settings, 8N1 without flow control
#[derive(Debug, Clone)]
pub struct SerialSettings {
    pub port_name: String,
    pub baud_rate: u32,
    pub timeout: Option<Duration>,
}

impl SerialSettings {
    pub fn new(port_name: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate,
            timeout: Some(Duration::from_secs(10)),
        }
    }

    /// Settings for a D-LOGG on the given port
    pub fn dlogg(port_name: impl Into<String>) -> Self {
        Self::new(port_name, DLOGG_BAUD_RATE)
    }
}

/// Serial port transport layer implementation
#[derive(Debug)]
pub struct SerialTransport {
    stream: Option<DebugSerialStream>,
    settings: SerialSettings,
    closed: bool,
}

impl SerialTransport {
    pub fn new(settings: SerialSettings) -> Self {
        Self {
            stream: None,
            settings,
            closed: true,
        }
    }
}

#[async_trait]
impl TransportLayer for SerialTransport {
    async fn open(&mut self) -> BlnetResult<()> {
        if !self.closed {
            return Err(BlnetError::Connection(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Connection has already been opened",
            )));
        }

        let stream = tokio_serial::new(&self.settings.port_name, self.settings.baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .stop_bits(tokio_serial::StopBits::One)
            .parity(tokio_serial::Parity::None)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| {
                BlnetError::Connection(std::io::Error::other(format!(
                    "Failed to open serial port {}: {}",
                    self.settings.port_name, e
                )))
            })?;

        self.stream = Some(DebugSerialStream(stream));
        self.closed = false;
        Ok(())
    }

    fn peer(&self) -> String {
        self.settings.port_name.clone()
    }
}

#[async_trait]
impl StreamAccessor for SerialTransport {
    async fn read(&mut self, buf: &mut [u8]) -> BlnetResult<usize> {
        let stream = self.stream.as_mut().ok_or_else(|| not_connected("Serial stream"))?;

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
        let stream = self.stream.as_mut().ok_or_else(|| not_connected("Serial stream"))?;

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
        let stream = self.stream.as_mut().ok_or_else(|| not_connected("Serial stream"))?;
        stream.flush().await.map_err(BlnetError::Connection)
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    async fn close(&mut self) -> BlnetResult<()> {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.flush().await;
        }
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dlogg_settings() {
        let settings = SerialSettings::dlogg("/dev/ttyUSB0");
        assert_eq!(settings.port_name, "/dev/ttyUSB0");
        assert_eq!(settings.baud_rate, 115_200);
    }

    #[tokio::test]
    async fn test_open_missing_port() {
        let settings = SerialSettings::dlogg("/dev/does-not-exist-blnet");
        let mut transport = SerialTransport::new(settings);
        assert!(matches!(transport.open().await, Err(BlnetError::Connection(_))));
        assert!(transport.is_closed());
        assert_eq!(transport.peer(), "/dev/does-not-exist-blnet");
    }
}
