//! Stream accessor traits for the byte transports

use crate::error::{BlnetError, BlnetResult};
use async_trait::async_trait;

/// Access to a physical byte stream towards a logger
#[async_trait]
pub trait StreamAccessor: Send + Sync {
    /// Read available data into `buf`
    ///
    /// # Returns
    ///
    /// Number of bytes read, or 0 if the peer closed the stream
    async fn read(&mut self, buf: &mut [u8]) -> BlnetResult<usize>;

    /// Write data to the stream, returning the number of bytes written
    async fn write(&mut self, buf: &[u8]) -> BlnetResult<usize>;

    /// Write all data to the stream
    async fn write_all(&mut self, buf: &[u8]) -> BlnetResult<()> {
        let mut written = 0;
        while written < buf.len() {
            let n = self.write(&buf[written..]).await?;
            if n == 0 {
                return Err(BlnetError::Connection(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "Failed to write all data",
                )));
            }
            written += n;
        }
        Ok(())
    }

    /// Flush any buffered data
    async fn flush(&mut self) -> BlnetResult<()>;

    /// Check if the stream is closed
    fn is_closed(&self) -> bool;

    /// Close the stream
    async fn close(&mut self) -> BlnetResult<()>;
}

/// A stream that can be (re)opened
#[async_trait]
pub trait TransportLayer: StreamAccessor {
    /// Open the physical connection
    async fn open(&mut self) -> BlnetResult<()>;

    /// Peer description for log messages
    fn peer(&self) -> String;
}
