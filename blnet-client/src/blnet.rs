//! BL-NET/D-LOGG client over the binary protocol

use crate::retry::{fetch_decoded, fetch_with_retry, RetryPolicy};
use blnet_codec::{decode_frame, parse_header};
use blnet_core::{BlnetResult, Command, DeviceHeader, SensorRecord};
use blnet_transport::CommandExchange;

/// Reads the device header and current-data frames from a logger
#[derive(Debug)]
pub struct BlnetClient<E: CommandExchange> {
    exchange: E,
    policy: RetryPolicy,
    header: Option<DeviceHeader>,
}

impl<E: CommandExchange> BlnetClient<E> {
    pub fn new(exchange: E, policy: RetryPolicy) -> Self {
        Self {
            exchange,
            policy,
            header: None,
        }
    }

    /// Header from the last successful [`Self::read_device_header`]
    pub fn header(&self) -> Option<&DeviceHeader> {
        self.header.as_ref()
    }

    /// Drop the known header
    pub fn clear_header(&mut self) {
        self.header = None;
    }

    /// Identify the logger
    ///
    /// Sends the version, header, firmware and transmission mode commands in
    /// that order. The stored header is replaced only if all four succeed.
    pub async fn read_device_header(&mut self) -> BlnetResult<DeviceHeader> {
        let version =
            fetch_with_retry(&mut self.exchange, &Command::version(), &self.policy).await?;
        let frame = fetch_decoded(
            &mut self.exchange,
            &Command::header_read(),
            &self.policy,
            parse_header,
        )
        .await?;
        let firmware =
            fetch_with_retry(&mut self.exchange, &Command::firmware(), &self.policy).await?;
        let mode = fetch_with_retry(&mut self.exchange, &Command::mode(), &self.policy).await?;

        let header = frame.into_device_header(&version, &firmware, &mode)?;
        log::info!(
            "Logger {} firmware {}: mode {}, controllers {:?}",
            header.module_id,
            header.firmware_version,
            header.mode.label(header.frame_count),
            header.device_types()
        );
        self.header = Some(header.clone());
        Ok(header)
    }

    /// Read and decode one frame
    ///
    /// # Arguments
    /// * `header` - Header that declares the frame
    /// * `frame_index` - 1-based frame index
    pub async fn read_frame(
        &mut self,
        header: &DeviceHeader,
        frame_index: u8,
    ) -> BlnetResult<SensorRecord> {
        let command = Command::read_current_data(frame_index)?;
        let device = header.device_type(frame_index);
        fetch_decoded(&mut self.exchange, &command, &self.policy, |reply| {
            decode_frame(reply, device)
        })
        .await
    }

    /// Read every frame the header declares, in index order
    ///
    /// Fails as a whole if any frame fails.
    pub async fn read_all_frames(
        &mut self,
        header: &DeviceHeader,
    ) -> BlnetResult<Vec<(u8, SensorRecord)>> {
        let mut records = Vec::with_capacity(usize::from(header.frame_count));
        for frame_index in header.frame_indices() {
            let record = self.read_frame(header, frame_index).await?;
            records.push((frame_index, record));
        }
        Ok(records)
    }
}
