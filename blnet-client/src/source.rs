//! Device-independent view of a logger for the poller

use crate::blnet::BlnetClient;
use crate::cmi::CmiClient;
use crate::config::{BlnetConfig, LoggerKind};
use async_trait::async_trait;
use blnet_core::{BlnetError, BlnetResult, DeviceInfo, SensorRecord};
use blnet_transport::{
    CmiHttpTransport, CommandExchange, HttpSettings, JsonExchange, OneShotExchange,
    SerialSettings, SerialTransport, TcpSettings, TcpTransport,
};

/// What initialization found out about a device
#[derive(Debug, Clone, PartialEq)]
pub struct Discovery {
    pub info: DeviceInfo,
    /// Frame indices (binary protocol) or CAN nodes (CMI) to poll
    pub frames: Vec<u8>,
}

/// A device the poller can initialize and read
#[async_trait]
pub trait DataSource: Send {
    /// Identify the device
    async fn discover(&mut self) -> BlnetResult<Discovery>;

    /// Read one frame or node
    async fn read_record(&mut self, frame: u8) -> BlnetResult<SensorRecord>;

    /// Forget everything learned by [`DataSource::discover`]
    fn reset(&mut self) {}
}

#[async_trait]
impl<S: DataSource + ?Sized> DataSource for Box<S> {
    async fn discover(&mut self) -> BlnetResult<Discovery> {
        (**self).discover().await
    }

    async fn read_record(&mut self, frame: u8) -> BlnetResult<SensorRecord> {
        (**self).read_record(frame).await
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

#[async_trait]
impl<E: CommandExchange> DataSource for BlnetClient<E> {
    async fn discover(&mut self) -> BlnetResult<Discovery> {
        let header = self.read_device_header().await?;
        Ok(Discovery {
            info: DeviceInfo::from(&header),
            frames: header.frame_indices().collect(),
        })
    }

    async fn read_record(&mut self, frame: u8) -> BlnetResult<SensorRecord> {
        let header = self.header().cloned().ok_or(BlnetError::NotInitialized)?;
        self.read_frame(&header, frame).await
    }

    fn reset(&mut self) {
        self.clear_header();
    }
}

#[async_trait]
impl<J: JsonExchange> DataSource for CmiClient<J> {
    /// The CMI has no separate identification request, the header of the
    /// first node's document identifies the device. That document is kept
    /// so initialization does not spend another rate-limited request on it.
    async fn discover(&mut self) -> BlnetResult<Discovery> {
        let first = *self
            .nodes()
            .first()
            .ok_or_else(|| BlnetError::Config("no CAN nodes configured".into()))?;
        let document = self.fetch_node(first).await?;
        let info = document
            .header
            .as_ref()
            .map(DeviceInfo::from)
            .unwrap_or_default();
        self.set_prefetched(first, document.record);
        Ok(Discovery {
            info,
            frames: self.nodes().to_vec(),
        })
    }

    async fn read_record(&mut self, frame: u8) -> BlnetResult<SensorRecord> {
        if let Some(record) = self.take_prefetched(frame) {
            return Ok(record);
        }
        Ok(self.fetch_node(frame).await?.record)
    }

    fn reset(&mut self) {
        self.clear_prefetched();
    }
}

/// Build the data source the configuration selects
pub fn source_from_config(config: &BlnetConfig) -> BlnetResult<Box<dyn DataSource>> {
    config.validate()?;
    let policy = config.retry_policy();
    let timeout = config.io_timeout();

    let source: Box<dyn DataSource> = match config.logger {
        LoggerKind::BlNet => {
            let settings = TcpSettings::with_timeout(config.address.clone(), config.port, timeout);
            let exchange = OneShotExchange::new(TcpTransport::new(settings));
            Box::new(BlnetClient::new(exchange, policy))
        }
        LoggerKind::DLogg => {
            let mut settings = SerialSettings::new(config.serial_port.clone(), config.baud_rate);
            settings.timeout = Some(timeout);
            let exchange = OneShotExchange::new(SerialTransport::new(settings));
            Box::new(BlnetClient::new(exchange, policy))
        }
        LoggerKind::Cmi => {
            let mut settings = HttpSettings::new(config.base_url()).with_timeout(timeout);
            if let Some(username) = &config.username {
                let password = config.password.clone().unwrap_or_default();
                settings = settings.with_credentials(username.clone(), password);
            }
            let exchange = CmiHttpTransport::new(settings)?;
            Box::new(CmiClient::new(
                exchange,
                policy,
                config.cmi_params.clone(),
                config.can_nodes.clone(),
            ))
        }
    };
    log::info!("Polling {} every {:?}", config.target(), config.poll_interval());
    Ok(source)
}
