//! Consumers of decoded records

use blnet_core::{DeviceInfo, SensorRecord};
use tokio::sync::mpsc;

/// Receives everything the poller produces
pub trait RecordSink: Send {
    /// A decoded frame; `frame` is the frame index or CAN node
    fn publish(&mut self, frame: u8, record: &SensorRecord);

    /// Device identification, once per successful initialization
    fn publish_device_info(&mut self, info: &DeviceInfo);

    fn set_connection(&mut self, connected: bool);
}

/// One sink call
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Record { frame: u8, record: SensorRecord },
    DeviceInfo(DeviceInfo),
    Connection(bool),
}

/// Forwards sink calls into a channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<SinkEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SinkEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: SinkEvent) {
        if self.tx.send(event).is_err() {
            log::debug!("Sink receiver dropped, event discarded");
        }
    }
}

impl RecordSink for ChannelSink {
    fn publish(&mut self, frame: u8, record: &SensorRecord) {
        self.send(SinkEvent::Record {
            frame,
            record: record.clone(),
        });
    }

    fn publish_device_info(&mut self, info: &DeviceInfo) {
        self.send(SinkEvent::DeviceInfo(info.clone()));
    }

    fn set_connection(&mut self, connected: bool) {
        self.send(SinkEvent::Connection(connected));
    }
}

/// Writes records to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl RecordSink for LogSink {
    fn publish(&mut self, frame: u8, record: &SensorRecord) {
        for (name, m) in record.analog_inputs() {
            log::info!("frame {} {} = {} {}", frame, name, m.value, m.unit);
        }
        for (name, on) in record.outputs() {
            log::info!("frame {} {} = {}", frame, name, if *on { "on" } else { "off" });
        }
        for (name, level) in record.speed_levels() {
            match level {
                Some(level) => log::info!("frame {} {} = {}", frame, name, level),
                None => log::info!("frame {} {} = inactive", frame, name),
            }
        }
        for (name, m) in record.thermal_counters() {
            log::info!("frame {} {} = {} {}", frame, name, m.value, m.unit);
        }
        for (section, entries) in record.sections() {
            for (name, m) in entries {
                log::info!("frame {} {}/{} = {} {}", frame, section, name, m.value, m.unit);
            }
        }
    }

    fn publish_device_info(&mut self, info: &DeviceInfo) {
        for (key, value) in info.iter() {
            log::info!("{} = {}", key, value);
        }
    }

    fn set_connection(&mut self, connected: bool) {
        log::info!("connected = {}", connected);
    }
}
