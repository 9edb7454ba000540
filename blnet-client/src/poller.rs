//! Timer-driven polling state machine
//!
//! ```text
//! Uninitialized --tick--> Initializing --ok--> Ready --tick--> Ready
//!       ^                      |                 |  ^
//!       +-------- error -------+           error |  | ok
//!                                                v  |
//!                                              Faulted
//! ```
//!
//! Initialization is all-or-nothing: the device is identified and every
//! frame read once before anything is published. Once ready, a failed
//! read only clears the connection flag; the device metadata is kept and
//! the next tick tries again.

use crate::sink::RecordSink;
use crate::source::DataSource;
use blnet_core::SensorRecord;
use log::{error, info, warn};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Polling state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// No device metadata (initial state)
    Uninitialized,
    /// Identification in progress
    Initializing,
    /// Last cycle read every frame
    Ready,
    /// Last cycle failed; metadata kept, retried on the next tick
    Faulted,
}

impl PollState {
    /// Whether device metadata is known
    pub fn is_initialized(&self) -> bool {
        matches!(self, PollState::Ready | PollState::Faulted)
    }
}

/// Drives a [`DataSource`] and feeds a [`RecordSink`]
pub struct Poller<S: DataSource, K: RecordSink> {
    source: S,
    sink: K,
    state: PollState,
    frames: Vec<u8>,
    interval: Duration,
}

impl<S: DataSource, K: RecordSink> Poller<S, K> {
    pub fn new(source: S, sink: K, interval: Duration) -> Self {
        Self {
            source,
            sink,
            state: PollState::Uninitialized,
            frames: Vec::new(),
            interval,
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    /// Frames polled once initialized
    pub fn frames(&self) -> &[u8] {
        &self.frames
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn into_parts(self) -> (S, K) {
        (self.source, self.sink)
    }

    /// Run one poll cycle
    ///
    /// # Returns
    /// The state after the cycle
    pub async fn tick(&mut self) -> PollState {
        self.state = if self.state.is_initialized() {
            self.poll().await
        } else {
            self.state = PollState::Initializing;
            self.initialize().await
        };
        self.state
    }

    async fn initialize(&mut self) -> PollState {
        let discovery = match self.source.discover().await {
            Ok(discovery) => discovery,
            Err(e) => return self.abort_initialization(&e),
        };

        let mut records: Vec<(u8, SensorRecord)> = Vec::with_capacity(discovery.frames.len());
        for &frame in &discovery.frames {
            match self.source.read_record(frame).await {
                Ok(record) => records.push((frame, record)),
                Err(e) => return self.abort_initialization(&e),
            }
        }

        self.sink.publish_device_info(&discovery.info);
        for (frame, record) in &records {
            self.sink.publish(*frame, record);
        }
        self.sink.set_connection(true);
        info!("Initialized, polling frames {:?}", discovery.frames);
        self.frames = discovery.frames;
        PollState::Ready
    }

    fn abort_initialization(&mut self, e: &blnet_core::BlnetError) -> PollState {
        error!("Initialization failed: {}", e);
        self.source.reset();
        self.frames.clear();
        self.sink.set_connection(false);
        PollState::Uninitialized
    }

    async fn poll(&mut self) -> PollState {
        let mut failed = 0usize;
        for &frame in &self.frames {
            match self.source.read_record(frame).await {
                Ok(record) => self.sink.publish(frame, &record),
                Err(e) => {
                    failed += 1;
                    error!("Reading frame {} failed: {}", frame, e);
                }
            }
        }

        self.sink.set_connection(failed == 0);
        if failed == 0 {
            PollState::Ready
        } else {
            warn!("{} of {} frames failed, retrying next cycle", failed, self.frames.len());
            PollState::Faulted
        }
    }

    /// Poll on every interval tick until `cancel` fires
    ///
    /// The first tick fires immediately. A cycle in progress is finished,
    /// cancellation only stops the timer.
    pub async fn run(&mut self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Polling stopped");
                    break;
                }
                _ = interval.tick() => {
                    self.tick().await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{ChannelSink, SinkEvent};
    use crate::source::Discovery;
    use async_trait::async_trait;
    use blnet_core::{BlnetError, BlnetResult, DeviceInfo, Measurement};
    use std::collections::VecDeque;
    use tokio::sync::mpsc::UnboundedReceiver;

    /// Scripted source: each call pops the next outcome
    #[derive(Default)]
    struct Script {
        discoveries: VecDeque<BlnetResult<Discovery>>,
        reads: VecDeque<BlnetResult<SensorRecord>>,
        resets: usize,
    }

    #[async_trait]
    impl DataSource for Script {
        async fn discover(&mut self) -> BlnetResult<Discovery> {
            self.discoveries.pop_front().unwrap_or(Err(BlnetError::Timeout))
        }

        async fn read_record(&mut self, _frame: u8) -> BlnetResult<SensorRecord> {
            self.reads.pop_front().unwrap_or(Err(BlnetError::Timeout))
        }

        fn reset(&mut self) {
            self.resets += 1;
        }
    }

    fn discovery(frames: Vec<u8>) -> BlnetResult<Discovery> {
        Ok(Discovery {
            info: DeviceInfo::new().with("uvr_mode", format!("{}CAN", frames.len())),
            frames,
        })
    }

    fn record(value: f64) -> BlnetResult<SensorRecord> {
        let mut builder = SensorRecord::builder();
        builder.analog_input("S01", Measurement::new(value, "°C"));
        Ok(builder.build())
    }

    fn drain(rx: &mut UnboundedReceiver<SinkEvent>) -> Vec<SinkEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn poller(script: Script) -> (Poller<Script, ChannelSink>, UnboundedReceiver<SinkEvent>) {
        let (sink, rx) = ChannelSink::new();
        (Poller::new(script, sink, Duration::from_secs(60)), rx)
    }

    #[tokio::test]
    async fn test_initialization_reads_every_frame() {
        let script = Script {
            discoveries: VecDeque::from([discovery(vec![1, 2, 3])]),
            reads: VecDeque::from([record(1.0), record(2.0), record(3.0)]),
            ..Default::default()
        };
        let (mut poller, mut rx) = poller(script);

        assert_eq!(poller.tick().await, PollState::Ready);
        assert_eq!(poller.frames(), &[1, 2, 3]);

        let events = drain(&mut rx);
        assert_eq!(events.len(), 5);
        assert!(matches!(
            &events[0],
            SinkEvent::DeviceInfo(info) if info.get("uvr_mode") == Some("3CAN")
        ));
        assert!(matches!(&events[3], SinkEvent::Record { frame: 3, .. }));
        assert_eq!(events[4], SinkEvent::Connection(true));
    }

    #[tokio::test]
    async fn test_failed_frame_aborts_initialization() {
        let script = Script {
            discoveries: VecDeque::from([discovery(vec![1, 2])]),
            reads: VecDeque::from([
                record(1.0),
                Err(BlnetError::MaxRetriesExceeded { attempts: 5 }),
            ]),
            ..Default::default()
        };
        let (mut poller, mut rx) = poller(script);

        assert_eq!(poller.tick().await, PollState::Uninitialized);
        assert!(poller.frames().is_empty());
        assert_eq!(drain(&mut rx), vec![SinkEvent::Connection(false)]);

        let (script, _) = poller.into_parts();
        assert_eq!(script.resets, 1);
    }

    #[tokio::test]
    async fn test_initialization_retried_on_next_tick() {
        let script = Script {
            discoveries: VecDeque::from([Err(BlnetError::UnknownMode(0x42)), discovery(vec![1])]),
            reads: VecDeque::from([record(1.0)]),
            ..Default::default()
        };
        let (mut poller, _rx) = poller(script);

        assert_eq!(poller.tick().await, PollState::Uninitialized);
        assert_eq!(poller.tick().await, PollState::Ready);
    }

    #[tokio::test]
    async fn test_steady_state_fault_keeps_metadata() {
        let script = Script {
            discoveries: VecDeque::from([discovery(vec![1, 2])]),
            reads: VecDeque::from([
                record(1.0),
                record(2.0),
                // cycle 2: frame 1 ok, frame 2 fails
                record(1.5),
                Err(BlnetError::Timeout),
                // cycle 3
                record(1.6),
                record(2.6),
            ]),
            ..Default::default()
        };
        let (mut poller, mut rx) = poller(script);

        assert_eq!(poller.tick().await, PollState::Ready);
        drain(&mut rx);

        assert_eq!(poller.tick().await, PollState::Faulted);
        assert_eq!(poller.frames(), &[1, 2]);
        let events = drain(&mut rx);
        assert!(matches!(&events[0], SinkEvent::Record { frame: 1, .. }));
        assert_eq!(events.last(), Some(&SinkEvent::Connection(false)));

        assert_eq!(poller.tick().await, PollState::Ready);
        let events = drain(&mut rx);
        assert_eq!(events.len(), 3);
        assert_eq!(events.last(), Some(&SinkEvent::Connection(true)));

        let (script, _) = poller.into_parts();
        assert_eq!(script.resets, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_until_cancelled() {
        let script = Script {
            discoveries: VecDeque::from([discovery(vec![1])]),
            reads: VecDeque::from([record(1.0), record(2.0), record(3.0)]),
            ..Default::default()
        };
        let (mut poller, mut rx) = poller(script);
        let cancel = CancellationToken::new();

        let stopper = cancel.clone();
        tokio::spawn(async move {
            // ticks at 0 s, 60 s and 120 s
            tokio::time::sleep(Duration::from_secs(150)).await;
            stopper.cancel();
        });
        poller.run(cancel).await;

        let records = drain(&mut rx)
            .into_iter()
            .filter(|e| matches!(e, SinkEvent::Record { .. }))
            .count();
        assert_eq!(records, 3);
        assert_eq!(poller.state(), PollState::Ready);
    }
}
