//! Controller configuration and builder.

use std::sync::Arc;
use std::time::Duration;

use super::Controller;
use crate::notify::{Notification, Observer};
use crate::transport::Transport;
use crate::writer::WriterConfig;

/// Default number of bytes requested per device read.
pub const DEFAULT_READ_CHUNK: usize = 1000;

/// Default capacity of the reader → processor frame queue.
pub const DEFAULT_FRAME_QUEUE_CAPACITY: usize = 100;

/// Default sleep after a read that returned no data.
pub const DEFAULT_IDLE_BACKOFF: Duration = Duration::from_millis(1);

/// Default period of the transport-loss check.
pub const DEFAULT_MONITOR_INTERVAL: Duration = Duration::from_millis(100);

/// Runtime settings of a [`Controller`].
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Bytes requested per device read.
    pub read_chunk: usize,
    /// Capacity of the frame queue between reader and processor.
    pub frame_queue_capacity: usize,
    /// Sleep after an empty read.
    pub idle_backoff: Duration,
    /// Period of the transport-loss check.
    pub monitor_interval: Duration,
    /// Outbound writer settings.
    pub writer: WriterConfig,
    /// Give up on a bulk-scan step after this long. `None` waits forever.
    pub scan_timeout: Option<Duration>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            read_chunk: DEFAULT_READ_CHUNK,
            frame_queue_capacity: DEFAULT_FRAME_QUEUE_CAPACITY,
            idle_backoff: DEFAULT_IDLE_BACKOFF,
            monitor_interval: DEFAULT_MONITOR_INTERVAL,
            writer: WriterConfig::default(),
            scan_timeout: None,
        }
    }
}

/// Builder for a [`Controller`].
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use podwire::controller::ControllerBuilder;
/// use podwire::transport::MemoryDevice;
///
/// let controller = ControllerBuilder::new()
///     .scan_timeout(Duration::from_secs(2))
///     .notify(|n| println!("{:?}", n.kind))
///     .build(MemoryDevice::new());
/// assert!(!controller.is_running());
/// ```
pub struct ControllerBuilder {
    config: ControllerConfig,
    observer: Option<Observer>,
}

impl ControllerBuilder {
    pub fn new() -> Self {
        Self {
            config: ControllerConfig::default(),
            observer: None,
        }
    }

    /// Start from an existing configuration.
    pub fn with_config(config: ControllerConfig) -> Self {
        Self {
            config,
            observer: None,
        }
    }

    /// Bytes requested per device read.
    ///
    /// Default: 1000
    pub fn read_chunk(mut self, bytes: usize) -> Self {
        self.config.read_chunk = bytes;
        self
    }

    /// Capacity of the frame queue.
    ///
    /// Default: 100
    pub fn frame_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.frame_queue_capacity = capacity;
        self
    }

    /// Sleep after a read that returned nothing.
    ///
    /// Default: 1 ms
    pub fn idle_backoff(mut self, backoff: Duration) -> Self {
        self.config.idle_backoff = backoff;
        self
    }

    /// Period of the transport-loss check.
    ///
    /// Default: 100 ms
    pub fn monitor_interval(mut self, interval: Duration) -> Self {
        self.config.monitor_interval = interval;
        self
    }

    /// Writer channel capacity.
    ///
    /// Default: 64
    pub fn writer_channel_capacity(mut self, capacity: usize) -> Self {
        self.config.writer.channel_capacity = capacity;
        self
    }

    /// Bound each bulk-scan step.
    ///
    /// Default: none, a step waits until the device answers or the
    /// controller stops.
    pub fn scan_timeout(mut self, timeout: Duration) -> Self {
        self.config.scan_timeout = Some(timeout);
        self
    }

    /// Observer callback. Called from the dispatcher task, in order.
    pub fn notify<F>(mut self, callback: F) -> Self
    where
        F: Fn(Notification) + Send + Sync + 'static,
    {
        self.observer = Some(Arc::new(callback));
        self
    }

    pub fn build<T: Transport>(self, transport: T) -> Controller {
        Controller::new(Arc::new(transport), self.config, self.observer)
    }
}

impl Default for ControllerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryDevice;

    #[test]
    fn test_config_default() {
        let config = ControllerConfig::default();
        assert_eq!(config.read_chunk, DEFAULT_READ_CHUNK);
        assert_eq!(config.frame_queue_capacity, DEFAULT_FRAME_QUEUE_CAPACITY);
        assert_eq!(config.idle_backoff, DEFAULT_IDLE_BACKOFF);
        assert_eq!(config.monitor_interval, DEFAULT_MONITOR_INTERVAL);
        assert!(config.scan_timeout.is_none());
    }

    #[test]
    fn test_builder_method_chaining() {
        let builder = ControllerBuilder::new()
            .read_chunk(64)
            .frame_queue_capacity(8)
            .idle_backoff(Duration::from_millis(2))
            .monitor_interval(Duration::from_millis(10))
            .writer_channel_capacity(4)
            .scan_timeout(Duration::from_millis(500));

        assert_eq!(builder.config.read_chunk, 64);
        assert_eq!(builder.config.frame_queue_capacity, 8);
        assert_eq!(builder.config.writer.channel_capacity, 4);
        assert_eq!(builder.config.scan_timeout, Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_build_without_runtime() {
        let controller = ControllerBuilder::default().build(MemoryDevice::new());
        assert!(!controller.is_running());
    }
}
