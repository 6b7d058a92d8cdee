//! Dedicated writer task for outbound messages.
//!
//! Actions never touch the transport themselves. They hand complete
//! encoded messages to the writer through an mpsc channel, and the writer
//! splits each message into raw frames and writes them in order.
//!
//! # Architecture
//!
//! ```text
//! Action 1 ─┐
//! Action 2 ─┼─► mpsc::Sender<Bytes> ─► Writer (blocking pool) ─► Transport
//! Action N ─┘
//! ```
//!
//! The writer runs on tokio's blocking pool because transport writes are
//! blocking calls.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::error::{PodError, Result};
use crate::protocol::split_message;
use crate::transport::Transport;

/// Default channel capacity.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Maximum messages drained from the channel per wake-up.
const MAX_BATCH_SIZE: usize = 16;

/// Configuration for the writer task.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Channel capacity for the message queue.
    pub channel_capacity: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Handle for sending messages to the writer task.
///
/// This is cheaply cloneable; every action gets its own clone.
#[derive(Clone)]
pub struct WriterHandle {
    tx: mpsc::Sender<Bytes>,
    pending: Arc<AtomicUsize>,
}

impl WriterHandle {
    fn new(tx: mpsc::Sender<Bytes>, pending: Arc<AtomicUsize>) -> Self {
        Self { tx, pending }
    }

    /// Queue one complete message.
    ///
    /// Waits when the channel is full. Fails with `ConnectionClosed` once
    /// the writer has exited.
    pub async fn send(&self, message: Bytes) -> Result<()> {
        self.pending.fetch_add(1, Ordering::AcqRel);
        self.tx.send(message).await.map_err(|_| {
            self.pending.fetch_sub(1, Ordering::Release);
            PodError::ConnectionClosed
        })
    }

    /// Get the number of messages queued but not yet written.
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Whether the writer task has exited.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Spawn the writer task and return a handle for sending messages.
///
/// The task ends cleanly once every handle is dropped, or with the first
/// transport error.
pub fn spawn_writer_task(
    transport: Arc<dyn Transport>,
    config: WriterConfig,
) -> (WriterHandle, JoinHandle<Result<()>>) {
    let (tx, rx) = mpsc::channel(config.channel_capacity);
    let pending = Arc::new(AtomicUsize::new(0));
    let handle = WriterHandle::new(tx, pending.clone());

    let task = tokio::task::spawn_blocking(move || {
        let result = writer_loop(rx, transport.as_ref(), &pending);
        if let Err(e) = &result {
            error!("Writer stopped: {}", e);
        }
        result
    });

    (handle, task)
}

/// Spawn the writer task with default configuration.
pub fn spawn_writer_task_default(
    transport: Arc<dyn Transport>,
) -> (WriterHandle, JoinHandle<Result<()>>) {
    spawn_writer_task(transport, WriterConfig::default())
}

fn writer_loop(
    mut rx: mpsc::Receiver<Bytes>,
    transport: &dyn Transport,
    pending: &AtomicUsize,
) -> Result<()> {
    while let Some(first) = rx.blocking_recv() {
        let mut batch = Vec::with_capacity(MAX_BATCH_SIZE);
        batch.push(first);
        while batch.len() < MAX_BATCH_SIZE {
            match rx.try_recv() {
                Ok(message) => batch.push(message),
                Err(_) => break,
            }
        }

        let batch_size = batch.len();
        let result = batch
            .iter()
            .try_for_each(|message| write_message(transport, message));
        pending.fetch_sub(batch_size, Ordering::Release);
        result?;
    }
    Ok(())
}

/// Write one message as a sequence of raw frames.
fn write_message(transport: &dyn Transport, message: &Bytes) -> Result<()> {
    let frames = split_message(message);
    debug!("Writing {} bytes in {} frames", message.len(), frames.len());
    for frame in frames {
        let wire = frame.encode();
        let written = transport.write(&wire)?;
        if written != wire.len() {
            return Err(PodError::Io(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                format!("short write: {} of {} bytes", written, wire.len()),
            )));
        }
    }
    Ok(())
}
