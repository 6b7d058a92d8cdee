//! Controller - device lifecycle, background tasks and the action API.
//!
//! A running controller owns four tasks:
//! - the reader, on the blocking pool, turning device reads into raw frames
//! - the processor, reassembling frames and applying messages to the board
//! - the monitor, stopping the controller when the device goes away
//! - the writer (see [`crate::writer`])
//!
//! Observer notifications are delivered by a dispatcher task that lives
//! as long as the controller.
//!
//! # Lifecycle
//!
//! ```text
//! Stopped ─► Starting ─► Running ─► Stopping ─► Stopped
//! ```
//!
//! # Example
//!
//! ```
//! use podwire::controller::Controller;
//! use podwire::transport::MemoryDevice;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> podwire::Result<()> {
//! let controller = Controller::builder().build(MemoryDevice::new());
//! controller.start("pod").await?;
//! controller.set_item_active(4, true).await?;
//! controller.stop().await?;
//! # Ok(())
//! # }
//! ```

mod action;
mod config;

pub use config::{
    ControllerBuilder, ControllerConfig, DEFAULT_FRAME_QUEUE_CAPACITY, DEFAULT_IDLE_BACKOFF,
    DEFAULT_MONITOR_INTERVAL, DEFAULT_READ_CHUNK,
};

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, info, warn};

use crate::error::{PodError, Result};
use crate::message::{Assembler, Message, MessageKind};
use crate::model::catalog;
use crate::model::view::BoardView;
use crate::model::{ItemRole, SharedBoard};
use crate::notify::{noop_observer, spawn_dispatcher, ChangeKind, Notification, Notifier, Observer};
use crate::protocol::{FrameKind, RawFrame};
use crate::transport::{DeviceInfo, Transport};
use crate::writer::{spawn_writer_task, WriterHandle};

/// Externally visible lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ControllerState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

struct Running {
    device: String,
    stop_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
    writer: WriterHandle,
    writer_task: JoinHandle<Result<()>>,
}

enum Lifecycle {
    Stopped,
    Starting,
    Running(Running),
    Stopping,
}

impl Lifecycle {
    fn state(&self) -> ControllerState {
        match self {
            Lifecycle::Stopped => ControllerState::Stopped,
            Lifecycle::Starting => ControllerState::Starting,
            Lifecycle::Running(_) => ControllerState::Running,
            Lifecycle::Stopping => ControllerState::Stopping,
        }
    }
}

fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn join_error(e: JoinError) -> PodError {
    PodError::Device(format!("device task failed: {}", e))
}

/// Clears the scan flag when a bulk scan ends.
struct ScanGuard<'a> {
    busy: &'a AtomicBool,
}

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Hand-off between a bulk scan and the processor: the scan arms the slot
/// with the message kind it waits for, the processor fires it once that
/// message has been applied.
struct Rendezvous {
    slot: Mutex<Option<(MessageKind, oneshot::Sender<()>)>>,
    busy: AtomicBool,
}

impl Rendezvous {
    fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            busy: AtomicBool::new(false),
        }
    }

    fn begin(&self) -> Result<ScanGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| PodError::Validation("a bulk scan is already running".to_string()))?;
        Ok(ScanGuard { busy: &self.busy })
    }

    fn arm(&self, kind: MessageKind) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        *guard(&self.slot) = Some((kind, tx));
        rx
    }

    fn complete(&self, kind: MessageKind) {
        let mut slot = guard(&self.slot);
        if matches!(slot.as_ref(), Some((expected, _)) if *expected == kind) {
            if let Some((_, tx)) = slot.take() {
                let _ = tx.send(());
            }
        }
    }

    fn disarm(&self) {
        guard(&self.slot).take();
    }
}

/// Reassembly state owned by the processor.
#[derive(Default)]
struct Inbox {
    assembler: Assembler,
    /// Set after a message is discarded, cleared by the next Begin frame.
    discarding: bool,
}

pub(crate) struct Inner {
    config: ControllerConfig,
    transport: Arc<dyn Transport>,
    board: SharedBoard,
    observer: Observer,
    notifier: Mutex<Option<Notifier>>,
    lifecycle: Mutex<Lifecycle>,
    scan: Rendezvous,
}

impl Inner {
    fn notify(&self, notification: Notification) {
        match guard(&self.notifier).as_ref() {
            Some(notifier) => notifier.notify(notification),
            None => debug!("No dispatcher, dropping {:?}", notification.kind),
        }
    }

    /// Spawn the dispatcher unless one is alive. Needs a runtime.
    fn ensure_dispatcher(&self) {
        let mut slot = guard(&self.notifier);
        if slot.as_ref().map_or(true, Notifier::is_closed) {
            let (notifier, _task) = spawn_dispatcher(self.observer.clone());
            *slot = Some(notifier);
        }
    }

    fn state(&self) -> ControllerState {
        guard(&self.lifecycle).state()
    }

    fn writer(&self) -> Result<WriterHandle> {
        match &*guard(&self.lifecycle) {
            Lifecycle::Running(running) => Ok(running.writer.clone()),
            _ => Err(PodError::NotRunning),
        }
    }

    /// Writer plus a stop-signal receiver, for multi-step operations.
    fn session(&self) -> Result<(WriterHandle, watch::Receiver<bool>)> {
        match &*guard(&self.lifecycle) {
            Lifecycle::Running(running) => {
                Ok((running.writer.clone(), running.stop_tx.subscribe()))
            }
            _ => Err(PodError::NotRunning),
        }
    }

    fn signal_stop(&self) {
        if let Lifecycle::Running(running) = &*guard(&self.lifecycle) {
            running.stop_tx.send_replace(true);
        }
    }

    /// Stop in the background after a transport fault.
    ///
    /// Called from the controller's own tasks, which must not wait for
    /// themselves.
    fn fault(self: &Arc<Self>, error: PodError) {
        error!("Stopping on transport fault: {}", error);
        self.signal_stop();
        let inner = self.clone();
        tokio::spawn(async move {
            let _ = inner.halt(Some(error)).await;
        });
    }

    fn spawn_tasks(self: &Arc<Self>, device: &str) -> Running {
        let (stop_tx, stop_rx) = watch::channel(false);
        let (frame_tx, frame_rx) = mpsc::channel(self.config.frame_queue_capacity);
        let (writer, writer_task) =
            spawn_writer_task(self.transport.clone(), self.config.writer.clone());

        let reader = {
            let inner = self.clone();
            let stop_rx = stop_rx.clone();
            tokio::task::spawn_blocking(move || inner.read_loop(frame_tx, stop_rx))
        };
        let processor = tokio::spawn(self.clone().process_loop(frame_rx, stop_rx.clone()));
        let monitor = tokio::spawn(self.clone().monitor_loop(writer.clone(), stop_rx));

        Running {
            device: device.to_string(),
            stop_tx,
            tasks: vec![reader, processor, monitor],
            writer,
            writer_task,
        }
    }

    /// Reader loop, runs on the blocking pool.
    fn read_loop(self: Arc<Self>, frames: mpsc::Sender<RawFrame>, stop_rx: watch::Receiver<bool>) {
        let chunk = self.config.read_chunk;
        let backoff = self.config.idle_backoff;

        while !*stop_rx.borrow() && !frames.is_closed() {
            match self.transport.read(chunk) {
                Ok(buf) if buf.is_empty() => std::thread::sleep(backoff),
                Ok(buf) => {
                    let frame = RawFrame::decode(buf);
                    debug!(
                        "Read {:?} frame, {} bytes",
                        frame.kind(),
                        frame.payload().len()
                    );
                    if frames.blocking_send(frame).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    if !*stop_rx.borrow() {
                        self.fault(e);
                    }
                    break;
                }
            }
        }
        debug!("Reader stopped");
    }

    async fn process_loop(
        self: Arc<Self>,
        mut frames: mpsc::Receiver<RawFrame>,
        mut stop_rx: watch::Receiver<bool>,
    ) {
        let mut inbox = Inbox::default();
        loop {
            tokio::select! {
                biased;
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        break;
                    }
                }
                frame = frames.recv() => match frame {
                    Some(frame) => self.feed(&mut inbox, &frame),
                    None => break,
                },
            }
        }
        debug!("Processor stopped");
    }

    /// Push one frame; a Begin that interrupts a partial message starts
    /// the next one after the partial message is dropped. Once a message
    /// is discarded its remaining continuations are dropped silently.
    fn feed(&self, inbox: &mut Inbox, frame: &RawFrame) {
        if inbox.discarding {
            if frame.kind() == FrameKind::Continuation {
                debug!("Dropping continuation of a discarded message");
                return;
            }
            inbox.discarding = false;
        }

        let restart = frame.kind() == FrameKind::Begin && !inbox.assembler.is_empty();
        match inbox.assembler.push(frame) {
            Ok(false) => {}
            Ok(true) => {
                if let Some(message) = std::mem::take(&mut inbox.assembler).into_message() {
                    self.apply(&message);
                }
            }
            Err(e) => {
                warn!("Discarding message: {}", e);
                inbox.assembler = Assembler::new();
                self.notify(Notification::failure(ChangeKind::ErrorProcess, e));
                if restart {
                    self.feed(inbox, frame);
                } else {
                    inbox.discarding = true;
                }
            }
        }
    }

    fn apply(&self, message: &Message) {
        let outcome = {
            let mut board = self.board.lock();
            message.parse(&mut board)
        };
        debug!("{} applied: {:?}", message.name(), outcome.kind);
        if outcome.kind != ChangeKind::None {
            self.notify(outcome.into_notification());
        }
        self.scan.complete(message.kind());
    }

    async fn monitor_loop(self: Arc<Self>, writer: WriterHandle, mut stop_rx: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.config.monitor_interval);
        ticker.tick().await;
        loop {
            tokio::select! {
                biased;
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if !self.transport.is_open() {
                        self.fault(PodError::ConnectionClosed);
                        break;
                    }
                    if writer.is_closed() {
                        self.fault(PodError::Device("writer stopped".to_string()));
                        break;
                    }
                }
            }
        }
    }

    /// Stop the tasks, then close the transport.
    async fn halt(&self, fault: Option<PodError>) -> Result<()> {
        let running = {
            let mut lifecycle = guard(&self.lifecycle);
            match std::mem::replace(&mut *lifecycle, Lifecycle::Stopping) {
                Lifecycle::Running(running) => running,
                other => {
                    *lifecycle = other;
                    return Err(PodError::NotRunning);
                }
            }
        };

        info!("Stopping controller on {}", running.device);
        running.stop_tx.send_replace(true);
        self.scan.disarm();
        for task in running.tasks {
            if let Err(e) = task.await {
                error!("Controller task failed: {}", e);
            }
        }
        drop(running.writer);
        match running.writer_task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Writer exited with error: {}", e),
            Err(e) => error!("Writer task failed: {}", e),
        }

        let transport = self.transport.clone();
        let closed = tokio::task::spawn_blocking(move || transport.close())
            .await
            .unwrap_or_else(|e| Err(join_error(e)));
        *guard(&self.lifecycle) = Lifecycle::Stopped;

        match (fault, closed) {
            (Some(fault), closed) => {
                if let Err(e) = closed {
                    warn!("Close after fault failed: {}", e);
                }
                self.notify(Notification::failure(ChangeKind::ErrorStop, fault));
                Ok(())
            }
            (None, Ok(())) => {
                info!("Controller stopped");
                self.notify(Notification::signal(ChangeKind::NormalStop));
                Ok(())
            }
            (None, Err(e)) => {
                error!("Closing the device failed: {}", e);
                self.notify(Notification::failure(
                    ChangeKind::ErrorStop,
                    PodError::Device(e.to_string()),
                ));
                Err(e)
            }
        }
    }

    /// Wait for the armed response, the stop signal or the scan timeout.
    async fn wait_for(
        &self,
        answer: oneshot::Receiver<()>,
        mut stop_rx: watch::Receiver<bool>,
    ) -> Result<()> {
        let wait = async {
            tokio::select! {
                answered = answer => answered.map_err(|_| PodError::NotRunning),
                _ = stop_rx.wait_for(|stopped| *stopped) => Err(PodError::NotRunning),
            }
        };
        let result = match self.config.scan_timeout {
            Some(timeout) => tokio::time::timeout(timeout, wait)
                .await
                .unwrap_or(Err(PodError::ScanTimeout)),
            None => wait.await,
        };
        if result.is_err() {
            self.scan.disarm();
        }
        result
    }
}

/// Editor-side controller of one device.
///
/// Cheap to clone; clones drive the same device and share one board.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<Inner>,
}

impl Controller {
    pub fn builder() -> ControllerBuilder {
        ControllerBuilder::new()
    }

    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        config: ControllerConfig,
        observer: Option<Observer>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                transport,
                board: SharedBoard::new(),
                observer: observer.unwrap_or_else(noop_observer),
                notifier: Mutex::new(None),
                lifecycle: Mutex::new(Lifecycle::Stopped),
                scan: Rendezvous::new(),
            }),
        }
    }

    /// Open `device` and start the background tasks.
    ///
    /// Emits `NormalStart` then `InitDone`. If the device cannot be opened
    /// the controller stays stopped and `ErrorStop` is emitted.
    pub async fn start(&self, device: &str) -> Result<()> {
        {
            let mut lifecycle = guard(&self.inner.lifecycle);
            if !matches!(*lifecycle, Lifecycle::Stopped) {
                return Err(PodError::AlreadyRunning);
            }
            *lifecycle = Lifecycle::Starting;
        }
        self.inner.ensure_dispatcher();

        let transport = self.inner.transport.clone();
        let name = device.to_string();
        let opened = tokio::task::spawn_blocking(move || transport.open(&name))
            .await
            .unwrap_or_else(|e| Err(join_error(e)));
        if let Err(e) = opened {
            error!("Cannot open device {}: {}", device, e);
            *guard(&self.inner.lifecycle) = Lifecycle::Stopped;
            self.inner.notify(Notification::failure(
                ChangeKind::ErrorStop,
                PodError::Device(e.to_string()),
            ));
            return Err(e);
        }

        {
            let mut lifecycle = guard(&self.inner.lifecycle);
            *lifecycle = Lifecycle::Running(self.inner.spawn_tasks(device));
        }
        info!("Controller started on {}", device);
        self.inner.notify(Notification::signal(ChangeKind::NormalStart));
        self.inner.notify(Notification::signal(ChangeKind::InitDone));
        Ok(())
    }

    /// Stop the tasks and close the device.
    ///
    /// Emits `NormalStop`, or `ErrorStop` if closing fails.
    pub async fn stop(&self) -> Result<()> {
        self.inner.halt(None).await
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state() == ControllerState::Running
    }

    pub fn state(&self) -> ControllerState {
        self.inner.state()
    }

    /// Devices the transport can open.
    pub fn list_devices(&self) -> Result<Vec<DeviceInfo>> {
        self.inner.transport.list_devices()
    }

    /// Device opened by the last successful start, while running.
    pub fn current_device(&self) -> Option<String> {
        match &*guard(&self.inner.lifecycle) {
            Lifecycle::Running(running) => Some(running.device.clone()),
            _ => None,
        }
    }

    /// Handle to the board lock, for observers resolving notification targets.
    pub fn board(&self) -> SharedBoard {
        self.inner.board.clone()
    }

    /// Serializable copy of the board.
    pub fn snapshot(&self) -> BoardView {
        BoardView::from(&*self.inner.board.lock())
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    pub fn amp_models(&self) -> Vec<&'static str> {
        catalog::names(ItemRole::Amp)
    }

    pub fn cab_models(&self) -> Vec<&'static str> {
        catalog::names(ItemRole::Cab)
    }

    /// Pedal models by category.
    pub fn pedal_models(&self) -> BTreeMap<&'static str, Vec<&'static str>> {
        catalog::pedal_names()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::testing::{inbound, put};
    use crate::notify::Target;
    use crate::transport::MemoryDevice;
    use std::time::Duration;

    type Seen = Arc<Mutex<Vec<(ChangeKind, Option<Target>)>>>;

    fn recorder() -> (Seen, ControllerBuilder) {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let builder = Controller::builder()
            .monitor_interval(Duration::from_millis(10))
            .notify(move |n| sink.lock().unwrap().push((n.kind, n.target)));
        (seen, builder)
    }

    fn kinds(seen: &Seen) -> Vec<ChangeKind> {
        seen.lock().unwrap().iter().map(|(k, _)| *k).collect()
    }

    async fn wait_until<F: Fn() -> bool>(f: F) {
        for _ in 0..400 {
            if f() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached");
    }

    fn active_change(item: u32, active: u32) -> Vec<u8> {
        let mut msg = inbound(MessageKind::ActiveChange);
        put(&mut msg, 12, &item.to_le_bytes());
        put(&mut msg, 16, &active.to_le_bytes());
        msg
    }

    #[test]
    fn test_rendezvous_only_fires_armed_kind() {
        let scan = Rendezvous::new();
        let mut rx = scan.arm(MessageKind::SetLoad);
        scan.complete(MessageKind::PresetLoad);
        assert!(rx.try_recv().is_err());
        scan.complete(MessageKind::SetLoad);
        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn test_second_scan_rejected() {
        let scan = Rendezvous::new();
        let first = scan.begin().unwrap();
        assert!(matches!(scan.begin(), Err(PodError::Validation(_))));
        drop(first);
        assert!(scan.begin().is_ok());
    }

    #[tokio::test]
    async fn test_start_stop_notifications() {
        let (seen, builder) = recorder();
        let device = MemoryDevice::new();
        let controller = builder.build(device.clone());

        controller.start("pod").await.unwrap();
        assert!(controller.is_running());
        assert_eq!(controller.current_device().as_deref(), Some("pod"));
        assert!(device.is_open());
        assert!(matches!(
            controller.start("pod").await,
            Err(PodError::AlreadyRunning)
        ));

        controller.stop().await.unwrap();
        assert_eq!(controller.state(), ControllerState::Stopped);
        assert!(!device.is_open());
        assert!(matches!(controller.stop().await, Err(PodError::NotRunning)));

        wait_until(|| kinds(&seen).len() >= 3).await;
        assert_eq!(
            kinds(&seen),
            vec![
                ChangeKind::NormalStart,
                ChangeKind::InitDone,
                ChangeKind::NormalStop
            ]
        );
    }

    #[tokio::test]
    async fn test_start_failure_stays_stopped() {
        let (seen, builder) = recorder();
        let device = MemoryDevice::new();
        device.fail_open(true);
        let controller = builder.build(device);

        assert!(controller.start("pod").await.is_err());
        assert_eq!(controller.state(), ControllerState::Stopped);
        wait_until(|| kinds(&seen) == vec![ChangeKind::ErrorStop]).await;

        assert!(matches!(
            controller.start("missing").await,
            Err(PodError::Io(_))
        ));
    }

    #[tokio::test]
    async fn test_close_failure_reports_error_stop() {
        let (seen, builder) = recorder();
        let device = MemoryDevice::new();
        let controller = builder.build(device.clone());
        controller.start("pod").await.unwrap();

        device.fail_close(true);
        assert!(controller.stop().await.is_err());
        assert_eq!(controller.state(), ControllerState::Stopped);
        wait_until(|| kinds(&seen).last() == Some(&ChangeKind::ErrorStop)).await;
    }

    #[tokio::test]
    async fn test_processes_unsolicited_message() {
        let (seen, builder) = recorder();
        let device = MemoryDevice::new();
        let controller = builder.build(device.clone());
        controller.start("pod").await.unwrap();

        device.push_message(&active_change(6, 1));
        wait_until(|| kinds(&seen).contains(&ChangeKind::ActiveChange)).await;
        assert!(controller.board().lock().rig().item(6).unwrap().active());
        assert!(seen
            .lock()
            .unwrap()
            .contains(&(ChangeKind::ActiveChange, Some(Target::Item(6)))));

        controller.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_message_reported() {
        let (seen, builder) = recorder();
        let device = MemoryDevice::new();
        let controller = builder.build(device.clone());
        controller.start("pod").await.unwrap();

        let mut unknown = active_change(6, 1);
        put(&mut unknown, 6, &0x4242u16.to_le_bytes());
        device.push_message(&unknown);
        device.push_message(&active_change(7, 1));

        wait_until(|| kinds(&seen).contains(&ChangeKind::ActiveChange)).await;
        let kinds = kinds(&seen);
        let error = kinds.iter().position(|k| *k == ChangeKind::ErrorProcess);
        let change = kinds.iter().position(|k| *k == ChangeKind::ActiveChange);
        assert!(error.unwrap() < change.unwrap());

        controller.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_multi_frame_message_reported_once() {
        let (seen, builder) = recorder();
        let device = MemoryDevice::new();
        let controller = builder.build(device.clone());
        controller.start("pod").await.unwrap();

        let mut unknown = inbound(MessageKind::PresetLoad);
        put(&mut unknown, 6, &0x4242u16.to_le_bytes());
        device.push_message(&unknown);
        device.push_message(&active_change(7, 1));

        wait_until(|| kinds(&seen).contains(&ChangeKind::ActiveChange)).await;
        let kinds = kinds(&seen);
        let errors = kinds.iter().filter(|k| **k == ChangeKind::ErrorProcess).count();
        assert_eq!(errors, 1);
        let error = kinds.iter().position(|k| *k == ChangeKind::ErrorProcess);
        let change = kinds.iter().position(|k| *k == ChangeKind::ActiveChange);
        assert!(error.unwrap() < change.unwrap());
        assert!(controller.board().lock().rig().item(7).unwrap().active());

        controller.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_begin_interrupting_message_restarts() {
        let (seen, builder) = recorder();
        let device = MemoryDevice::new();
        let controller = builder.build(device.clone());
        controller.start("pod").await.unwrap();

        let load = inbound(MessageKind::PresetLoad);
        let partial = RawFrame::new(FrameKind::Begin, bytes::Bytes::copy_from_slice(&load[..60]));
        device.push_chunk(partial.encode());
        device.push_message(&active_change(5, 1));

        wait_until(|| kinds(&seen).contains(&ChangeKind::ActiveChange)).await;
        assert!(kinds(&seen).contains(&ChangeKind::ErrorProcess));
        assert!(controller.board().lock().rig().item(5).unwrap().active());

        controller.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_device_loss_stops_with_error() {
        let (seen, builder) = recorder();
        let device = MemoryDevice::new();
        let controller = builder.build(device.clone());
        controller.start("pod").await.unwrap();

        device.disconnect();
        wait_until(|| controller.state() == ControllerState::Stopped).await;
        wait_until(|| kinds(&seen).last() == Some(&ChangeKind::ErrorStop)).await;
        assert!(!kinds(&seen).contains(&ChangeKind::NormalStop));

        controller.start("pod").await.unwrap();
        assert!(controller.is_running());
        controller.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_stopped_controller_rejects_actions() {
        let controller = Controller::builder().build(MemoryDevice::new());
        assert!(matches!(
            controller.set_item_active(4, true).await,
            Err(PodError::NotRunning)
        ));
        assert!(matches!(
            controller.query_all_sets().await,
            Err(PodError::NotRunning)
        ));
        assert_eq!(controller.snapshot().rig.items.len(), 12);
    }
}
