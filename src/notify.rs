//! Observer notifications.
//!
//! Every parsed message and every controller lifecycle event is reported to
//! the observer as a [`Notification`]. Notifications are queued on an
//! unbounded channel and delivered by a single dispatcher task, so the
//! observer sees them in the order they were produced and a slow observer
//! never stalls the reader or the processor.
//!
//! # Example
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use podwire::notify::{spawn_dispatcher, ChangeKind, Notification};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = seen.clone();
//! let (notifier, task) = spawn_dispatcher(Arc::new(move |n: Notification| {
//!     sink.lock().unwrap().push(n.kind);
//! }));
//!
//! notifier.notify(Notification::signal(ChangeKind::NormalStart));
//! drop(notifier);
//! task.await.unwrap();
//! assert_eq!(*seen.lock().unwrap(), vec![ChangeKind::NormalStart]);
//! # }
//! ```

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::PodError;

/// What kind of change a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChangeKind {
    None,
    ActiveChange,
    ParameterChange,
    ParameterChangeMin,
    ParameterChangeMax,
    PresetChange,
    PresetLoad,
    SetChange,
    SetLoad,
    TempoChange,
    TypeChange,
    Warning,
    ErrorProcess,
    ErrorStop,
    InitDone,
    NormalStart,
    NormalStop,
    Progress,
}

impl ChangeKind {
    /// Lifecycle and error signals emitted by the controller itself.
    pub fn is_signal(self) -> bool {
        matches!(
            self,
            ChangeKind::ErrorProcess
                | ChangeKind::ErrorStop
                | ChangeKind::InitDone
                | ChangeKind::NormalStart
                | ChangeKind::NormalStop
                | ChangeKind::Progress
        )
    }
}

/// The entity a notification refers to.
///
/// Targets are plain ids; observers resolve them under the board lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Target {
    Board,
    Item(u32),
    ItemParam { item: u32, param: u32 },
    BoardParam(u32),
    Dt(u8),
    Preset { set: u8, preset: u8 },
    Set(u8),
    Progress(u8),
}

/// One observer notification.
#[derive(Debug)]
pub struct Notification {
    pub kind: ChangeKind,
    pub error: Option<PodError>,
    pub target: Option<Target>,
}

impl Notification {
    pub fn new(kind: ChangeKind, error: Option<PodError>, target: Option<Target>) -> Self {
        Self {
            kind,
            error,
            target,
        }
    }

    /// Signal without error or target.
    pub fn signal(kind: ChangeKind) -> Self {
        Self::new(kind, None, None)
    }

    /// Signal carrying an error.
    pub fn failure(kind: ChangeKind, error: PodError) -> Self {
        Self::new(kind, Some(error), None)
    }

    /// Bulk scan progress in percent.
    pub fn progress(percent: u8) -> Self {
        Self::new(ChangeKind::Progress, None, Some(Target::Progress(percent)))
    }
}

/// Observer callback.
pub type Observer = Arc<dyn Fn(Notification) + Send + Sync>;

/// Observer that drops everything.
pub fn noop_observer() -> Observer {
    Arc::new(|_| {})
}

/// Cloneable sending side of the dispatcher queue.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    /// Queue a notification. Never blocks; safe from blocking threads.
    pub fn notify(&self, notification: Notification) {
        if let Err(e) = self.tx.send(notification) {
            tracing::debug!("Notification dropped, dispatcher gone: {:?}", e.0.kind);
        }
    }

    /// Whether the dispatcher task has exited.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Spawn the dispatcher task.
///
/// The task runs until every [`Notifier`] clone has been dropped.
pub fn spawn_dispatcher(observer: Observer) -> (Notifier, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<Notification>();

    let task = tokio::spawn(async move {
        while let Some(notification) = rx.recv().await {
            if let Some(err) = &notification.error {
                tracing::debug!("{:?}: {}", notification.kind, err);
            }
            observer(notification);
        }
    });

    (Notifier { tx }, task)
}
