//! Notification listeners.
//!
//! A [`Listener`] owns one subscribe session and runs two tasks: a receive
//! task that pulls notifications off the session into a queue, and a dispatch
//! task that decodes them, stores subscribed ones in the per-type [`Inbox`]
//! and echoes traced ones through the trace callback.
//!
//! Overload handling:
//!
//! - queue depth reaching `inpq_threshold` drops every subscription and trace
//!   (the inbox is kept) and keeps running
//! - queue depth reaching `inpq_max_size` runs the fatal-overflow handler,
//!   which exits the process unless replaced

pub mod inbox;
pub mod kind;
pub mod managed;
pub mod registry;

mod state;
mod worker;

pub use inbox::{HistoryEntry, HistoryRange, Inbox};
pub use kind::NotificationKind;
pub use managed::ManagedListener;
pub use registry::{ListenerRegistry, ListenerVariant};

use crate::error::listener::ListenerError;
use crate::listener::state::Shared;
use crate::listener::worker::{QueueItem, dispatch_loop, receive_loop};
use crate::transport::Transport;

use common::ErrorLocation;

use std::panic::Location;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{error, info, warn};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;

pub const DEFAULT_INPQ_MAX_SIZE: usize = 1000;
pub const DEFAULT_INPQ_THRESHOLD: usize = 100;
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(1000);
pub const DEFAULT_INBOX_SIZE: usize = 100;
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Called with each traced record.
pub type TraceCallback<K> = Arc<
    dyn Fn(&<K as NotificationKind>::Id, &<K as NotificationKind>::Record) + Send + Sync,
>;

/// Called with the listener name and queue depth on a fatal overflow.
pub type FatalOverflowHandler = Arc<dyn Fn(&str, usize) + Send + Sync>;

/// The default fatal-overflow action: exit with status 1.
pub fn exit_on_overflow() -> FatalOverflowHandler {
    Arc::new(|_: &str, _: usize| std::process::exit(1))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerSettings {
    pub inpq_max_size: usize,
    pub inpq_threshold: usize,
    pub poll_timeout: Duration,
    pub inbox_size: usize,
    pub page_size: usize,
}

impl Default for ListenerSettings {
    fn default() -> Self {
        Self {
            inpq_max_size: DEFAULT_INPQ_MAX_SIZE,
            inpq_threshold: DEFAULT_INPQ_THRESHOLD,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            inbox_size: DEFAULT_INBOX_SIZE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

struct Workers<T> {
    queue: UnboundedSender<QueueItem>,
    receive: JoinHandle<T>,
    dispatch: JoinHandle<()>,
}

/// A notification listener bound to one subscribe session.
///
/// Idle until the first [`register_notif_type`](Self::register_notif_type),
/// [`enable_trace`](Self::enable_trace) or [`start`](Self::start); back to
/// idle after [`stop`](Self::stop), after which it can be started again.
pub struct Listener<K: NotificationKind, T: Transport> {
    shared: Arc<Shared<K>>,
    session: Mutex<Option<T>>,
    workers: Mutex<Option<Workers<T>>>,
}

fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<K: NotificationKind, T: Transport> Listener<K, T> {
    /// Build an idle listener. Traced records print to stdout until a
    /// callback is set.
    pub fn new(name: impl Into<String>, kind: K, session: T, settings: ListenerSettings) -> Self {
        let kind = Arc::new(kind);
        let printer = Arc::clone(&kind);
        let trace_callback: TraceCallback<K> =
            Arc::new(move |_: &K::Id, record: &K::Record| {
                println!("{}", printer.format_record(record))
            });

        Self {
            shared: Arc::new(Shared::new(
                name.into(),
                kind,
                settings,
                trace_callback,
                exit_on_overflow(),
            )),
            session: Mutex::new(Some(session)),
            workers: Mutex::new(None),
        }
    }

    pub fn with_trace_callback(self, callback: TraceCallback<K>) -> Self {
        self.set_trace_callback(callback);
        self
    }

    pub fn with_fatal_overflow_handler(self, handler: FatalOverflowHandler) -> Self {
        self.shared.set_fatal_handler(handler);
        self
    }

    pub fn set_trace_callback(&self, callback: TraceCallback<K>) {
        self.shared.set_trace_callback(callback);
    }

    /// Also append every traced line to `path`; `None` stops saving.
    pub fn set_trace_file(&self, path: Option<PathBuf>) {
        self.shared.set_trace_file(path);
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn kind(&self) -> &K {
        &self.shared.kind
    }

    pub fn is_running(&self) -> bool {
        self.shared.is_running()
    }

    pub fn notif_types(&self) -> Vec<String> {
        self.shared.kind.notif_types()
    }

    /// Spawn the receive and dispatch tasks on the current tokio runtime.
    ///
    /// Starting a started listener is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::Runtime`] outside a tokio runtime, when the
    /// session was lost to a failed task, or when a fatal queue overflow
    /// halted the tasks and [`stop`](Self::stop) has not been called since.
    #[track_caller]
    pub fn start(&self) -> Result<(), ListenerError> {
        let mut workers = lock(&self.workers);
        if workers.is_some() {
            // Only a fatal overflow clears the run flag while tasks are held.
            if self.shared.is_running() {
                return Ok(());
            }
            return Err(ListenerError::Runtime {
                message: format!(
                    "listener '{}' halted after a queue overflow; stop it before starting again",
                    self.name()
                ),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let runtime = Handle::try_current().map_err(|e| ListenerError::Runtime {
            message: format!("listener '{}' needs a tokio runtime: {e}", self.name()),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let Some(session) = lock(&self.session).take() else {
            return Err(ListenerError::Runtime {
                message: format!("listener '{}' has no session", self.name()),
                location: ErrorLocation::from(Location::caller()),
            });
        };

        let (queue, pending) = mpsc::unbounded_channel();
        self.shared.depth.store(0, Ordering::SeqCst);
        self.shared.running.store(true, Ordering::SeqCst);

        let receive = runtime.spawn(receive_loop(
            session,
            queue.clone(),
            Arc::clone(&self.shared),
        ));
        let shared = Arc::clone(&self.shared);
        let dispatch = runtime.spawn_blocking(move || dispatch_loop(pending, shared));

        *workers = Some(Workers {
            queue,
            receive,
            dispatch,
        });
        info!("Listener '{}' started", self.name());
        Ok(())
    }

    /// Stop both tasks and clear the inbox. Subscriptions are kept.
    pub async fn stop(&self) {
        let workers = lock(&self.workers).take();
        let Some(workers) = workers else {
            return;
        };

        self.shared.running.store(false, Ordering::SeqCst);
        self.shared.lock_state().inbox.clear();
        // the dispatcher may already be gone after a failure
        let _ = workers.queue.send(QueueItem::End);
        drop(workers.queue);

        match workers.receive.await {
            Ok(session) => *lock(&self.session) = Some(session),
            Err(e) => error!("Listener '{}' receive task failed: {}", self.name(), e),
        }
        if let Err(e) = workers.dispatch.await {
            error!("Listener '{}' dispatch task failed: {}", self.name(), e);
        }

        info!("Listener '{}' stopped", self.name());
    }

    /// Stop and close the session.
    pub async fn close(&self) {
        self.stop().await;
        let session = lock(&self.session).take();
        if let Some(mut session) = session {
            session.close().await;
            *lock(&self.session) = Some(session);
        }
    }

    /// Subscribe to `name`, creating its inbox entry. Idempotent.
    pub fn register_notif_type(&self, name: &str) -> Result<(), ListenerError> {
        let id = self.shared.kind.lookup_notif_id(name)?;
        {
            let mut state = self.shared.lock_state();
            state.filters.insert(id.clone());
            state.inbox.ensure(id);
        }
        self.start()
    }

    /// Unsubscribe from `name` and drop its history.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::NotFound`] if `name` was never registered.
    pub fn unregister_notif_type(&self, name: &str) -> Result<(), ListenerError> {
        let id = self.shared.kind.lookup_notif_id(name)?;

        let mut state = self.shared.lock_state();
        let subscribed = state.filters.remove(&id);
        let stored = state.inbox.remove(&id);
        if !subscribed && !stored {
            return Err(ListenerError::not_found(name));
        }
        Ok(())
    }

    pub fn is_notif_type_registered(&self, name: &str) -> bool {
        self.shared
            .kind
            .lookup_notif_id(name)
            .is_ok_and(|id| self.shared.lock_state().filters.contains(&id))
    }

    pub fn is_filter_list_empty(&self) -> bool {
        self.shared.lock_state().filters.is_empty()
    }

    pub fn subscribed_notifs(&self) -> Vec<String> {
        let filters = self.shared.lock_state().filters.clone();
        self.shared.names_of(&filters)
    }

    pub fn traced_notifs(&self) -> Vec<String> {
        let traces = self.shared.lock_state().traces.clone();
        self.shared.names_of(&traces)
    }

    /// Echo every record of `name` through the trace callback.
    pub fn enable_trace(&self, name: &str) -> Result<(), ListenerError> {
        let id = self.shared.kind.lookup_notif_id(name)?;
        self.shared.lock_state().traces.insert(id);
        self.start()
    }

    pub fn enable_trace_all(&self) -> Result<(), ListenerError> {
        let ids = self
            .notif_types()
            .iter()
            .map(|name| self.shared.kind.lookup_notif_id(name))
            .collect::<Result<Vec<_>, _>>()?;
        self.shared.lock_state().traces.extend(ids);
        self.start()
    }

    /// Stop tracing `name`, or every type when `None`.
    pub fn disable_trace(&self, name: Option<&str>) -> Result<(), ListenerError> {
        match name {
            Some(name) => {
                let id = self.shared.kind.lookup_notif_id(name)?;
                self.shared.lock_state().traces.remove(&id);
            }
            None => self.shared.lock_state().traces.clear(),
        }
        Ok(())
    }

    /// Adjust the queue limits; `None` keeps the current value.
    pub fn set_inpq_limits(&self, max_size: Option<usize>, threshold: Option<usize>) {
        if let Some(max_size) = max_size {
            self.shared.inpq_max_size.store(max_size, Ordering::SeqCst);
        }
        if let Some(threshold) = threshold {
            self.shared.inpq_threshold.store(threshold, Ordering::SeqCst);
        }

        let (max_size, threshold) = self.inpq_limits();
        if threshold > max_size {
            warn!(
                "Listener '{}' threshold {} exceeds max size {}; soft overflow will never trigger",
                self.name(),
                threshold,
                max_size
            );
        }
        info!(
            "Listener '{}' queue limits: max size {}, threshold {}",
            self.name(),
            max_size,
            threshold
        );
    }

    /// `(inpq_max_size, inpq_threshold)`
    pub fn inpq_limits(&self) -> (usize, usize) {
        (
            self.shared.inpq_max_size.load(Ordering::SeqCst),
            self.shared.inpq_threshold.load(Ordering::SeqCst),
        )
    }

    /// Frames received but not yet taken by the dispatcher.
    pub fn queue_len(&self) -> usize {
        self.shared.depth.load(Ordering::SeqCst)
    }

    /// How many times a soft overflow dropped the subscriptions.
    pub fn soft_overflow_count(&self) -> usize {
        self.shared.soft_overflows.load(Ordering::SeqCst)
    }

    pub fn base_sequence(&self) -> u64 {
        self.shared.lock_state().inbox.base_sequence()
    }

    pub fn inbox_len(&self, name: &str) -> Result<usize, ListenerError> {
        let id = self.shared.kind.lookup_notif_id(name)?;
        self.shared
            .lock_state()
            .inbox
            .len(&id)
            .ok_or_else(|| ListenerError::not_found(name))
    }

    /// Copy out stored records of `name`.
    ///
    /// # Errors
    ///
    /// - [`ListenerError::NotFound`] - `name` has no inbox entry
    /// - [`ListenerError::InvalidRange`] - `PAGE 0` or a malformed `RANGE`
    pub fn list_messages(
        &self,
        range: HistoryRange,
        name: &str,
    ) -> Result<Vec<HistoryEntry<K::Record>>, ListenerError> {
        let id = self.shared.kind.lookup_notif_id(name)?;
        self.shared
            .lock_state()
            .inbox
            .select(&id, range, self.shared.page_size)
            .ok_or_else(|| ListenerError::not_found(name))?
    }

    /// Like [`list_messages`](Self::list_messages) but rendered as lines.
    pub fn format_messages(
        &self,
        range: HistoryRange,
        name: &str,
    ) -> Result<Vec<String>, ListenerError> {
        let id = self.shared.kind.lookup_notif_id(name)?;
        let entries = self.list_messages(range, name)?;
        Ok(entries
            .iter()
            .map(|entry| {
                self.shared
                    .kind
                    .format_message(entry.index, &id, &entry.record)
            })
            .collect())
    }
}

impl<K: NotificationKind, T: Transport> Drop for Listener<K, T> {
    fn drop(&mut self) {
        let workers = lock(&self.workers).take();
        if let Some(workers) = workers {
            self.shared.running.store(false, Ordering::SeqCst);
            let _ = workers.queue.send(QueueItem::End);
        }
    }
}
