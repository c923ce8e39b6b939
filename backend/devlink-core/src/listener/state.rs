use crate::listener::inbox::Inbox;
use crate::listener::kind::NotificationKind;
use crate::listener::{FatalOverflowHandler, ListenerSettings, TraceCallback};

use std::collections::BTreeSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use log::{error, warn};

/// Subscriptions and history of one listener.
pub(crate) struct SubscriptionState<K: NotificationKind> {
    pub(crate) filters: BTreeSet<K::Id>,
    pub(crate) traces: BTreeSet<K::Id>,
    pub(crate) inbox: Inbox<K::Id, K::Record>,
}

/// Everything the receive and dispatch tasks share with the listener handle.
pub(crate) struct Shared<K: NotificationKind> {
    pub(crate) name: String,
    pub(crate) kind: Arc<K>,
    pub(crate) poll_timeout: Duration,
    pub(crate) page_size: usize,
    pub(crate) running: AtomicBool,
    pub(crate) depth: AtomicUsize,
    pub(crate) inpq_max_size: AtomicUsize,
    pub(crate) inpq_threshold: AtomicUsize,
    pub(crate) soft_overflows: AtomicUsize,
    state: Mutex<SubscriptionState<K>>,
    trace_callback: RwLock<TraceCallback<K>>,
    trace_file: Mutex<Option<PathBuf>>,
    fatal_handler: RwLock<FatalOverflowHandler>,
}

impl<K: NotificationKind> Shared<K> {
    pub(crate) fn new(
        name: String,
        kind: Arc<K>,
        settings: ListenerSettings,
        trace_callback: TraceCallback<K>,
        fatal_handler: FatalOverflowHandler,
    ) -> Self {
        Self {
            name,
            kind,
            poll_timeout: settings.poll_timeout,
            page_size: settings.page_size,
            running: AtomicBool::new(false),
            depth: AtomicUsize::new(0),
            inpq_max_size: AtomicUsize::new(settings.inpq_max_size),
            inpq_threshold: AtomicUsize::new(settings.inpq_threshold),
            soft_overflows: AtomicUsize::new(0),
            state: Mutex::new(SubscriptionState {
                filters: BTreeSet::new(),
                traces: BTreeSet::new(),
                inbox: Inbox::new(settings.inbox_size),
            }),
            trace_callback: RwLock::new(trace_callback),
            trace_file: Mutex::new(None),
            fatal_handler: RwLock::new(fatal_handler),
        }
    }

    pub(crate) fn lock_state(&self) -> MutexGuard<'_, SubscriptionState<K>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub(crate) fn set_trace_callback(&self, callback: TraceCallback<K>) {
        *self
            .trace_callback
            .write()
            .unwrap_or_else(PoisonError::into_inner) = callback;
    }

    pub(crate) fn set_fatal_handler(&self, handler: FatalOverflowHandler) {
        *self
            .fatal_handler
            .write()
            .unwrap_or_else(PoisonError::into_inner) = handler;
    }

    pub(crate) fn set_trace_file(&self, path: Option<PathBuf>) {
        *self.trace_file.lock().unwrap_or_else(PoisonError::into_inner) = path;
    }

    pub(crate) fn names_of<'a>(&self, ids: impl IntoIterator<Item = &'a K::Id>) -> Vec<String> {
        ids.into_iter().map(|id| self.kind.notif_name(id)).collect()
    }

    /// Invoke the fatal-overflow action for a queue holding `depth` frames.
    pub(crate) fn fatal_overflow(&self, depth: usize) {
        self.running.store(false, Ordering::SeqCst);
        let handler = self
            .fatal_handler
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        handler(&self.name, depth);
    }

    /// Drop every filter and trace so the dispatcher can catch up. The inbox
    /// is kept.
    pub(crate) fn soft_overflow(&self, depth: usize) {
        let dropped = {
            let mut state = self.lock_state();
            if state.filters.is_empty() && state.traces.is_empty() {
                return;
            }
            let dropped: BTreeSet<K::Id> = state
                .filters
                .iter()
                .chain(state.traces.iter())
                .cloned()
                .collect();
            state.filters.clear();
            state.traces.clear();
            dropped
        };

        self.soft_overflows.fetch_add(1, Ordering::SeqCst);
        error!(
            "Listener '{}' queue reached {} frames. Unsubscribed from all (inbox is saved): {}",
            self.name,
            depth,
            self.names_of(&dropped).join(", ")
        );
    }

    /// Hand a decoded record to the trace callback and the trace file.
    pub(crate) fn emit_trace(&self, id: &K::Id, record: &K::Record) {
        let callback = self
            .trace_callback
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        callback(id, record);

        let path = self
            .trace_file
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(path) = path {
            let line = self.kind.format_record(record);
            let written = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .and_then(|mut file| writeln!(file, "{line}"));
            if let Err(e) = written {
                warn!("Failed to save trace to {}: {}", path.display(), e);
            }
        }
    }
}
