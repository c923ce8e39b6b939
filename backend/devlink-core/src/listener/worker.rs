use crate::listener::kind::NotificationKind;
use crate::listener::state::Shared;
use crate::transport::{Multipart, Transport};

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::Ordering;

use log::{debug, error, info};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub(crate) enum QueueItem {
    Frames(Multipart),
    End,
}

/// Pull notifications off the session and queue them for dispatch.
///
/// Hands the session back when the run flag clears.
pub(crate) async fn receive_loop<K, T>(
    mut session: T,
    queue: UnboundedSender<QueueItem>,
    shared: Arc<Shared<K>>,
) -> T
where
    K: NotificationKind,
    T: Transport,
{
    info!(
        "Listener '{}' receiving from {}",
        shared.name,
        session.address()
    );

    while shared.is_running() {
        if !session.is_connected() {
            if let Err(e) = session.connect().await {
                error!(
                    "Listener '{}' failed to connect to {}: {}",
                    shared.name,
                    session.address(),
                    e
                );
                tokio::time::sleep(shared.poll_timeout).await;
                continue;
            }
        }

        match session.recv_timeout(shared.poll_timeout).await {
            Ok(Some(frames)) => {
                if !shared.is_running() || !enqueue(&shared, &queue, frames) {
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => {
                if shared.is_running() {
                    error!("Listener '{}' FATAL transport error: {}", shared.name, e);
                    tokio::time::sleep(shared.poll_timeout).await;
                }
            }
        }
    }

    debug!("Listener '{}' receive loop finished", shared.name);
    session
}

/// Queue one notification, applying the overflow policy.
///
/// Returns `false` when the receive loop must stop.
fn enqueue<K: NotificationKind>(
    shared: &Shared<K>,
    queue: &UnboundedSender<QueueItem>,
    frames: Multipart,
) -> bool {
    let depth = shared.depth.load(Ordering::SeqCst);
    let max_size = shared.inpq_max_size.load(Ordering::SeqCst);
    if depth >= max_size {
        error!(
            "FATAL ERROR. Listener '{}' queue overflowed ({} of {} frames pending)",
            shared.name, depth, max_size
        );
        shared.fatal_overflow(depth);
        return false;
    }

    shared.depth.fetch_add(1, Ordering::SeqCst);
    if queue.send(QueueItem::Frames(frames)).is_err() {
        shared.depth.fetch_sub(1, Ordering::SeqCst);
        return false;
    }

    if depth + 1 >= shared.inpq_threshold.load(Ordering::SeqCst) {
        shared.soft_overflow(depth + 1);
    }
    true
}

/// Decode queued notifications in arrival order until the end marker.
///
/// Runs on a blocking thread since trace callbacks are synchronous.
pub(crate) fn dispatch_loop<K: NotificationKind>(
    mut queue: UnboundedReceiver<QueueItem>,
    shared: Arc<Shared<K>>,
) {
    while let Some(QueueItem::Frames(frames)) = queue.blocking_recv() {
        shared.depth.fetch_sub(1, Ordering::SeqCst);
        if !shared.is_running() {
            continue;
        }

        if catch_unwind(AssertUnwindSafe(|| handle_notif(&shared, &frames))).is_err() {
            error!(
                "Exception in listener '{}' while processing msg={:?}",
                shared.name, frames
            );
        }
    }

    debug!("Listener '{}' dispatch loop finished", shared.name);
}

fn handle_notif<K: NotificationKind>(shared: &Shared<K>, frames: &Multipart) {
    let Some(id_part) = frames.first() else {
        error!("Listener '{}' received an empty notification", shared.name);
        return;
    };

    let id = match shared.kind.deserialize_notif_id(id_part) {
        Ok(id) => id,
        Err(e) => {
            error!(
                "Exception in listener '{}': bad notification id, msg={:?}: {}",
                shared.name, frames, e
            );
            return;
        }
    };

    shared.lock_state().inbox.purge(&id);

    let payload = frames.get(1).map(Vec::as_slice).unwrap_or_default();
    let record = match shared.kind.decode(&id, payload) {
        Ok(record) => record,
        Err(e) => {
            error!(
                "Exception in listener '{}' processing notifId={} msg={:?}: {}",
                shared.name, id, frames, e
            );
            return;
        }
    };

    let bypass = shared.kind.bypasses_filter(&record);
    let trace = {
        let mut state = shared.lock_state();
        if bypass || state.filters.contains(&id) {
            state.inbox.push(id.clone(), record.clone());
        }
        bypass || state.traces.contains(&id)
    };

    if trace {
        shared.emit_trace(&id, &record);
    }
}
