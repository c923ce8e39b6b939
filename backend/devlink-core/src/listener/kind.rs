use crate::error::listener::ListenerError;

use std::fmt::{Debug, Display};
use std::hash::Hash;

/// What a listener needs to know about one family of notifications.
///
/// A listener is generic over its kind; everything type-specific (how the
/// notification id is encoded, how payloads decode, how records print) lives
/// here.
pub trait NotificationKind: Send + Sync + 'static {
    /// Identifier carried in the first part of every notification.
    type Id: Clone + Eq + Hash + Ord + Debug + Display + Send + Sync + 'static;

    /// Decoded notification kept in the inbox and handed to trace callbacks.
    type Record: Clone + Debug + Send + Sync + 'static;

    /// Names of the notification types this kind handles.
    fn notif_types(&self) -> Vec<String>;

    /// Map a human-readable name to its id.
    fn lookup_notif_id(&self, name: &str) -> Result<Self::Id, ListenerError>;

    /// Human-readable name of an id.
    fn notif_name(&self, id: &Self::Id) -> String;

    /// Decode the id from the first part of a notification.
    fn deserialize_notif_id(&self, frame: &[u8]) -> Result<Self::Id, ListenerError>;

    /// Decode the payload (second part) of a notification.
    fn decode(&self, id: &Self::Id, payload: &[u8]) -> Result<Self::Record, ListenerError>;

    /// Records that must be kept and traced even when their type is not
    /// subscribed. No records qualify unless a kind says otherwise.
    fn bypasses_filter(&self, _record: &Self::Record) -> bool {
        false
    }

    /// One-line rendering used for live traces.
    fn format_record(&self, record: &Self::Record) -> String;

    /// Rendering of a stored record at absolute (0-based) history `index`.
    fn format_message(&self, index: u64, id: &Self::Id, record: &Self::Record) -> String {
        format!(
            "msgId:{} :: notif:{} :: notifType::{}",
            index,
            self.format_record(record),
            id
        )
    }
}
