use crate::error::listener::ListenerError;
use crate::listener::inbox::HistoryRange;
use crate::listener::kind::NotificationKind;
use crate::listener::Listener;
use crate::transport::Transport;

use futures_util::future::BoxFuture;

/// Kind-erased view of a [`Listener`], so listeners of different kinds can
/// sit in one [`ListenerRegistry`](crate::listener::ListenerRegistry).
pub trait ManagedListener: Send + Sync {
    fn name(&self) -> &str;
    fn notif_types(&self) -> Vec<String>;
    fn is_running(&self) -> bool;
    fn register_notif_type(&self, name: &str) -> Result<(), ListenerError>;
    fn unregister_notif_type(&self, name: &str) -> Result<(), ListenerError>;
    fn is_notif_type_registered(&self, name: &str) -> bool;
    fn is_filter_list_empty(&self) -> bool;
    fn subscribed_notifs(&self) -> Vec<String>;
    fn enable_trace(&self, name: &str) -> Result<(), ListenerError>;
    fn enable_trace_all(&self) -> Result<(), ListenerError>;
    fn disable_trace(&self, name: Option<&str>) -> Result<(), ListenerError>;
    fn set_inpq_limits(&self, max_size: Option<usize>, threshold: Option<usize>);
    fn format_messages(&self, range: HistoryRange, name: &str)
    -> Result<Vec<String>, ListenerError>;
    fn stop(&self) -> BoxFuture<'_, ()>;
}

impl<K: NotificationKind, T: Transport> ManagedListener for Listener<K, T> {
    fn name(&self) -> &str {
        Listener::name(self)
    }

    fn notif_types(&self) -> Vec<String> {
        Listener::notif_types(self)
    }

    fn is_running(&self) -> bool {
        Listener::is_running(self)
    }

    fn register_notif_type(&self, name: &str) -> Result<(), ListenerError> {
        Listener::register_notif_type(self, name)
    }

    fn unregister_notif_type(&self, name: &str) -> Result<(), ListenerError> {
        Listener::unregister_notif_type(self, name)
    }

    fn is_notif_type_registered(&self, name: &str) -> bool {
        Listener::is_notif_type_registered(self, name)
    }

    fn is_filter_list_empty(&self) -> bool {
        Listener::is_filter_list_empty(self)
    }

    fn subscribed_notifs(&self) -> Vec<String> {
        Listener::subscribed_notifs(self)
    }

    fn enable_trace(&self, name: &str) -> Result<(), ListenerError> {
        Listener::enable_trace(self, name)
    }

    fn enable_trace_all(&self) -> Result<(), ListenerError> {
        Listener::enable_trace_all(self)
    }

    fn disable_trace(&self, name: Option<&str>) -> Result<(), ListenerError> {
        Listener::disable_trace(self, name)
    }

    fn set_inpq_limits(&self, max_size: Option<usize>, threshold: Option<usize>) {
        Listener::set_inpq_limits(self, max_size, threshold)
    }

    fn format_messages(
        &self,
        range: HistoryRange,
        name: &str,
    ) -> Result<Vec<String>, ListenerError> {
        Listener::format_messages(self, range, name)
    }

    fn stop(&self) -> BoxFuture<'_, ()> {
        Box::pin(Listener::stop(self))
    }
}
