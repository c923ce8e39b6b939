use crate::listener::managed::ManagedListener;

use std::sync::Arc;

use log::info;

/// Which concrete kind a registered listener was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerVariant {
    Generic,
    Log,
}

struct Registered {
    listener: Arc<dyn ManagedListener>,
    variant: ListenerVariant,
}

/// Listeners grouped by the process that publishes to them.
///
/// Owners and their listeners keep insertion order; lookups scan in that
/// order and return the first match.
#[derive(Default)]
pub struct ListenerRegistry {
    owners: Vec<(String, Vec<Registered>)>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append listeners to `owner`'s list, creating it if needed.
    pub fn add_listeners(
        &mut self,
        owner: &str,
        listeners: impl IntoIterator<Item = (Arc<dyn ManagedListener>, ListenerVariant)>,
    ) {
        let index = match self.owners.iter().position(|(name, _)| name == owner) {
            Some(index) => index,
            None => {
                self.owners.push((owner.to_string(), Vec::new()));
                self.owners.len() - 1
            }
        };

        self.owners[index].1.extend(
            listeners
                .into_iter()
                .map(|(listener, variant)| Registered { listener, variant }),
        );
    }

    /// First listener that handles `notif_type`, searching only `owner` when
    /// given.
    pub fn find_listener_for_type(
        &self,
        notif_type: &str,
        owner: Option<&str>,
    ) -> Option<Arc<dyn ManagedListener>> {
        self.owners
            .iter()
            .filter(|(name, _)| owner.is_none_or(|owner| owner == name))
            .flat_map(|(_, registered)| registered.iter())
            .find(|registered| {
                registered
                    .listener
                    .notif_types()
                    .iter()
                    .any(|t| t == notif_type)
            })
            .map(|registered| Arc::clone(&registered.listener))
    }

    pub fn listener_variant(&self, listener: &Arc<dyn ManagedListener>) -> Option<ListenerVariant> {
        self.registered()
            .find(|registered| Arc::ptr_eq(&registered.listener, listener))
            .map(|registered| registered.variant)
    }

    pub fn all_listeners(&self) -> Vec<Arc<dyn ManagedListener>> {
        self.registered()
            .map(|registered| Arc::clone(&registered.listener))
            .collect()
    }

    /// Listeners of `owner`, optionally only those of one variant.
    pub fn listeners_for_owner(
        &self,
        owner: &str,
        variant: Option<ListenerVariant>,
    ) -> Vec<Arc<dyn ManagedListener>> {
        self.owners
            .iter()
            .filter(|(name, _)| name == owner)
            .flat_map(|(_, registered)| registered.iter())
            .filter(|registered| variant.is_none_or(|v| v == registered.variant))
            .map(|registered| Arc::clone(&registered.listener))
            .collect()
    }

    pub fn owners(&self) -> Vec<&str> {
        self.owners.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub async fn stop_all(&self) {
        for registered in self.registered() {
            registered.listener.stop().await;
        }
        info!("Stopped {} listener(s)", self.registered().count());
    }

    fn registered(&self) -> impl Iterator<Item = &Registered> {
        self.owners.iter().flat_map(|(_, registered)| registered.iter())
    }
}
