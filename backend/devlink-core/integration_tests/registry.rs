use crate::helpers::{log_kind, test_settings};

use devlink_core::listener::{Listener, ListenerRegistry, ListenerVariant, ManagedListener};
use devlink_core::notifications::{CatalogNotifications, NotificationCatalog, NotificationDef};
use devlink_core::transport::SessionMode;
use devlink_core::transport::memory::{self, MemoryPeer};

use std::sync::Arc;

fn log_listener(name: &str, loggers: &[&str]) -> (Arc<dyn ManagedListener>, MemoryPeer) {
    let (session, peer) = memory::session("mem://device/log", SessionMode::Subscribe);
    let listener = Listener::new(name, log_kind(loggers), session, test_settings());
    (Arc::new(listener), peer)
}

fn catalog_listener(name: &str) -> (Arc<dyn ManagedListener>, MemoryPeer) {
    let catalog = NotificationCatalog::from_defs(&[NotificationDef {
        name: "link_up".to_string(),
        id: 257,
    }])
    .expect("Failed to build catalog");
    let (session, peer) = memory::session("mem://device/notif", SessionMode::Subscribe);
    let listener = Listener::new(
        name,
        CatalogNotifications::new(Arc::new(catalog)),
        session,
        test_settings(),
    );
    (Arc::new(listener), peer)
}

/// **VALUE**: Verifies type lookup across owners, per owner and for unknowns.
///
/// **WHY THIS MATTERS**: Commands name a notification type, not a listener;
/// the registry decides which listener serves it.
///
/// **BUG THIS CATCHES**: Would catch:
/// - the owner filter being ignored
/// - an unknown owner falling back to a global search
/// - later registrations replacing earlier ones
#[tokio::test]
async fn given_listeners_of_two_owners_when_type_looked_up_then_first_match_returned() {
    // GIVEN
    let (app_log, _p1) = log_listener("app-log", &["net", "disk"]);
    let (app_notif, _p2) = catalog_listener("app-notif");
    let (boot_log, _p3) = log_listener("boot-log", &["net", "boot"]);

    let mut registry = ListenerRegistry::new();
    registry.add_listeners("app", [(Arc::clone(&app_log), ListenerVariant::Log)]);
    registry.add_listeners("boot", [(Arc::clone(&boot_log), ListenerVariant::Log)]);
    registry.add_listeners("app", [(Arc::clone(&app_notif), ListenerVariant::Generic)]);

    // THEN: global search returns the first owner's listener
    let found = registry.find_listener_for_type("net", None).unwrap();
    assert_eq!(found.name(), "app-log");

    // THEN: owner filter narrows the search
    let found = registry.find_listener_for_type("net", Some("boot")).unwrap();
    assert_eq!(found.name(), "boot-log");
    let found = registry.find_listener_for_type("link_up", Some("app")).unwrap();
    assert_eq!(found.name(), "app-notif");

    // THEN: misses are None
    assert!(registry.find_listener_for_type("link_up", Some("boot")).is_none());
    assert!(registry.find_listener_for_type("net", Some("nobody")).is_none());
    assert!(registry.find_listener_for_type("unknown", None).is_none());

    assert_eq!(registry.owners(), vec!["app", "boot"]);
    assert_eq!(registry.all_listeners().len(), 3);
}

/// **VALUE**: Verifies variant tags and per-owner listing.
///
/// **WHY THIS MATTERS**: Log listeners get log-specific commands (levels,
/// severity); generic ones do not.
///
/// **BUG THIS CATCHES**: Would catch the variant being looked up by name
/// instead of identity.
#[tokio::test]
async fn given_registered_listeners_when_variant_queried_then_tag_returned() {
    let (log, _p1) = log_listener("log", &["net"]);
    let (notif, _p2) = catalog_listener("notif");
    let (stray, _p3) = log_listener("log", &["net"]);

    let mut registry = ListenerRegistry::new();
    registry.add_listeners(
        "app",
        [
            (Arc::clone(&log), ListenerVariant::Log),
            (Arc::clone(&notif), ListenerVariant::Generic),
        ],
    );

    assert_eq!(registry.listener_variant(&log), Some(ListenerVariant::Log));
    assert_eq!(
        registry.listener_variant(&notif),
        Some(ListenerVariant::Generic)
    );
    assert_eq!(registry.listener_variant(&stray), None);

    let logs = registry.listeners_for_owner("app", Some(ListenerVariant::Log));
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].name(), "log");
    assert_eq!(registry.listeners_for_owner("app", None).len(), 2);
    assert!(registry.listeners_for_owner("boot", None).is_empty());
}

/// **VALUE**: Verifies stop_all stops every running listener.
///
/// **WHY THIS MATTERS**: Shutdown must not leave receive tasks polling.
///
/// **BUG THIS CATCHES**: Would catch listeners of later owners being skipped.
#[tokio::test]
async fn given_running_listeners_when_stop_all_then_none_running() {
    let (log, _p1) = log_listener("log", &["net"]);
    let (notif, _p2) = catalog_listener("notif");
    log.register_notif_type("net").unwrap();
    notif.register_notif_type("link_up").unwrap();

    let mut registry = ListenerRegistry::new();
    registry.add_listeners("app", [(Arc::clone(&log), ListenerVariant::Log)]);
    registry.add_listeners("boot", [(Arc::clone(&notif), ListenerVariant::Generic)]);
    assert!(log.is_running() && notif.is_running());

    registry.stop_all().await;

    assert!(!log.is_running());
    assert!(!notif.is_running());
}
