//! Concrete notification kinds.
//!
//! - [`LogNotifications`] - log events published per logger
//! - [`CatalogNotifications`] - numbered notifications named by a
//!   [`NotificationCatalog`]

pub mod catalog;
pub mod logs;

pub use self::catalog::{
    CatalogNotifications, NotificationCatalog, NotificationDef, RawNotification,
};
pub use self::logs::LogNotifications;
