use crate::error::config::ConfigError;
use crate::error::listener::ListenerError;
use crate::listener::NotificationKind;

use common::ErrorLocation;

use std::collections::BTreeMap;
use std::fmt::Write;
use std::panic::Location;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// One `name = id` pair from the `[[notifications]]` configuration table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationDef {
    pub name: String,
    pub id: u32,
}

/// Immutable two-way map between notification names and ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationCatalog {
    by_name: BTreeMap<String, u32>,
    by_id: BTreeMap<u32, String>,
}

impl NotificationCatalog {
    /// Build from definitions, rejecting duplicate names or ids.
    #[track_caller]
    pub fn from_defs<'a>(
        defs: impl IntoIterator<Item = &'a NotificationDef>,
    ) -> Result<Self, ConfigError> {
        let mut catalog = Self::default();
        for def in defs {
            if catalog.by_name.contains_key(&def.name) || catalog.by_id.contains_key(&def.id) {
                return Err(ConfigError::ValidationError {
                    location: ErrorLocation::from(Location::caller()),
                    reason: format!("duplicate notification {} = {}", def.name, def.id),
                });
            }
            catalog.by_name.insert(def.name.clone(), def.id);
            catalog.by_id.insert(def.id, def.name.clone());
        }
        Ok(catalog)
    }

    pub fn id(&self, name: &str) -> Option<u32> {
        self.by_name.get(name).copied()
    }

    pub fn name(&self, id: u32) -> Option<&str> {
        self.by_id.get(&id).map(String::as_str)
    }

    /// Names in id order.
    pub fn names(&self) -> Vec<String> {
        self.by_id.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Undecoded notification payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawNotification {
    pub id: u32,
    pub payload: Vec<u8>,
}

/// Numbered notifications whose payloads are kept as raw bytes.
pub struct CatalogNotifications {
    catalog: Arc<NotificationCatalog>,
}

impl CatalogNotifications {
    pub fn new(catalog: Arc<NotificationCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &NotificationCatalog {
        &self.catalog
    }
}

impl NotificationKind for CatalogNotifications {
    type Id = u32;
    type Record = RawNotification;

    fn notif_types(&self) -> Vec<String> {
        self.catalog.names()
    }

    /// Accepts a catalog name or a catalogued numeric id.
    fn lookup_notif_id(&self, name: &str) -> Result<u32, ListenerError> {
        self.catalog
            .id(name)
            .or_else(|| {
                name.parse()
                    .ok()
                    .filter(|id| self.catalog.name(*id).is_some())
            })
            .ok_or_else(|| ListenerError::not_found(name))
    }

    fn notif_name(&self, id: &u32) -> String {
        self.catalog
            .name(*id)
            .map(str::to_string)
            .unwrap_or_else(|| id.to_string())
    }

    #[track_caller]
    fn deserialize_notif_id(&self, frame: &[u8]) -> Result<u32, ListenerError> {
        let bytes: [u8; 4] = frame.try_into().map_err(|_| ListenerError::Decode {
            message: format!("notification id needs 4 bytes, got {}", frame.len()),
            location: ErrorLocation::from(Location::caller()),
        })?;
        Ok(u32::from_be_bytes(bytes))
    }

    fn decode(&self, id: &u32, payload: &[u8]) -> Result<RawNotification, ListenerError> {
        Ok(RawNotification {
            id: *id,
            payload: payload.to_vec(),
        })
    }

    fn format_record(&self, record: &RawNotification) -> String {
        let mut hex = String::with_capacity(record.payload.len() * 2);
        for byte in &record.payload {
            let _ = write!(hex, "{byte:02x}");
        }
        format!("{} [{}]", self.notif_name(&record.id), hex)
    }
}
