use crate::listener::NotificationKind;
use crate::notifications::{
    CatalogNotifications, NotificationCatalog, NotificationDef, RawNotification,
};

use std::sync::Arc;

fn defs() -> Vec<NotificationDef> {
    vec![
        NotificationDef {
            name: "link_up".to_string(),
            id: 0x0101,
        },
        NotificationDef {
            name: "link_down".to_string(),
            id: 0x0102,
        },
    ]
}

fn kind() -> CatalogNotifications {
    CatalogNotifications::new(Arc::new(NotificationCatalog::from_defs(&defs()).unwrap()))
}

/// **VALUE**: Verifies names and ids map both ways.
///
/// **WHY THIS MATTERS**: Operators subscribe by name; the wire carries ids.
///
/// **BUG THIS CATCHES**: Would catch a one-directional or swapped mapping.
#[test]
fn given_catalog_when_looked_up_then_names_and_ids_agree() {
    let kind = kind();

    assert_eq!(kind.lookup_notif_id("link_down").unwrap(), 0x0102);
    assert_eq!(kind.lookup_notif_id("257").unwrap(), 0x0101);
    assert_eq!(kind.notif_name(&0x0101), "link_up");
    assert_eq!(kind.notif_name(&9), "9");
    assert_eq!(kind.notif_types(), vec!["link_up", "link_down"]);
}

/// **VALUE**: Verifies unknown names are a not-found error.
///
/// **WHY THIS MATTERS**: Subscribing to a typo must fail loudly.
///
/// **BUG THIS CATCHES**: Would catch numeric strings outside the catalog
/// being accepted.
#[test]
fn given_unknown_name_when_looked_up_then_not_found() {
    let kind = kind();

    assert!(kind.lookup_notif_id("link_sideways").unwrap_err().is_not_found());
    assert!(kind.lookup_notif_id("12").unwrap_err().is_not_found());
}

/// **VALUE**: Verifies duplicate catalog entries are rejected.
///
/// **WHY THIS MATTERS**: A duplicate would make one of two names unreachable.
///
/// **BUG THIS CATCHES**: Would catch the later entry silently winning.
#[test]
fn given_duplicate_ids_when_catalog_built_then_validation_error() {
    let mut defs = defs();
    defs.push(NotificationDef {
        name: "link_flap".to_string(),
        id: 0x0101,
    });

    assert!(NotificationCatalog::from_defs(&defs).is_err());
}

/// **VALUE**: Verifies ids decode from exactly four big-endian bytes.
///
/// **WHY THIS MATTERS**: The first notification part is a `u32` BE.
///
/// **BUG THIS CATCHES**: Would catch little-endian decoding or short frames
/// being zero-extended.
#[test]
fn given_id_frames_when_deserialized_then_big_endian_four_bytes_only() {
    let kind = kind();

    assert_eq!(kind.deserialize_notif_id(&[0, 0, 1, 2]).unwrap(), 0x0102);
    assert!(kind.deserialize_notif_id(&[1, 2]).is_err());
    assert!(kind.deserialize_notif_id(&[0, 0, 0, 1, 2]).is_err());
}

/// **VALUE**: Verifies raw records render as name plus hex.
///
/// **WHY THIS MATTERS**: Generic notifications have no schema; hex is all an
/// operator can read.
///
/// **BUG THIS CATCHES**: Would catch missing zero padding on single digits.
#[test]
fn given_raw_record_when_formatted_then_name_and_hex() {
    let kind = kind();
    let record = RawNotification {
        id: 0x0101,
        payload: vec![0x0a, 0xff, 0x00],
    };

    assert_eq!(kind.format_record(&record), "link_up [0aff00]");
    assert_eq!(
        kind.format_message(4, &0x0101, &record),
        "msgId:4 :: notif:link_up [0aff00] :: notifType::257"
    );
}
