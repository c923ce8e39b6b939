use crate::tail::select_loggers;

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// **VALUE**: Verifies logger selection defaults to everything known.
///
/// **WHY THIS MATTERS**: Running without `--logger` should tail the device.
///
/// **BUG THIS CATCHES**: Would catch an empty request tailing nothing.
#[test]
fn given_no_requested_loggers_when_selected_then_all_known() {
    let known = names(&["net", "disk"]);

    assert_eq!(select_loggers(&[], &known).unwrap(), known);
}

/// **VALUE**: Verifies unknown loggers are rejected.
///
/// **WHY THIS MATTERS**: A typo would otherwise tail silently forever.
///
/// **BUG THIS CATCHES**: Would catch unknown names being subscribed.
#[test]
fn given_unknown_logger_when_selected_then_error() {
    let known = names(&["net", "disk"]);

    assert_eq!(
        select_loggers(&names(&["disk"]), &known).unwrap(),
        vec!["disk"]
    );
    assert!(select_loggers(&names(&["dsik"]), &known).is_err());
}
