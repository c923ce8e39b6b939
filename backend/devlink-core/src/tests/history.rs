use crate::listener::{HistoryEntry, HistoryRange, Inbox};

fn filled(count: u32, capacity: usize) -> Inbox<u32, u32> {
    let mut inbox = Inbox::new(capacity);
    inbox.ensure(7);
    for n in 0..count {
        inbox.purge(&7);
        inbox.push(7, n);
    }
    inbox
}

fn records(entries: Vec<HistoryEntry<u32>>) -> Vec<(u64, u32)> {
    entries.into_iter().map(|e| (e.index, e.record)).collect()
}

/// **VALUE**: Verifies the history keeps the newest `capacity` records and
/// counts evictions.
///
/// **WHY THIS MATTERS**: Absolute message numbers shown to operators are
/// `base_sequence + position`; a wrong count shifts every number.
///
/// **BUG THIS CATCHES**: Would catch:
/// - the inbox growing past capacity
/// - evictions not advancing `base_sequence`
/// - the newest record being dropped instead of the oldest
#[test]
fn given_more_records_than_capacity_when_pushed_then_oldest_evicted_and_counted() {
    // GIVEN / WHEN: 101 records into a 100-record inbox
    let inbox = filled(101, 100);

    // THEN
    assert_eq!(inbox.len(&7), Some(100));
    assert_eq!(inbox.base_sequence(), 1);

    let last = inbox.select(&7, HistoryRange::Last(5), 25).unwrap().unwrap();
    assert_eq!(
        records(last),
        vec![(96, 96), (97, 97), (98, 98), (99, 99), (100, 100)]
    );
}

/// **VALUE**: Verifies the eviction count for fewer records than capacity.
///
/// **WHY THIS MATTERS**: `base_sequence = max(0, N - C)` must hold for every N.
///
/// **BUG THIS CATCHES**: Would catch eviction starting one record early.
#[test]
fn given_fewer_records_than_capacity_when_pushed_then_nothing_evicted() {
    let inbox = filled(100, 100);

    assert_eq!(inbox.len(&7), Some(100));
    assert_eq!(inbox.base_sequence(), 0);
}

/// **VALUE**: Verifies `LAST n` with n larger than the history returns all.
///
/// **WHY THIS MATTERS**: Operators ask for "last 50" without knowing the size.
///
/// **BUG THIS CATCHES**: Would catch an underflow panic on `len - n`.
#[test]
fn given_short_history_when_last_exceeds_len_then_all_returned() {
    let inbox = filled(3, 100);

    let all = inbox.select(&7, HistoryRange::Last(50), 25).unwrap().unwrap();

    assert_eq!(records(all), vec![(0, 0), (1, 1), (2, 2)]);
}

/// **VALUE**: Verifies paging boundaries.
///
/// **WHY THIS MATTERS**: Page k covers positions `[(k-1)*size, k*size)`.
///
/// **BUG THIS CATCHES**: Would catch:
/// - off-by-one page starts
/// - page 0 silently returning the first page
/// - pages past the end panicking instead of returning nothing
#[test]
fn given_history_when_paged_then_pages_are_bounded() {
    let inbox = filled(60, 100);

    let second = inbox.select(&7, HistoryRange::Page(2), 25).unwrap().unwrap();
    assert_eq!(second.len(), 25);
    assert_eq!(second[0].index, 25);
    assert_eq!(second[24].index, 49);

    let third = inbox.select(&7, HistoryRange::Page(3), 25).unwrap().unwrap();
    assert_eq!(third.len(), 10);

    let beyond = inbox.select(&7, HistoryRange::Page(9), 25).unwrap().unwrap();
    assert!(beyond.is_empty());

    let zero = inbox.select(&7, HistoryRange::Page(0), 25).unwrap();
    assert!(zero.is_err(), "Page 0 must be rejected");
}

/// **VALUE**: Verifies RANGE uses absolute numbering after evictions.
///
/// **WHY THIS MATTERS**: A range copied from earlier output must keep
/// pointing at the same messages, minus those already evicted.
///
/// **BUG THIS CATCHES**: Would catch:
/// - evicted indices being returned or wrapping to other records
/// - indices past the tail reading out of bounds
#[test]
fn given_evicted_history_when_range_requested_then_translated_by_base_sequence() {
    // GIVEN: 10 records in a 5-record inbox, so messages 1..=5 are gone
    let inbox = filled(10, 5);
    assert_eq!(inbox.base_sequence(), 5);

    // WHEN: RANGE 3 7 (1-based)
    let entries = inbox
        .select(&7, HistoryRange::Range(3, 7), 25)
        .unwrap()
        .unwrap();

    // THEN: only messages 6 and 7 (0-based 5 and 6) survive
    assert_eq!(records(entries), vec![(5, 5), (6, 6)]);

    let past_tail = inbox
        .select(&7, HistoryRange::Range(9, 40), 25)
        .unwrap()
        .unwrap();
    assert_eq!(records(past_tail), vec![(8, 8), (9, 9)]);

    let evicted = inbox
        .select(&7, HistoryRange::Range(1, 5), 25)
        .unwrap()
        .unwrap();
    assert!(evicted.is_empty());
}

/// **VALUE**: Verifies a type without an entry is reported as missing.
///
/// **WHY THIS MATTERS**: Listing an unsubscribed type is an operator error.
///
/// **BUG THIS CATCHES**: Would catch an empty list hiding the mistake.
#[test]
fn given_unknown_type_when_selected_then_none() {
    let inbox = filled(3, 100);

    assert!(inbox.select(&8, HistoryRange::All, 25).is_none());
}

/// **VALUE**: Verifies purge only trims full entries and never creates one.
///
/// **WHY THIS MATTERS**: Purge runs for every incoming notification, even for
/// types nobody subscribed to.
///
/// **BUG THIS CATCHES**: Would catch purge creating entries for every type
/// on the wire.
#[test]
fn given_missing_entry_when_purged_then_nothing_created() {
    let mut inbox: Inbox<u32, u32> = Inbox::new(2);

    inbox.purge(&1);

    assert!(!inbox.contains(&1));
    assert_eq!(inbox.base_sequence(), 0);
}

/// **VALUE**: Verifies the text forms of history ranges.
///
/// **WHY THIS MATTERS**: Ranges arrive from typed commands.
///
/// **BUG THIS CATCHES**: Would catch:
/// - case-sensitive keywords
/// - missing or extra arguments being accepted
/// - negative numbers wrapping
#[test]
fn given_range_text_when_parsed_then_matching_mode() {
    assert_eq!("ALL".parse::<HistoryRange>().unwrap(), HistoryRange::All);
    assert_eq!("last 5".parse::<HistoryRange>().unwrap(), HistoryRange::Last(5));
    assert_eq!("Page 2".parse::<HistoryRange>().unwrap(), HistoryRange::Page(2));
    assert_eq!(
        "  RANGE 3   9 ".parse::<HistoryRange>().unwrap(),
        HistoryRange::Range(3, 9)
    );

    for bad in ["", "LAST", "LAST x", "PAGE 1 2", "RANGE 3", "RANGE -1 4", "FIRST 3"] {
        assert!(
            bad.parse::<HistoryRange>().is_err(),
            "'{bad}' should not parse"
        );
    }
}

/// **VALUE**: Verifies Display and parsing agree.
///
/// **WHY THIS MATTERS**: Ranges are echoed back in log lines and prompts.
///
/// **BUG THIS CATCHES**: Would catch a Display form the parser rejects.
#[test]
fn given_range_when_displayed_then_parses_back() {
    for range in [
        HistoryRange::All,
        HistoryRange::Last(4),
        HistoryRange::Page(1),
        HistoryRange::Range(2, 8),
    ] {
        assert_eq!(range.to_string().parse::<HistoryRange>().unwrap(), range);
    }
}
