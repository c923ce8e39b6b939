use crate::error::listener::ListenerError;

use common::ErrorLocation;

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::hash::Hash;
use std::panic::Location;
use std::str::FromStr;

/// Which part of a type's history to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryRange {
    All,
    /// The most recent `n` records.
    Last(usize),
    /// 1-based page of the listener's page size.
    Page(usize),
    /// Absolute 1-based message indices, inclusive on both ends.
    Range(u64, u64),
}

impl fmt::Display for HistoryRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryRange::All => write!(f, "ALL"),
            HistoryRange::Last(n) => write!(f, "LAST {n}"),
            HistoryRange::Page(k) => write!(f, "PAGE {k}"),
            HistoryRange::Range(a, b) => write!(f, "RANGE {a} {b}"),
        }
    }
}

impl FromStr for HistoryRange {
    type Err = ListenerError;

    #[track_caller]
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut words = input.split_whitespace();
        let mode = words.next().map(str::to_ascii_uppercase).unwrap_or_default();
        let args: Vec<&str> = words.collect();

        let range = match (mode.as_str(), args.as_slice()) {
            ("ALL", []) => HistoryRange::All,
            ("LAST", [n]) => HistoryRange::Last(parse_number(input, n)?),
            ("PAGE", [k]) => HistoryRange::Page(parse_number(input, k)?),
            ("RANGE", [a, b]) => HistoryRange::Range(parse_number(input, a)?, parse_number(input, b)?),
            _ => {
                return Err(ListenerError::InvalidRange {
                    message: format!(
                        "'{input}' is not one of ALL, LAST <n>, PAGE <k>, RANGE <first> <last>"
                    ),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };

        Ok(range)
    }
}

#[track_caller]
fn parse_number<N: FromStr>(input: &str, word: &str) -> Result<N, ListenerError> {
    word.parse().map_err(|_| ListenerError::InvalidRange {
        message: format!("'{word}' in '{input}' is not a non-negative number"),
        location: ErrorLocation::from(Location::caller()),
    })
}

/// One stored record together with its absolute (0-based) message index.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry<R> {
    pub index: u64,
    pub record: R,
}

/// Bounded per-type history of decoded notifications.
///
/// Each type keeps at most `capacity` records. Every eviction bumps
/// `base_sequence`, so `base_sequence + position` is a stable absolute index.
#[derive(Debug)]
pub struct Inbox<Id, R> {
    entries: HashMap<Id, VecDeque<R>>,
    capacity: usize,
    base_sequence: u64,
}

impl<Id: Eq + Hash, R: Clone> Inbox<Id, R> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
            base_sequence: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn base_sequence(&self) -> u64 {
        self.base_sequence
    }

    /// Create an empty entry for `id` unless one exists.
    pub fn ensure(&mut self, id: Id) {
        self.entries.entry(id).or_default();
    }

    /// Drop the entry for `id`. Returns whether one existed.
    pub fn remove(&mut self, id: &Id) -> bool {
        self.entries.remove(id).is_some()
    }

    pub fn contains(&self, id: &Id) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self, id: &Id) -> Option<usize> {
        self.entries.get(id).map(VecDeque::len)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Evict the oldest record of `id` if its entry is full.
    pub fn purge(&mut self, id: &Id) {
        if let Some(records) = self.entries.get_mut(id) {
            while records.len() >= self.capacity {
                records.pop_front();
                self.base_sequence += 1;
            }
        }
    }

    /// Append a record, creating the entry if needed and evicting when full.
    pub fn push(&mut self, id: Id, record: R) {
        let capacity = self.capacity;
        let records = self.entries.entry(id).or_default();
        while records.len() >= capacity {
            records.pop_front();
            self.base_sequence += 1;
        }
        records.push_back(record);
    }

    /// Copy out the records of `id` selected by `range`.
    ///
    /// Returns `None` when `id` has no entry.
    pub fn select(
        &self,
        id: &Id,
        range: HistoryRange,
        page_size: usize,
    ) -> Option<Result<Vec<HistoryEntry<R>>, ListenerError>> {
        let records = self.entries.get(id)?;
        Some(select_records(records, self.base_sequence, range, page_size))
    }
}

#[track_caller]
fn select_records<R: Clone>(
    records: &VecDeque<R>,
    base_sequence: u64,
    range: HistoryRange,
    page_size: usize,
) -> Result<Vec<HistoryEntry<R>>, ListenerError> {
    let len = records.len();

    let (first, last) = match range {
        HistoryRange::All => (0, len),
        HistoryRange::Last(n) => (len.saturating_sub(n), len),
        HistoryRange::Page(0) => {
            return Err(ListenerError::InvalidRange {
                message: "page numbers start at 1".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        HistoryRange::Page(k) => {
            let first = (k - 1).saturating_mul(page_size).min(len);
            (first, k.saturating_mul(page_size).min(len))
        }
        HistoryRange::Range(a, b) => {
            if a == 0 || b < a {
                return Err(ListenerError::InvalidRange {
                    message: format!("RANGE {a} {b}: indices start at 1 and first <= last"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            // absolute 0-based [a-1, b) translated to queue positions
            let first = (a - 1).saturating_sub(base_sequence);
            let last = b.saturating_sub(base_sequence);
            let first = usize::try_from(first).unwrap_or(usize::MAX).min(len);
            let last = usize::try_from(last).unwrap_or(usize::MAX).min(len);
            (first, last.max(first))
        }
    };

    Ok(records
        .iter()
        .enumerate()
        .skip(first)
        .take(last - first)
        .map(|(position, record)| HistoryEntry {
            index: base_sequence + position as u64,
            record: record.clone(),
        })
        .collect())
}
