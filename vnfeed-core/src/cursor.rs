//! Per-identifier incremental cursor tracking.
//!
//! The tracker decides whether a freshly fetched record is new for its
//! ticker and remembers the most-advanced marker seen. Markers never move
//! backwards: a record at or behind the tracked marker is stale and must be
//! dropped by the caller.

use std::collections::BTreeMap;

use crate::record::{Marker, Record};

/// Persistable cursor state: ticker → most-advanced marker seen.
pub type CursorState = BTreeMap<String, Marker>;

/// Tracks per-ticker sync progress for one incremental stream.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorTracker {
    /// Record field holding the marker (e.g. `"tradingDate"`, `"id"`).
    cursor_field: String,
    markers: CursorState,
}

impl CursorTracker {
    pub fn new(cursor_field: impl Into<String>) -> Self {
        Self {
            cursor_field: cursor_field.into(),
            markers: CursorState::new(),
        }
    }

    pub fn cursor_field(&self) -> &str {
        &self.cursor_field
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Seed every identifier's marker, replacing anything tracked before.
    pub fn initialize(&mut self, identifiers: &[String], seed: Marker) {
        self.markers = identifiers
            .iter()
            .map(|id| (id.clone(), seed))
            .collect();
    }

    /// Seed only identifiers that are not tracked yet. Used after `restore`
    /// so that list drift between runs gets a cursor without clobbering
    /// persisted progress.
    pub fn seed_missing(&mut self, identifiers: &[String], seed: Marker) {
        for id in identifiers {
            self.markers.entry(id.clone()).or_insert(seed);
        }
    }

    /// Admit `record` if its marker advances strictly past the tracked one.
    ///
    /// Returns false (and leaves the tracked marker untouched) for stale or
    /// replayed records, and for records whose cursor field is missing or
    /// unparseable. A record for an identifier the tracker has never seen is
    /// admitted on first sight and tracked from its own marker.
    pub fn admit(&mut self, record: &Record) -> bool {
        let Some(marker) = record.marker(&self.cursor_field) else {
            return false;
        };
        let ticker = record.ticker();
        match self.markers.get(ticker) {
            Some(tracked) if marker <= *tracked => false,
            _ => {
                self.markers.insert(ticker.to_string(), marker);
                true
            }
        }
    }

    /// The tracked marker for one identifier.
    pub fn marker_for(&self, ticker: &str) -> Option<Marker> {
        self.markers.get(ticker).copied()
    }

    /// Current mapping, for persistence between runs.
    pub fn snapshot(&self) -> CursorState {
        self.markers.clone()
    }

    /// Load a previously persisted mapping.
    pub fn restore(&mut self, state: CursorState) {
        self.markers = state;
    }

    /// Sort a fetched batch ascending by marker, so an out-of-order page
    /// cannot admit a newer record ahead of an older one and then drop the
    /// older one as stale. Records without a marker sort first.
    pub fn sort_ascending(&self, records: &mut [Record]) {
        records.sort_by(|a, b| {
            a.marker(&self.cursor_field)
                .cmp(&b.marker(&self.cursor_field))
        });
    }
}
