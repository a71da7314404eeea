use super::event::{EventKind, NUM_EVENT_KINDS};

/// Counters describing what an ingest pass saw.
///
/// Owned by the single ingest thread, so plain integers suffice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Lines read from all sources, blank ones included.
    pub lines: u64,
    /// Blank lines skipped.
    pub blank_lines: u64,
    /// Lines that failed to decode as a JSON object.
    pub undecodable_lines: u64,
    /// Decoded records whose discriminator is not recognized.
    pub ignored_events: u64,
    /// Recognized events dropped because their required id was missing.
    pub missing_id_events: u64,
    /// Task ends that replaced a stored unsuccessful attempt.
    pub duplicate_tasks_replaced: u64,
    /// Task ends discarded because a successful attempt was already stored.
    pub duplicate_tasks_kept: u64,
    kinds: [u64; NUM_EVENT_KINDS],
}

impl IngestStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the counter for a recognized event kind.
    pub fn record(&mut self, kind: EventKind) {
        if let Some(counter) = self.kinds.get_mut(kind as usize) {
            *counter += 1;
        }
    }

    /// Number of events of the given kind that were accepted.
    pub fn count(&self, kind: EventKind) -> u64 {
        self.kinds.get(kind as usize).copied().unwrap_or(0)
    }

    /// Returns only the non-zero per-kind counters.
    pub fn snapshot(&self) -> Vec<(EventKind, u64)> {
        EventKind::all()
            .iter()
            .map(|kind| (*kind, self.count(*kind)))
            .filter(|(_, v)| *v > 0)
            .collect()
    }

    /// Accepted events per kind as `kind=n` pairs, zero counts left out.
    pub fn events_summary(&self) -> String {
        self.snapshot()
            .iter()
            .map(|(kind, n)| format!("{kind}={n}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Emit a one-line summary at info level.
    pub fn log_summary(&self) {
        tracing::info!(
            lines = self.lines,
            blank = self.blank_lines,
            undecodable = self.undecodable_lines,
            ignored = self.ignored_events,
            missing_id = self.missing_id_events,
            duplicates_replaced = self.duplicate_tasks_replaced,
            duplicates_kept = self.duplicate_tasks_kept,
            events = %self.events_summary(),
            "ingest finished",
        );
    }
}
