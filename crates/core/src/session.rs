//! Session reconstruction from timestamped page-view events.
//!
//! A session is a maximal run of one user's events where no two
//! temporally-adjacent events are more than [`SESSION_GAP_MINUTES`] apart.
//! Sessions are derived data: they are recomputed from scratch on every
//! import run and the caller discards whatever it held before.

use chrono::{DateTime, Utc};

/// Maximum inactivity gap (in whole minutes) between two consecutive events
/// for them to belong to the same session. A gap of exactly this many
/// minutes stays in the same session; only a strictly greater gap splits.
pub const SESSION_GAP_MINUTES: i64 = 40;

/// Anything carrying an absolute, timezone-normalized timestamp.
///
/// The reconstructor only needs the timestamp; identity stays with the
/// concrete event type so results can be attributed back to storage.
pub trait Timestamped {
    fn timestamp(&self) -> DateTime<Utc>;
}

impl Timestamped for DateTime<Utc> {
    fn timestamp(&self) -> DateTime<Utc> {
        *self
    }
}

/// One reconstructed session: an ordered, non-empty run of events.
///
/// Never constructed by callers; only [`reconstruct_sessions`] produces
/// these, which is what guarantees the non-empty invariant.
#[derive(Debug, Clone, PartialEq)]
pub struct Session<E> {
    events: Vec<E>,
}

impl<E: Timestamped> Session<E> {
    /// Invariant: `events` is non-empty and sorted by timestamp.
    fn from_buffer(events: Vec<E>) -> Self {
        debug_assert!(!events.is_empty());
        Self { events }
    }

    /// The earliest event in the session.
    pub fn first_event(&self) -> &E {
        &self.events[0]
    }

    /// Session start time.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.events[0].timestamp()
    }

    /// Whole minutes between the first and last event, truncated.
    ///
    /// Elapsed seconds are divided by 60 and truncated, never rounded:
    /// a 59-second session has length 0. Changing this would silently move
    /// session-length figures, so it mirrors the gap computation exactly.
    pub fn length_minutes(&self) -> i64 {
        let first = self.events[0].timestamp();
        let last = self.events[self.events.len() - 1].timestamp();
        (last - first).num_seconds() / 60
    }

    /// Number of events assigned to this session.
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// The ordered events belonging to this session.
    pub fn events(&self) -> &[E] {
        &self.events
    }
}

/// Partitions one user's events into sessions with the gap rule.
///
/// The input may arrive in any order and may be empty; the sort is owned
/// here rather than trusted from the event source. Output sessions are
/// ordered by start time and partition the input: every event lands in
/// exactly one session. Pure and deterministic, no I/O; malformed events
/// are the caller's contract violation, not a runtime condition.
pub fn reconstruct_sessions<E: Timestamped>(mut events: Vec<E>) -> Vec<Session<E>> {
    // Stable sort: equal timestamps always land in the same session anyway.
    events.sort_by_key(Timestamped::timestamp);

    let mut sessions = Vec::new();
    let mut buffer: Vec<E> = Vec::new();
    let mut prev_time: Option<DateTime<Utc>> = None;

    for event in events {
        let at = event.timestamp();
        if let Some(prev) = prev_time {
            let gap_minutes = (at - prev).num_seconds() / 60;
            if gap_minutes > SESSION_GAP_MINUTES {
                // Inactivity exceeded the threshold: close out the session
                // found so far and start a fresh one with this event.
                sessions.push(Session::from_buffer(std::mem::take(&mut buffer)));
            }
        }
        buffer.push(event);
        prev_time = Some(at);
    }

    // Final flush; skipped only when there were no events at all.
    if !buffer.is_empty() {
        sessions.push(Session::from_buffer(buffer));
    }

    sessions
}
