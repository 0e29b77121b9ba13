//! Property checks for session reconstruction over generated timelines.

use chrono::{DateTime, Duration, Utc};

use analytics_core::{reconstruct_sessions, Session, Timestamped, SESSION_GAP_MINUTES};
use integration_tests::fixtures;

/// Small deterministic LCG so timelines are reproducible without a
/// randomness dependency.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    /// Uniform-ish value in [0, bound).
    fn below(&mut self, bound: u64) -> u64 {
        self.next() % bound
    }
}

/// Generates `n` event timestamps with gaps up to ~3x the session threshold,
/// in seconds so sub-minute truncation gets exercised.
fn timeline(seed: u64, n: usize) -> Vec<DateTime<Utc>> {
    let mut rng = Lcg(seed);
    let mut at = fixtures::course_start();
    let mut events = Vec::with_capacity(n);
    for _ in 0..n {
        events.push(at);
        let gap_seconds = rng.below((SESSION_GAP_MINUTES as u64) * 3 * 60);
        at += Duration::seconds(gap_seconds as i64);
    }
    events
}

fn assert_invariants(events: &[DateTime<Utc>], sessions: &[Session<DateTime<Utc>>]) {
    // Partition: every event appears exactly once across all sessions.
    let mut reassembled: Vec<DateTime<Utc>> = sessions
        .iter()
        .flat_map(|s| s.events().iter().copied())
        .collect();
    reassembled.sort();
    let mut sorted_input = events.to_vec();
    sorted_input.sort();
    assert_eq!(reassembled, sorted_input);

    // Ordering: sessions are emitted by non-decreasing start time.
    for pair in sessions.windows(2) {
        assert!(pair[0].started_at() <= pair[1].started_at());
    }

    for session in sessions {
        assert!(session.event_count() >= 1);
        assert_eq!(session.event_count(), session.events().len());
        assert_eq!(Timestamped::timestamp(session.first_event()), session.started_at());

        // Gap property within a session: adjacent floored gaps stay at or
        // under the threshold.
        for pair in session.events().windows(2) {
            let gap = (Timestamped::timestamp(&pair[1]) - Timestamped::timestamp(&pair[0])).num_seconds() / 60;
            assert!(gap <= SESSION_GAP_MINUTES, "in-session gap {} too large", gap);
        }
    }

    // Gap property across consecutive sessions: boundary gaps exceed the
    // threshold.
    for pair in sessions.windows(2) {
        let last = Timestamped::timestamp(pair[0].events().last().unwrap());
        let first = Timestamped::timestamp(pair[1].events().first().unwrap());
        let gap = (first - last).num_seconds() / 60;
        assert!(gap > SESSION_GAP_MINUTES, "boundary gap {} too small", gap);
    }
}

#[test]
fn test_invariants_hold_across_generated_timelines() {
    for seed in 1..=50u64 {
        let events = timeline(seed, 200);
        let sessions = reconstruct_sessions(events.clone());
        assert_invariants(&events, &sessions);
    }
}

#[test]
fn test_reconstruction_is_deterministic_under_shuffling() {
    let events = timeline(7, 300);

    let baseline = reconstruct_sessions(events.clone());

    // Deterministically shuffle and re-run; boundaries must not move.
    let mut rng = Lcg(99);
    let mut shuffled = events;
    for i in (1..shuffled.len()).rev() {
        let j = rng.below((i + 1) as u64) as usize;
        shuffled.swap(i, j);
    }
    let reshuffled = reconstruct_sessions(shuffled);

    let boundaries = |sessions: &[Session<DateTime<Utc>>]| -> Vec<(DateTime<Utc>, i64, usize)> {
        sessions
            .iter()
            .map(|s| (s.started_at(), s.length_minutes(), s.event_count()))
            .collect()
    };
    assert_eq!(boundaries(&baseline), boundaries(&reshuffled));
}

#[test]
fn test_degenerate_inputs() {
    assert!(reconstruct_sessions(Vec::<DateTime<Utc>>::new()).is_empty());

    let single = reconstruct_sessions(vec![fixtures::course_start()]);
    assert_eq!(single.len(), 1);
    assert_eq!(single[0].length_minutes(), 0);
    assert_eq!(single[0].event_count(), 1);
}
