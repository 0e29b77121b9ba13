//! End-to-end import tests: archive in, reconciled store and sessions out.

use chrono::Duration;

use analytics_core::SESSION_GAP_MINUTES;
use integration_tests::fixtures;
use lms_import::BlackboardImport;
use session_worker::SessionWorker;

#[tokio::test]
async fn test_full_import_with_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let archive = fixtures::ExportArchiveBuilder::new()
        .users(&[
            "u1|Ada|Lovelace|alovelace|ada@example.edu",
            "u2|Charles|Babbage|cbabbage|charles@example.edu",
        ])
        .resources(&[
            "1||Course home|resource/x-bb-document",
            "2|1|Week 1 notes|resource/x-bb-document",
            "3||Quiz 1|course/x-bb-courseassessment",
        ])
        .posts(&[&format!("f1|u1|Week 1 questions|First post|{}", fixtures::stamp(5))])
        .submissions(&[&format!("u2|3|85|{}", fixtures::stamp(15))])
        .activity(&[
            // u1: two sessions (gap of 60 mins between minute 20 and 80)
            &format!("u1|1||{}", fixtures::stamp(0)),
            &format!("u1|2||{}", fixtures::stamp(20)),
            &format!("u1|2||{}", fixtures::stamp(80)),
            // u2: one session, including a forum visit
            &format!("u2|1||{}", fixtures::stamp(10)),
            &format!("u2||f1|{}", fixtures::stamp(31)),
        ])
        .build(&dir);

    let mut store = fixtures::store();
    let outcome = BlackboardImport::new(&archive, &mut store)
        .process_import_data()
        .unwrap();
    assert!(outcome.is_clean(), "unexpected errors: {:?}", outcome.errors);
    assert!(outcome.non_critical_errors.is_empty());

    let session_count = SessionWorker::run(&mut store).await.unwrap();
    assert_eq!(session_count, 3);

    let stats = store.stats();
    assert_eq!(stats.users, 2);
    // Three resources plus the forum page created from the posts file.
    assert_eq!(stats.pages, 4);
    assert_eq!(stats.page_visits, 5);
    assert_eq!(stats.posts, 1);
    assert_eq!(stats.submission_attempts, 1);
    assert_eq!(stats.sessions, 3);

    let u1 = store.user_by_key("u1").unwrap().id;
    let u1_sessions = store.sessions_for_user(u1);
    assert_eq!(u1_sessions.len(), 2);
    assert_eq!(u1_sessions[0].started_at(), fixtures::course_start());
    assert_eq!(u1_sessions[0].length_minutes(), 20);
    assert_eq!(u1_sessions[0].event_count(), 2);
    assert_eq!(u1_sessions[1].event_count(), 1);

    let u2 = store.user_by_key("u2").unwrap().id;
    let u2_sessions = store.sessions_for_user(u2);
    assert_eq!(u2_sessions.len(), 1);
    assert_eq!(
        u2_sessions[0].started_at(),
        fixtures::course_start() + Duration::minutes(10)
    );
    assert_eq!(u2_sessions[0].length_minutes(), 21);

    // Every visit is attributable back to exactly one session.
    for visit in store.visits() {
        let session = store.session_for_visit(visit.id).unwrap();
        assert!(session.events().iter().any(|v| v.id == visit.id));
    }

    // Latest activity spans all record kinds; here the last visit wins.
    assert_eq!(
        store.latest_activity(),
        Some(fixtures::course_start() + Duration::minutes(80))
    );
}

#[tokio::test]
async fn test_critical_errors_block_session_reconstruction() {
    let dir = tempfile::tempdir().unwrap();
    let archive = fixtures::ExportArchiveBuilder::new()
        .users(&["u1|Ada|Lovelace|alovelace|ada@example.edu"])
        .resources(&["1||Course home|resource/x-bb-document"])
        .activity(&[
            &format!("u1|1||{}", fixtures::stamp(0)),
            // Unknown user is a critical error
            &format!("ghost|1||{}", fixtures::stamp(5)),
        ])
        .build(&dir);

    let mut store = fixtures::store();
    let outcome = BlackboardImport::new(&archive, &mut store)
        .process_import_data()
        .unwrap();

    assert_eq!(outcome.errors.len(), 1);
    assert!(!outcome.is_clean());

    // The caller skips reconstruction on critical errors; the valid row
    // is still in the store.
    assert_eq!(store.stats().page_visits, 1);
    assert_eq!(store.stats().sessions, 0);
}

#[tokio::test]
async fn test_gap_threshold_at_the_boundary() {
    let dir = tempfile::tempdir().unwrap();
    let archive = fixtures::ExportArchiveBuilder::new()
        .users(&["u1|Ada|Lovelace|alovelace|ada@example.edu"])
        .resources(&["1||Course home|resource/x-bb-document"])
        .activity(&[
            &format!("u1|1||{}", fixtures::stamp(0)),
            // Exactly at the threshold: same session
            &format!("u1|1||{}", fixtures::stamp(SESSION_GAP_MINUTES)),
            // One minute past the threshold from the previous visit: split
            &format!(
                "u1|1||{}",
                fixtures::stamp(SESSION_GAP_MINUTES * 2 + 1)
            ),
        ])
        .build(&dir);

    let mut store = fixtures::store();
    let outcome = BlackboardImport::new(&archive, &mut store)
        .process_import_data()
        .unwrap();
    assert!(outcome.is_clean());

    SessionWorker::run(&mut store).await.unwrap();

    let u1 = store.user_by_key("u1").unwrap().id;
    let sessions = store.sessions_for_user(u1);
    assert_eq!(sessions.len(), 2);
    assert_eq!(sessions[0].event_count(), 2);
    assert_eq!(sessions[0].length_minutes(), SESSION_GAP_MINUTES);
    assert_eq!(sessions[1].event_count(), 1);
}

#[tokio::test]
async fn test_reimport_after_clear_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let archive = fixtures::ExportArchiveBuilder::new()
        .users(&["u1|Ada|Lovelace|alovelace|ada@example.edu"])
        .resources(&["1||Course home|resource/x-bb-document"])
        .activity(&[&format!("u1|1||{}", fixtures::stamp(0))])
        .build(&dir);

    let mut store = fixtures::store();
    let outcome = BlackboardImport::new(&archive, &mut store)
        .process_import_data()
        .unwrap();
    assert!(outcome.is_clean());
    SessionWorker::run(&mut store).await.unwrap();
    let first_stats = store.stats();

    // Clear and import the same archive again.
    store.clear();
    assert_eq!(store.stats().page_visits, 0);

    let outcome = BlackboardImport::new(&archive, &mut store)
        .process_import_data()
        .unwrap();
    assert!(outcome.is_clean());
    SessionWorker::run(&mut store).await.unwrap();

    let second_stats = store.stats();
    assert_eq!(first_stats.users, second_stats.users);
    assert_eq!(first_stats.page_visits, second_stats.page_visits);
    assert_eq!(first_stats.sessions, second_stats.sessions);
}
