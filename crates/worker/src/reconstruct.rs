//! Per-user session reconstruction driver.

use std::collections::HashMap;

use tracing::{debug, info};
use uuid::Uuid;

use analytics_core::{reconstruct_sessions, Error, PageVisit, Result, Session};
use lms_import::CourseStore;

/// Runs the session reconstructor over every user's visits, one tokio task
/// per user.
pub struct SessionWorker;

impl SessionWorker {
    /// Reconstructs sessions for each user's visit vector concurrently.
    ///
    /// Each task takes ownership of its user's visits; nothing is shared
    /// between tasks. A panicked task surfaces as an internal error after
    /// the remaining users have finished.
    pub async fn reconstruct_all(
        visits_by_user: HashMap<Uuid, Vec<PageVisit>>,
    ) -> Result<HashMap<Uuid, Vec<Session<PageVisit>>>> {
        let mut handles = Vec::with_capacity(visits_by_user.len());
        for (user_id, visits) in visits_by_user {
            handles.push(tokio::spawn(async move {
                let sessions = reconstruct_sessions(visits);
                debug!(%user_id, sessions = sessions.len(), "reconstructed user sessions");
                (user_id, sessions)
            }));
        }

        let mut results = HashMap::with_capacity(handles.len());
        let mut join_error = None;
        for handle in handles {
            match handle.await {
                Ok((user_id, sessions)) => {
                    results.insert(user_id, sessions);
                }
                Err(e) => join_error = Some(e),
            }
        }
        if let Some(e) = join_error {
            return Err(Error::internal(format!("session task failed: {}", e)));
        }
        Ok(results)
    }

    /// Recomputes every user's sessions in the store from scratch.
    ///
    /// Prior sessions are discarded first; the store ends up holding only
    /// the freshly derived sessions and visit back-references. Returns the
    /// number of sessions stored.
    pub async fn run(store: &mut CourseStore) -> Result<usize> {
        store.clear_sessions();

        let visits_by_user = store.visits_by_user();
        let users = visits_by_user.len();
        let results = Self::reconstruct_all(visits_by_user).await?;

        let mut count = 0;
        for (user_id, sessions) in results {
            count += sessions.len();
            store.store_sessions(user_id, sessions);
        }
        info!(users, sessions = count, "session reconstruction complete");
        Ok(count)
    }
}
