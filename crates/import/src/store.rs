//! In-memory analytics store for one course offering.
//!
//! Plays both collaborator roles around the session reconstructor: event
//! source (hands out each user's visits) and session sink (records the
//! computed sessions and the visit-to-session back-references). All derived
//! data is wiped and rebuilt on every import run.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use analytics_core::{
    CourseOffering, LmsUser, Page, PageVisit, Post, Session, SubmissionAttempt,
};

/// Counts reported at the end of an import run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportStats {
    pub users: usize,
    pub pages: usize,
    pub page_visits: usize,
    pub posts: usize,
    pub submission_attempts: usize,
    pub sessions: usize,
}

/// All imported and derived data for one course offering.
#[derive(Debug)]
pub struct CourseStore {
    offering: CourseOffering,
    /// Users keyed by vendor user key
    users: HashMap<String, LmsUser>,
    /// Pages keyed by (vendor content key, is_forum); forums and resources
    /// share the vendor key space
    pages: HashMap<(String, bool), Page>,
    visits: Vec<PageVisit>,
    posts: Vec<Post>,
    attempts: Vec<SubmissionAttempt>,
    /// Reconstructed sessions per user id
    sessions: HashMap<Uuid, Vec<Session<PageVisit>>>,
    /// Back-reference: visit id -> (user id, index into that user's sessions)
    visit_sessions: HashMap<Uuid, (Uuid, usize)>,
}

impl CourseStore {
    pub fn new(offering: CourseOffering) -> Self {
        Self {
            offering,
            users: HashMap::new(),
            pages: HashMap::new(),
            visits: Vec::new(),
            posts: Vec::new(),
            attempts: Vec::new(),
            sessions: HashMap::new(),
            visit_sessions: HashMap::new(),
        }
    }

    pub fn offering(&self) -> &CourseOffering {
        &self.offering
    }

    /// Inserts or updates a user by vendor key, keeping the internal id
    /// stable across re-imports within a run.
    pub fn upsert_user(&mut self, user: LmsUser) -> Uuid {
        match self.users.get_mut(&user.lms_user_key) {
            Some(existing) => {
                existing.firstname = user.firstname;
                existing.lastname = user.lastname;
                existing.username = user.username;
                existing.email = user.email;
                existing.id
            }
            None => {
                let id = user.id;
                self.users.insert(user.lms_user_key.clone(), user);
                id
            }
        }
    }

    pub fn user_by_key(&self, lms_user_key: &str) -> Option<&LmsUser> {
        self.users.get(lms_user_key)
    }

    /// Inserts or updates a non-forum resource page; the parent link is
    /// reset and resolved later in the parent pass.
    pub fn upsert_resource(&mut self, page: Page) -> Uuid {
        debug_assert!(!page.is_forum);
        let key = (page.content_key.clone(), false);
        match self.pages.get_mut(&key) {
            Some(existing) => {
                existing.title = page.title;
                existing.content_type = page.content_type;
                existing.parent_id = None;
                existing.id
            }
            None => {
                let id = page.id;
                self.pages.insert(key, page);
                id
            }
        }
    }

    /// Returns the existing forum page for a key, or inserts the given one.
    pub fn get_or_create_forum(&mut self, page: Page) -> &Page {
        debug_assert!(page.is_forum);
        let key = (page.content_key.clone(), true);
        self.pages.entry(key).or_insert(page)
    }

    pub fn page(&self, content_key: &str, is_forum: bool) -> Option<&Page> {
        self.pages.get(&(content_key.to_string(), is_forum))
    }

    /// Looks a page up by vendor key alone, preferring the resource over
    /// the forum when both exist. Used for parent resolution, where the
    /// export does not say which kind the parent is.
    pub fn page_any(&self, content_key: &str) -> Option<&Page> {
        self.page(content_key, false)
            .or_else(|| self.page(content_key, true))
    }

    pub fn set_page_parent(&mut self, content_key: &str, parent_id: Uuid) {
        if let Some(page) = self.pages.get_mut(&(content_key.to_string(), false)) {
            page.parent_id = Some(parent_id);
        }
    }

    pub fn add_visit(&mut self, visit: PageVisit) {
        self.visits.push(visit);
    }

    pub fn add_post(&mut self, post: Post) {
        self.posts.push(post);
    }

    pub fn add_attempt(&mut self, attempt: SubmissionAttempt) {
        self.attempts.push(attempt);
    }

    pub fn users(&self) -> impl Iterator<Item = &LmsUser> {
        self.users.values()
    }

    pub fn visits(&self) -> &[PageVisit] {
        &self.visits
    }

    /// Clones each user's visits into an owned per-user vector, the shape
    /// the reconstruction workers take ownership of.
    pub fn visits_by_user(&self) -> HashMap<Uuid, Vec<PageVisit>> {
        let mut by_user: HashMap<Uuid, Vec<PageVisit>> = HashMap::new();
        for visit in &self.visits {
            by_user.entry(visit.user_id).or_default().push(visit.clone());
        }
        by_user
    }

    /// Replaces a user's sessions with a freshly reconstructed list and
    /// rebuilds the visit back-references for that user.
    pub fn store_sessions(&mut self, user_id: Uuid, sessions: Vec<Session<PageVisit>>) {
        for (index, session) in sessions.iter().enumerate() {
            for visit in session.events() {
                self.visit_sessions.insert(visit.id, (user_id, index));
            }
        }
        self.sessions.insert(user_id, sessions);
    }

    pub fn sessions_for_user(&self, user_id: Uuid) -> &[Session<PageVisit>] {
        self.sessions.get(&user_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The session a visit was assigned to, if reconstruction has run.
    pub fn session_for_visit(&self, visit_id: Uuid) -> Option<&Session<PageVisit>> {
        let (user_id, index) = self.visit_sessions.get(&visit_id)?;
        self.sessions.get(user_id)?.get(*index)
    }

    /// Discards sessions and back-references ahead of a recompute.
    pub fn clear_sessions(&mut self) {
        self.sessions.clear();
        self.visit_sessions.clear();
    }

    /// Wipes everything imported or derived for the offering.
    pub fn clear(&mut self) {
        self.users.clear();
        self.pages.clear();
        self.visits.clear();
        self.posts.clear();
        self.attempts.clear();
        self.clear_sessions();
    }

    /// Newest timestamp across visits, attempts and posts; `None` when the
    /// store holds no activity at all.
    pub fn latest_activity(&self) -> Option<DateTime<Utc>> {
        let visits = self.visits.iter().map(|v| v.visited_at);
        let attempts = self.attempts.iter().map(|a| a.attempted_at);
        let posts = self.posts.iter().map(|p| p.posted_at);
        visits.chain(attempts).chain(posts).max()
    }

    /// Stamps the offering with the latest activity seen.
    pub fn update_latest_activity(&mut self) {
        self.offering.last_activity_at = self.latest_activity();
    }

    pub fn stats(&self) -> ImportStats {
        ImportStats {
            users: self.users.len(),
            pages: self.pages.len(),
            page_visits: self.visits.len(),
            posts: self.posts.len(),
            submission_attempts: self.attempts.len(),
            sessions: self.sessions.values().map(Vec::len).sum(),
        }
    }
}
