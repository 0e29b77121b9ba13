//! Imported analytics records.
//!
//! These are the reconciled, internally-keyed rows produced by the import
//! pipeline: users, pages, page visits, forum posts and submission attempts.
//! Vendor foreign keys (`lms_user_key`, `content_key`) are kept alongside
//! the internal UUIDs so rows can be traced back to the export files.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::session::Timestamped;

/// A user known to the LMS for one course offering.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LmsUser {
    /// Internal row ID
    pub id: Uuid,
    /// Vendor user key from the export ("user_key" column)
    #[validate(length(min = 1, max = 255))]
    pub lms_user_key: String,
    #[validate(length(max = 255))]
    pub username: String,
    #[validate(length(max = 255))]
    pub firstname: String,
    #[validate(length(max = 255))]
    pub lastname: String,
    #[validate(length(max = 255))]
    pub email: String,
}

impl LmsUser {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
            .trim()
            .to_string()
    }
}

/// A content page or forum within a course offering.
///
/// Forums and ordinary resources share the vendor's key space, so a page is
/// identified by `(content_key, is_forum)`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Page {
    /// Internal row ID
    pub id: Uuid,
    /// Vendor content key ("content_key" or "forum_key" column)
    #[validate(length(min = 1, max = 255))]
    pub content_key: String,
    #[validate(length(max = 1000))]
    pub title: String,
    /// Vendor content type, e.g. "resource/x-bb-document"
    #[validate(length(max = 255))]
    pub content_type: String,
    /// Whether this page is a discussion forum
    pub is_forum: bool,
    /// Parent page, resolved in a second pass over the resources file
    pub parent_id: Option<Uuid>,
}

/// One timestamped visit by a user to a page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageVisit {
    /// Internal row ID
    pub id: Uuid,
    pub user_id: Uuid,
    pub page_id: Uuid,
    pub visited_at: DateTime<Utc>,
}

impl PageVisit {
    pub fn new(user_id: Uuid, page_id: Uuid, visited_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            page_id,
            visited_at,
        }
    }
}

impl Timestamped for PageVisit {
    fn timestamp(&self) -> DateTime<Utc> {
        self.visited_at
    }
}

/// A forum post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    pub page_id: Uuid,
    pub posted_at: DateTime<Utc>,
}

impl Post {
    pub fn new(user_id: Uuid, page_id: Uuid, posted_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            page_id,
            posted_at,
        }
    }
}

/// A quiz/assignment submission attempt with the grade the LMS recorded.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmissionAttempt {
    pub id: Uuid,
    pub user_id: Uuid,
    pub page_id: Uuid,
    pub attempted_at: DateTime<Utc>,
    /// Grade as exported, uninterpreted
    #[validate(length(max = 255))]
    pub grade: String,
}

impl SubmissionAttempt {
    pub fn new(
        user_id: Uuid,
        page_id: Uuid,
        attempted_at: DateTime<Utc>,
        grade: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            page_id,
            attempted_at,
            grade: grade.into(),
        }
    }
}
