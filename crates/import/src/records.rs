//! Raw row types for the Blackboard export members.
//!
//! Field names match the export columns exactly; everything arrives as a
//! string and is validated/parsed during reconciliation, not here.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

/// Row of `all_user.txt`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRow {
    pub user_key: String,
    pub firstname: String,
    pub lastname: String,
    pub username: String,
    pub email: String,
}

/// Row of `all_resources.txt`.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceRow {
    pub content_key: String,
    pub parent_content_key: String,
    pub title: String,
    pub resource_type: String,
}

/// Row of `forums.txt`.
#[derive(Debug, Clone, Deserialize)]
pub struct PostRow {
    pub forum_key: String,
    pub user_key: String,
    pub thread: String,
    pub post: String,
    pub timestamp: String,
}

/// Row of `assessments.txt`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionRow {
    pub user_key: String,
    pub content_key: String,
    pub user_grade: String,
    pub timestamp: String,
}

/// Row of `activity.txt`. Exactly one of `content_key` / `forum_key` is
/// populated per row; an empty `content_key` marks a forum visit.
#[derive(Debug, Clone, Deserialize)]
pub struct ActivityRow {
    pub user_key: String,
    pub content_key: String,
    pub forum_key: String,
    pub timestamp: String,
}

/// Parses an export timestamp into UTC.
///
/// Blackboard writes naive ISO-style timestamps, with either a space or a
/// `T` separator; a trailing offset shows up in some exports, so RFC 3339 is
/// tried first. Returns `None` when nothing matches.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    None
}
