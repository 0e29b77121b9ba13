//! Course offering types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Which LMS produced the export data for an offering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LmsType {
    Blackboard,
    Moodle,
}

impl LmsType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blackboard => "blackboard",
            Self::Moodle => "moodle",
        }
    }
}

impl std::str::FromStr for LmsType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blackboard" => Ok(Self::Blackboard),
            "moodle" => Ok(Self::Moodle),
            other => Err(format!("unknown LMS type: {}", other)),
        }
    }
}

/// Content types counted as communication activity (forums, collab sessions).
pub const COMMUNICATION_TYPES: &[&str] = &[
    "resource/x-bb-discussionboard",
    "course/x-bb-collabsession",
];

/// Content types counted as assessment activity.
pub const ASSESSMENT_TYPES: &[&str] = &[
    "resource/x-bb-assignment",
    "resource/x-turnitin-assignment",
    "course/x-bb-courseassessment",
];

/// One run of a course, the unit all imported data hangs off.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CourseOffering {
    /// Unique offering ID
    pub id: Uuid,
    /// Course code, e.g. "COMP1001_2016_S2"
    #[validate(length(min = 1, max = 100))]
    pub code: String,
    /// LMS the export archives come from
    pub lms_type: LmsType,
    /// Start of the teaching period; rows stamped before this are suspect
    pub start_datetime: DateTime<Utc>,
    /// End of the teaching period
    pub end_datetime: DateTime<Utc>,
    /// Newest activity timestamp seen across visits, attempts and posts
    pub last_activity_at: Option<DateTime<Utc>>,
}

impl CourseOffering {
    pub fn new(
        code: impl Into<String>,
        lms_type: LmsType,
        start_datetime: DateTime<Utc>,
        end_datetime: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: code.into(),
            lms_type,
            start_datetime,
            end_datetime,
            last_activity_at: None,
        }
    }

    /// Checks whether a timestamp falls inside the offering period (inclusive).
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start_datetime && at <= self.end_datetime
    }

    pub fn is_communication_type(content_type: &str) -> bool {
        COMMUNICATION_TYPES.contains(&content_type)
    }

    pub fn is_assessment_type(content_type: &str) -> bool {
        ASSESSMENT_TYPES.contains(&content_type)
    }
}
