//! Blackboard export importer.
//!
//! Walks the five export members in dependency order and reconciles vendor
//! keys into the course store. Row-level problems never abort the run:
//! they are accumulated as critical or non-critical errors and the row is
//! skipped. Only structural problems with a member file (missing, wrong
//! columns) are fatal.

use tracing::info;
use uuid::Uuid;
use validator::Validate;

use analytics_core::{
    CourseOffering, LmsUser, Page, PageVisit, Post, Result, SubmissionAttempt,
};

use crate::archive::ExportArchive;
use crate::records::{
    parse_timestamp, ActivityRow, PostRow, ResourceRow, SubmissionRow, UserRow,
};
use crate::store::CourseStore;

/// Errors accumulated by an import run.
///
/// Critical errors block session reconstruction and fail the run after the
/// import finishes; non-critical errors are reported but the run succeeds.
#[derive(Debug, Default)]
pub struct ImportOutcome {
    pub errors: Vec<String>,
    pub non_critical_errors: Vec<String>,
}

impl ImportOutcome {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Importer for Blackboard course export archives.
pub struct BlackboardImport<'a> {
    archive: &'a ExportArchive,
    store: &'a mut CourseStore,
    errors: Vec<String>,
    non_critical_errors: Vec<String>,
}

impl<'a> BlackboardImport<'a> {
    pub const USERS_FILE: &'static str = "all_user.txt";
    pub const RESOURCES_FILE: &'static str = "all_resources.txt";
    pub const POSTS_FILE: &'static str = "forums.txt";
    pub const SUBMISSIONS_FILE: &'static str = "assessments.txt";
    pub const ACTIVITY_FILE: &'static str = "activity.txt";

    pub const USERS_COLUMNS: &'static [&'static str] =
        &["user_key", "firstname", "lastname", "username", "email"];
    pub const RESOURCES_COLUMNS: &'static [&'static str] =
        &["content_key", "parent_content_key", "title", "resource_type"];
    pub const POSTS_COLUMNS: &'static [&'static str] =
        &["forum_key", "user_key", "thread", "post", "timestamp"];
    pub const SUBMISSIONS_COLUMNS: &'static [&'static str] =
        &["user_key", "content_key", "user_grade", "timestamp"];
    pub const ACTIVITY_COLUMNS: &'static [&'static str] =
        &["user_key", "content_key", "forum_key", "timestamp"];

    /// Content type assigned to forum pages created from the posts file.
    pub const FORUM_CONTENT_TYPE: &'static str = "resource/x-bb-discussionboard";

    pub fn new(archive: &'a ExportArchive, store: &'a mut CourseStore) -> Self {
        Self {
            archive,
            store,
            errors: Vec::new(),
            non_critical_errors: Vec::new(),
        }
    }

    /// Runs the full import. Member files that are structurally broken
    /// return an error immediately; everything else lands in the outcome.
    pub fn process_import_data(mut self) -> Result<ImportOutcome> {
        info!("processing users");
        self.process_users()?;
        info!("processing resources");
        self.process_resources()?;
        self.process_resource_parents()?;
        info!("processing posts");
        self.process_posts()?;
        info!("processing submission attempts");
        self.process_submission_attempts()?;
        info!("processing activity");
        self.process_access_log()?;

        Ok(ImportOutcome {
            errors: self.errors,
            non_critical_errors: self.non_critical_errors,
        })
    }

    fn add_error(&mut self, msg: String) {
        self.errors.push(msg);
    }

    fn add_non_critical_error(&mut self, msg: String) {
        self.non_critical_errors.push(msg);
    }

    fn process_users(&mut self) -> Result<()> {
        let members = self
            .archive
            .read_member::<UserRow>(Self::USERS_FILE, Self::USERS_COLUMNS)?;
        self.errors.extend(members.row_errors);

        for row in members.rows {
            let user = LmsUser {
                id: Uuid::new_v4(),
                lms_user_key: row.user_key,
                username: row.username,
                firstname: row.firstname,
                lastname: row.lastname,
                email: row.email,
            };
            // Field-length limits the LMS itself enforces; a violating row
            // means the export is mangled, so the row is skipped.
            if let Err(e) = user.validate() {
                self.add_error(format!("Invalid user {}: {}", user.lms_user_key, e));
                continue;
            }
            self.store.upsert_user(user);
        }
        Ok(())
    }

    fn process_resources(&mut self) -> Result<()> {
        let members = self
            .archive
            .read_member::<ResourceRow>(Self::RESOURCES_FILE, Self::RESOURCES_COLUMNS)?;
        self.errors.extend(members.row_errors);

        // Parents stay unset until every resource is inserted.
        for row in members.rows {
            let page = Page {
                id: Uuid::new_v4(),
                content_key: row.content_key,
                title: row.title,
                content_type: row.resource_type,
                is_forum: false,
                parent_id: None,
            };
            if let Err(e) = page.validate() {
                self.add_error(format!("Invalid resource {}: {}", page.content_key, e));
                continue;
            }
            self.store.upsert_resource(page);
        }
        Ok(())
    }

    /// Second pass over the resources file to resolve parent links.
    fn process_resource_parents(&mut self) -> Result<()> {
        let members = self
            .archive
            .read_member::<ResourceRow>(Self::RESOURCES_FILE, Self::RESOURCES_COLUMNS)?;

        for row in members.rows {
            if row.parent_content_key.is_empty() {
                continue;
            }
            match self.store.page_any(&row.parent_content_key) {
                Some(parent) => {
                    let parent_id = parent.id;
                    self.store.set_page_parent(&row.content_key, parent_id);
                }
                None => self.add_non_critical_error(format!(
                    "Unable to find parent resource {}",
                    row.parent_content_key
                )),
            }
        }
        Ok(())
    }

    fn process_posts(&mut self) -> Result<()> {
        let members = self
            .archive
            .read_member::<PostRow>(Self::POSTS_FILE, Self::POSTS_COLUMNS)?;
        self.errors.extend(members.row_errors);

        for row in members.rows {
            let user_id = match self.store.user_by_key(&row.user_key) {
                Some(user) => user.id,
                None => {
                    self.add_error(format!("Unable to find user {} for post", row.user_key));
                    continue;
                }
            };

            let forum = Page {
                id: Uuid::new_v4(),
                content_key: row.forum_key.clone(),
                title: row.thread,
                content_type: Self::FORUM_CONTENT_TYPE.to_string(),
                is_forum: true,
                parent_id: None,
            };
            if let Err(e) = forum.validate() {
                self.add_error(format!("Invalid forum {}: {}", row.forum_key, e));
                continue;
            }
            let (page_id, page_content_type) = {
                let page = self.store.get_or_create_forum(forum);
                (page.id, page.content_type.clone())
            };

            // A pre-existing page under this key must actually be a
            // communication type.
            if !CourseOffering::is_communication_type(&page_content_type) {
                self.add_error(format!(
                    "Resource {} for post is not a communication type",
                    row.forum_key
                ));
                continue;
            }

            let posted_at = match parse_timestamp(&row.timestamp) {
                Some(at) => at,
                None => {
                    self.add_error(format!(
                        "Timestamp {} for post is not a valid format",
                        row.timestamp
                    ));
                    continue;
                }
            };

            if !self.store.offering().contains(posted_at) {
                self.add_non_critical_error(format!(
                    "Timestamp {} for post is outside course offering start/end",
                    row.timestamp
                ));
                continue;
            }

            self.store.add_post(Post::new(user_id, page_id, posted_at));
        }
        Ok(())
    }

    fn process_submission_attempts(&mut self) -> Result<()> {
        let members = self
            .archive
            .read_member::<SubmissionRow>(Self::SUBMISSIONS_FILE, Self::SUBMISSIONS_COLUMNS)?;
        self.errors.extend(members.row_errors);

        for row in members.rows {
            let user_id = match self.store.user_by_key(&row.user_key) {
                Some(user) => user.id,
                None => {
                    self.add_error(format!(
                        "Unable to find user {} for submission attempt",
                        row.user_key
                    ));
                    continue;
                }
            };

            let (page_id, content_type) = match self.store.page(&row.content_key, false) {
                Some(page) => (page.id, page.content_type.clone()),
                None => {
                    self.add_error(format!(
                        "Unable to find page {} for submission attempt",
                        row.content_key
                    ));
                    continue;
                }
            };

            if !CourseOffering::is_assessment_type(&content_type) {
                self.add_non_critical_error(format!(
                    "Resource {} for submission attempt is not an assessment type",
                    row.content_key
                ));
                continue;
            }

            let attempted_at = match parse_timestamp(&row.timestamp) {
                Some(at) => at,
                None => {
                    self.add_error(format!(
                        "Timestamp {} for submission attempt is not a valid format",
                        row.timestamp
                    ));
                    continue;
                }
            };

            if !self.store.offering().contains(attempted_at) {
                self.add_non_critical_error(format!(
                    "Timestamp {} for submission attempt is outside course offering start/end",
                    row.timestamp
                ));
                continue;
            }

            let attempt = SubmissionAttempt::new(user_id, page_id, attempted_at, row.user_grade);
            if let Err(e) = attempt.validate() {
                self.add_error(format!(
                    "Invalid submission attempt for user {}: {}",
                    row.user_key, e
                ));
                continue;
            }
            self.store.add_attempt(attempt);
        }
        Ok(())
    }

    fn process_access_log(&mut self) -> Result<()> {
        let members = self
            .archive
            .read_member::<ActivityRow>(Self::ACTIVITY_FILE, Self::ACTIVITY_COLUMNS)?;
        self.errors.extend(members.row_errors);

        for row in members.rows {
            let user_id = match self.store.user_by_key(&row.user_key) {
                Some(user) => user.id,
                None => {
                    self.add_error(format!(
                        "Unable to find user {} for activity",
                        row.user_key
                    ));
                    continue;
                }
            };

            // A populated content_key marks a resource visit; otherwise the
            // row is a visit to a forum thread.
            let page_id = if !row.content_key.is_empty() {
                match self.store.page(&row.content_key, false) {
                    Some(page) => page.id,
                    None => {
                        self.add_non_critical_error(format!(
                            "Unable to find resource {} for activity",
                            row.content_key
                        ));
                        continue;
                    }
                }
            } else {
                match self.store.page(&row.forum_key, true) {
                    Some(page) => page.id,
                    None => {
                        self.add_non_critical_error(format!(
                            "Unable to find forum {} for activity",
                            row.forum_key
                        ));
                        continue;
                    }
                }
            };

            let visited_at = match parse_timestamp(&row.timestamp) {
                Some(at) => at,
                None => {
                    self.add_error(format!(
                        "Timestamp {} for access activity is not a valid format",
                        row.timestamp
                    ));
                    continue;
                }
            };

            if !self.store.offering().contains(visited_at) {
                self.add_error(format!(
                    "Timestamp {} for access activity is outside course offering start/end",
                    row.timestamp
                ));
                continue;
            }

            self.store.add_visit(PageVisit::new(user_id, page_id, visited_at));
        }
        Ok(())
    }
}
