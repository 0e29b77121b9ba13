//! Test fixtures: export archive builder and offering factories.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Duration, TimeZone, Utc};
use zip::write::SimpleFileOptions;

use analytics_core::{CourseOffering, LmsType};
use lms_import::{BlackboardImport, CourseStore, ExportArchive};

/// Reference start time used across tests; visits are offset from this in
/// whole minutes.
pub fn course_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2016, 7, 21, 8, 47, 21).unwrap()
}

/// An offering wide enough to contain any test timestamp.
pub fn offering() -> CourseOffering {
    CourseOffering::new(
        "TEST1001_2016_S2",
        LmsType::Blackboard,
        Utc.with_ymd_and_hms(2016, 7, 1, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2016, 12, 1, 0, 0, 0).unwrap(),
    )
}

pub fn store() -> CourseStore {
    CourseStore::new(offering())
}

/// Formats an export timestamp at `course_start() + minutes`.
pub fn stamp(minutes: i64) -> String {
    (course_start() + Duration::minutes(minutes))
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Builds a complete export archive in `dir` from member bodies.
///
/// Members not supplied are written with only their header row, so every
/// archive is structurally complete.
pub struct ExportArchiveBuilder {
    members: Vec<(&'static str, String)>,
}

impl ExportArchiveBuilder {
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
        }
    }

    pub fn users(mut self, rows: &[&str]) -> Self {
        self.members.push((
            BlackboardImport::USERS_FILE,
            member_body(BlackboardImport::USERS_COLUMNS, rows),
        ));
        self
    }

    pub fn resources(mut self, rows: &[&str]) -> Self {
        self.members.push((
            BlackboardImport::RESOURCES_FILE,
            member_body(BlackboardImport::RESOURCES_COLUMNS, rows),
        ));
        self
    }

    pub fn posts(mut self, rows: &[&str]) -> Self {
        self.members.push((
            BlackboardImport::POSTS_FILE,
            member_body(BlackboardImport::POSTS_COLUMNS, rows),
        ));
        self
    }

    pub fn submissions(mut self, rows: &[&str]) -> Self {
        self.members.push((
            BlackboardImport::SUBMISSIONS_FILE,
            member_body(BlackboardImport::SUBMISSIONS_COLUMNS, rows),
        ));
        self
    }

    pub fn activity(mut self, rows: &[&str]) -> Self {
        self.members.push((
            BlackboardImport::ACTIVITY_FILE,
            member_body(BlackboardImport::ACTIVITY_COLUMNS, rows),
        ));
        self
    }

    /// Writes the archive and opens it.
    pub fn build(self, dir: &tempfile::TempDir) -> ExportArchive {
        let path: PathBuf = dir.path().join("export.zip");
        let mut zip = zip::ZipWriter::new(File::create(&path).expect("create archive"));

        let all_members = [
            BlackboardImport::USERS_FILE,
            BlackboardImport::RESOURCES_FILE,
            BlackboardImport::POSTS_FILE,
            BlackboardImport::SUBMISSIONS_FILE,
            BlackboardImport::ACTIVITY_FILE,
        ];
        let columns_for = |name: &str| match name {
            BlackboardImport::USERS_FILE => BlackboardImport::USERS_COLUMNS,
            BlackboardImport::RESOURCES_FILE => BlackboardImport::RESOURCES_COLUMNS,
            BlackboardImport::POSTS_FILE => BlackboardImport::POSTS_COLUMNS,
            BlackboardImport::SUBMISSIONS_FILE => BlackboardImport::SUBMISSIONS_COLUMNS,
            _ => BlackboardImport::ACTIVITY_COLUMNS,
        };

        for name in all_members {
            let body = self
                .members
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, b)| b.clone())
                .unwrap_or_else(|| member_body(columns_for(name), &[]));
            zip.start_file(name, SimpleFileOptions::default())
                .expect("start member");
            zip.write_all(body.as_bytes()).expect("write member");
        }
        zip.finish().expect("finish archive");

        ExportArchive::open(path).expect("open archive")
    }
}

impl Default for ExportArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn member_body(columns: &[&str], rows: &[&str]) -> String {
    let mut body = format!("{}\n", columns.join("|"));
    for row in rows {
        body.push_str(row);
        body.push('\n');
    }
    body
}
