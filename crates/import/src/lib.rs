//! Blackboard export parsing and reconciliation.
//!
//! An export is a zip archive of pipe-delimited CSV members. The importer
//! walks the members in dependency order (users, resources, posts,
//! submission attempts, activity), reconciles vendor keys against the
//! in-memory course store, and accumulates row-level errors instead of
//! aborting: bad rows are skipped and reported at the end of the run.

pub mod archive;
pub mod blackboard;
pub mod error_log;
pub mod records;
pub mod store;

pub use archive::ExportArchive;
pub use blackboard::{BlackboardImport, ImportOutcome};
pub use error_log::ErrorLogWriter;
pub use store::{CourseStore, ImportStats};
