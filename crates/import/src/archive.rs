//! Export archive access.
//!
//! A Blackboard export is a zip whose members are pipe-delimited CSV files
//! with a header row. Members are read one at a time; the resources member
//! is deliberately read twice by the importer (insert pass, parent pass),
//! so each read reopens the archive rather than holding it open.

use std::collections::BTreeSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::debug;
use zip::ZipArchive;

use analytics_core::{Error, Result};

/// Rows decoded from one archive member, plus the rows that would not
/// decode. Undecodable rows are data errors, not file errors: the caller
/// accumulates them and keeps going.
#[derive(Debug)]
pub struct MemberRows<R> {
    pub rows: Vec<R>,
    pub row_errors: Vec<String>,
}

/// A Blackboard export archive on disk.
#[derive(Debug, Clone)]
pub struct ExportArchive {
    path: PathBuf,
}

impl ExportArchive {
    /// Opens an export archive, verifying up front that it is a readable zip.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = File::open(&path)?;
        ZipArchive::new(file)
            .map_err(|e| Error::import_file(path.display().to_string(), e.to_string()))?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads one member as pipe-delimited CSV into typed rows.
    ///
    /// The member's column set must match `expected_columns` exactly
    /// (order-insensitive); a mismatch means the export format changed and
    /// the whole run is aborted with an import-file error.
    pub fn read_member<R: DeserializeOwned>(
        &self,
        member: &str,
        expected_columns: &[&str],
    ) -> Result<MemberRows<R>> {
        let file = File::open(&self.path)?;
        let mut zip = ZipArchive::new(file)
            .map_err(|e| Error::import_file(member, e.to_string()))?;
        let entry = zip
            .by_name(member)
            .map_err(|e| Error::import_file(member, e.to_string()))?;

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'|')
            .from_reader(entry);

        let headers: BTreeSet<String> = reader
            .headers()
            .map_err(|e| Error::import_file(member, e.to_string()))?
            .iter()
            .map(str::to_string)
            .collect();
        let expected: BTreeSet<String> =
            expected_columns.iter().map(|c| c.to_string()).collect();
        if headers != expected {
            return Err(Error::import_file(
                member,
                format!("columns {:?} do not match {:?}", headers, expected_columns),
            ));
        }

        let mut rows = Vec::new();
        let mut row_errors = Vec::new();
        for (i, row) in reader.deserialize::<R>().enumerate() {
            match row {
                Ok(row) => rows.push(row),
                // Header row is line 1, first data row is line 2.
                Err(e) => row_errors.push(format!(
                    "Undecodable row {} in {}: {}",
                    i + 2,
                    member,
                    e
                )),
            }
        }

        debug!(
            member,
            rows = rows.len(),
            row_errors = row_errors.len(),
            "read archive member"
        );
        Ok(MemberRows { rows, row_errors })
    }
}
