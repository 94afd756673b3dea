// src/fusion/unmatched_log.rs
//! Per-pass report of rows that could not be attached to the hierarchy.
//! Overwritten on every run.

use serde::Serialize;
use std::fmt;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MissReason {
    /// No node at the target level carries the normalized name.
    NameNotInHierarchy,
    /// The node was found but the row's code column is empty.
    BlankCode,
}

impl fmt::Display for MissReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissReason::NameNotInHierarchy => f.write_str("not found in hierarchy"),
            MissReason::BlankCode => f.write_str("blank code value"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmatchedRow {
    pub code: String,
    pub original_name: String,
    pub normalized_name: String,
    pub reason: MissReason,
}

pub fn report_path(log_dir: &Path, pass_name: &str) -> PathBuf {
    log_dir.join(format!("unmatched_{}.csv", pass_name.to_lowercase()))
}

/// Writes `code;original_name;normalized_name;reason`, one line per unmatched row.
pub fn write_report(path: &Path, rows: &[UnmatchedRow]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_writer(BufWriter::new(file));

    writer.write_record(["code", "original_name", "normalized_name", "reason"])?;
    for row in rows {
        let reason = row.reason.to_string();
        writer.write_record([
            row.code.as_str(),
            row.original_name.as_str(),
            row.normalized_name.as_str(),
            reason.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_is_overwritten_per_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = report_path(dir.path(), "REGISTRY_NUMBER");
        assert!(path.ends_with("unmatched_registry_number.csv"));

        let first = vec![UnmatchedRow {
            code: "00231401".into(),
            original_name: "Obec Nikde".into(),
            normalized_name: "Nikde".into(),
            reason: MissReason::NameNotInHierarchy,
        }];
        write_report(&path, &first).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "code;original_name;normalized_name;reason\n00231401;Obec Nikde;Nikde;not found in hierarchy\n"
        );

        write_report(&path, &[]).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "code;original_name;normalized_name;reason\n");
    }
}
