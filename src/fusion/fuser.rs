// src/fusion/fuser.rs
use indicatif::MultiProgress;
use log::{debug, info};
use std::path::Path;

use crate::error::FusionError;
use crate::fusion::index::NameIndex;
use crate::fusion::passes::FusionPass;
use crate::fusion::unmatched_log::{self, MissReason, UnmatchedRow};
use crate::models::{FuseReport, IdentifierRecord};
use crate::sources;
use crate::store::GeoStore;
use crate::utils::logging::FusionLogger;
use crate::utils::progress_config::pass_progress_bar;

/// Row-level result of joining one extract against a name index.
#[derive(Debug, Default)]
pub struct PassOutcome {
    pub records: Vec<IdentifierRecord>,
    pub unmatched: Vec<UnmatchedRow>,
    pub matched: usize,
    pub ignored: usize,
}

/// Joins already-parsed rows against `index`. Never fails: misses become report rows.
pub fn match_rows(pass: &FusionPass, index: &NameIndex, rows: &[Vec<String>]) -> PassOutcome {
    let mut outcome = PassOutcome::default();

    for row in rows {
        let original_name = row[pass.name_column].trim();
        let name_key = pass.name_key(original_name);
        if pass.is_ignored(&name_key) {
            outcome.ignored += 1;
            continue;
        }
        let first_code = pass
            .codes
            .first()
            .map(|c| c.scheme.canonical_value(&row[c.column]))
            .unwrap_or_default();

        let parent_key = pass.parent_column.map(|col| pass.parent_key(&row[col]));
        let node_id = match index.lookup(&name_key, parent_key.as_deref()) {
            Some(id) => id,
            None => {
                outcome.unmatched.push(UnmatchedRow {
                    code: first_code,
                    original_name: original_name.to_string(),
                    normalized_name: name_key,
                    reason: MissReason::NameNotInHierarchy,
                });
                continue;
            }
        };

        let mut attached = 0;
        for code in pass.codes {
            let raw = row[code.column].trim();
            if raw.is_empty() {
                continue;
            }
            outcome
                .records
                .push(IdentifierRecord::new(node_id, raw, code.scheme));
            attached += 1;
        }

        if attached > 0 {
            outcome.matched += 1;
        } else {
            outcome.unmatched.push(UnmatchedRow {
                code: first_code,
                original_name: original_name.to_string(),
                normalized_name: name_key,
                reason: MissReason::BlankCode,
            });
        }
    }

    outcome
}

/// Runs one fusion pass: guard, read extract, join by name, write records and the miss report.
///
/// Skips entirely when any record of the pass's schemes is already stored.
/// The unmatched report is written before any record, so a pass that fails
/// on its report leaves the store untouched and runs again next time.
pub async fn fuse_identifiers<S: GeoStore + ?Sized>(
    store: &S,
    pass: &FusionPass,
    source: &Path,
    log_dir: &Path,
    multi_progress: Option<&MultiProgress>,
) -> Result<FuseReport, FusionError> {
    let logger = FusionLogger::new(pass.name);
    logger.log_start(source);

    let schemes = pass.schemes();
    let existing = store.identifier_count(&schemes).await?;
    if existing > 0 {
        logger.log_skipped(existing);
        return Ok(FuseReport::skipped(pass.name, &schemes));
    }

    let source_rows =
        sources::read_delimited(source, pass.delimiter).map_err(|e| FusionError::SourceUnavailable {
            pass: pass.name,
            path: source.to_path_buf(),
            source: e,
        })?;
    let (rows, malformed) = source_rows.with_min_columns(pass.min_columns());

    let targets = store.nodes_at_level(pass.target_level).await?;
    let parents = match (pass.parent_column, pass.target_level.parent_level()) {
        (Some(_), Some(parent_level)) => store.nodes_at_level(parent_level).await?,
        _ => Vec::new(),
    };
    let index = NameIndex::build(pass, &targets, &parents);
    logger.log_data_loaded(rows.len(), malformed, index.len());

    let pb = pass_progress_bar(multi_progress, rows.len() as u64, pass.name);
    let outcome = match_rows(pass, &index, &rows);
    if let Some(pb) = &pb {
        pb.set_position(rows.len() as u64);
    }
    if outcome.ignored > 0 {
        debug!("[{}] ignored {} non-unit rows", pass.name, outcome.ignored);
    }

    // Report first: once records are stored the pass is never rerun.
    let log_path = unmatched_log::report_path(log_dir, pass.name);
    unmatched_log::write_report(&log_path, &outcome.unmatched).map_err(|e| FusionError::Report {
        pass: pass.name,
        path: log_path.clone(),
        source: e,
    })?;

    let records_created = store.insert_identifiers(&outcome.records).await?;

    let report = FuseReport {
        pass: pass.name,
        schemes,
        matched: outcome.matched,
        unmatched: outcome.unmatched.len(),
        malformed,
        records_created,
        skipped: false,
        log_path: Some(log_path),
    };
    if let Some(pb) = pb {
        pb.finish_with_message(format!(
            "{}: {} matched, {} unmatched",
            pass.name, report.matched, report.unmatched
        ));
    }
    logger.log_completion(&report);
    info!(
        "[{}] Matched: {}, unmatched: {}, malformed: {}",
        pass.name, report.matched, report.unmatched, report.malformed
    );
    Ok(report)
}
