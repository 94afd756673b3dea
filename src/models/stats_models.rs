// src/models/stats_models.rs
use chrono::NaiveDateTime;
use serde::Serialize;
use std::path::PathBuf;

use crate::models::geo::SchemeTag;

/// Outcome of one hierarchy build step.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    pub regions: usize,
    pub districts: usize,
    pub municipalities: usize,
    /// Rows skipped because they could not be parsed.
    pub errors: usize,
    /// Districts that were not in the reference table and went to the unknown-region bucket.
    pub orphaned_districts: usize,
    /// True when the store already held a hierarchy and nothing was written.
    pub skipped: bool,
}

impl BuildReport {
    pub fn total_nodes(&self) -> usize {
        self.regions + self.districts + self.municipalities
    }
}

/// Outcome of one identifier fusion pass.
#[derive(Debug, Clone, Serialize)]
pub struct FuseReport {
    pub pass: &'static str,
    pub schemes: Vec<SchemeTag>,
    /// Rows that found their node (each may produce one record per scheme).
    pub matched: usize,
    pub unmatched: usize,
    pub malformed: usize,
    pub records_created: usize,
    pub skipped: bool,
    pub log_path: Option<PathBuf>,
}

impl FuseReport {
    pub fn skipped(pass: &'static str, schemes: &[SchemeTag]) -> Self {
        Self {
            pass,
            schemes: schemes.to_vec(),
            matched: 0,
            unmatched: 0,
            malformed: 0,
            records_created: 0,
            skipped: true,
            log_path: None,
        }
    }
}

/// A fusion pass that could not run, kept so the summary still shows it.
#[derive(Debug, Clone, Serialize)]
pub struct FailedPass {
    pub pass: &'static str,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineStats {
    pub run_id: String,
    pub run_timestamp: NaiveDateTime,
    pub build: Option<BuildReport>,
    pub build_failure: Option<String>,
    pub passes: Vec<FuseReport>,
    pub failed_passes: Vec<FailedPass>,
    pub build_time: f64,
    pub fusion_time: f64,
    pub total_processing_time: f64,
}

impl PipelineStats {
    pub fn new(run_id: String, run_timestamp: NaiveDateTime) -> Self {
        Self {
            run_id,
            run_timestamp,
            build: None,
            build_failure: None,
            passes: Vec::new(),
            failed_passes: Vec::new(),
            build_time: 0.0,
            fusion_time: 0.0,
            total_processing_time: 0.0,
        }
    }

    pub fn total_matched(&self) -> usize {
        self.passes.iter().map(|p| p.matched).sum()
    }

    pub fn total_unmatched(&self) -> usize {
        self.passes.iter().map(|p| p.unmatched).sum()
    }
}
