// src/pipeline.rs
//! Build-then-serve orchestration: schema, hierarchy, then every fusion pass in order.

use anyhow::{Context, Result};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::time::Instant;
use uuid::Uuid;

use crate::fusion::{fuse_identifiers, ALL_PASSES};
use crate::hierarchy::{build_hierarchy, RegionDistrictTable};
use crate::models::{FailedPass, PipelineStats};
use crate::store::GeoStore;
use crate::utils::config::AppConfig;
use crate::utils::logging::FusionLogger;
use crate::utils::progress_config::ProgressConfig;

/// Runs one full ingestion. Only schema failures abort the run; a failed
/// build or pass is recorded in the returned stats and the next step runs.
pub async fn run_pipeline<S: GeoStore + ?Sized>(
    store: &S,
    config: &AppConfig,
    progress: &ProgressConfig,
) -> Result<PipelineStats> {
    let start = Instant::now();
    let mut stats = PipelineStats::new(Uuid::new_v4().to_string(), Utc::now().naive_utc());
    info!("Pipeline run {} started", stats.run_id);

    let multi_progress = progress.create_multi_progress();
    let total_phases = 1 + ALL_PASSES.len() as u64;
    let main_pb = multi_progress.as_ref().map(|mp| {
        let pb = mp.add(ProgressBar::new(total_phases));
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message("Building hierarchy");
        pb
    });

    store
        .ensure_schema()
        .await
        .context("Failed to prepare storage schema")?;

    // Phase 1: hierarchy
    let build_start = Instant::now();
    let built = match RegionDistrictTable::load(&config.region_table_path) {
        Ok(reference) => {
            build_hierarchy(store, &reference, &config.municipality_extract_path).await
        }
        Err(e) => Err(e),
    };
    match built {
        Ok(report) => stats.build = Some(report),
        Err(e) => {
            warn!("Hierarchy build failed: {}", e);
            stats.build_failure = Some(e.to_string());
        }
    }
    stats.build_time = build_start.elapsed().as_secs_f64();
    info!("Pipeline progress: [1/{}] phases", total_phases);
    if let Some(pb) = &main_pb {
        pb.inc(1);
    }

    // Phase 2: identifier fusion, one pass per source extract
    let fusion_start = Instant::now();
    let detailed = if progress.should_show_detailed() {
        multi_progress.as_ref()
    } else {
        None
    };
    for (i, pass) in ALL_PASSES.iter().enumerate() {
        if let Some(pb) = &main_pb {
            pb.set_message(format!("Fusing {}", pass.name));
        }
        let source = config.extract_for(pass);
        match fuse_identifiers(store, pass, source, &config.unmatched_log_dir, detailed).await {
            Ok(report) => stats.passes.push(report),
            Err(e) => {
                FusionLogger::new(pass.name).log_failure(&e);
                stats.failed_passes.push(FailedPass {
                    pass: pass.name,
                    reason: e.to_string(),
                });
            }
        }
        info!("Pipeline progress: [{}/{}] phases", i + 2, total_phases);
        if let Some(pb) = &main_pb {
            pb.inc(1);
        }
    }
    stats.fusion_time = fusion_start.elapsed().as_secs_f64();
    stats.total_processing_time = start.elapsed().as_secs_f64();

    if let Some(pb) = main_pb {
        pb.finish_with_message("Pipeline complete");
    }
    log_summary(&stats);
    Ok(stats)
}

fn log_summary(stats: &PipelineStats) {
    info!("=== Pipeline run {} summary ===", stats.run_id);
    match (&stats.build, &stats.build_failure) {
        (Some(b), _) if b.skipped => info!("Hierarchy: already present, not rebuilt"),
        (Some(b), _) => info!(
            "Hierarchy: {} regions, {} districts, {} municipalities, {} bad rows, {} orphaned districts ({:.2}s)",
            b.regions, b.districts, b.municipalities, b.errors, b.orphaned_districts, stats.build_time
        ),
        (None, Some(reason)) => warn!("Hierarchy: FAILED ({})", reason),
        (None, None) => {}
    }
    for pass in &stats.passes {
        if pass.skipped {
            info!("  {:<16} skipped, records already present", pass.pass);
        } else {
            info!(
                "  {:<16} matched {:>6}, unmatched {:>6}, malformed {:>4}, records {:>6}",
                pass.pass, pass.matched, pass.unmatched, pass.malformed, pass.records_created
            );
        }
    }
    for failed in &stats.failed_passes {
        warn!("  {:<16} FAILED: {}", failed.pass, failed.reason);
    }
    info!(
        "Fusion total: {} matched, {} unmatched in {:.2}s; run took {:.2}s",
        stats.total_matched(),
        stats.total_unmatched(),
        stats.fusion_time,
        stats.total_processing_time
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SchemeTag;
    use crate::resolution::{resolve, MatchStatus};
    use crate::store::InMemoryStore;
    use std::fs;
    use std::path::Path;

    fn write_extracts(dir: &Path) -> AppConfig {
        let reference = dir.join("regions.json");
        fs::write(
            &reference,
            r#"{"version": "t", "regions": [
                {"name": "Hlavní město Praha", "districts": ["Hlavní město Praha"]},
                {"name": "Jihomoravský kraj", "districts": ["Brno-město", "Blansko"]}
            ]}"#,
        )
        .unwrap();
        let municipalities = dir.join("obce.csv");
        fs::write(
            &municipalities,
            "ico;nazev;okres\n\
             64581;Hlavní město Praha;Hlavní město Praha\n\
             44992785;Statutární město Brno;Brno - město\n\
             280691;Obec Lhota;Blansko\n",
        )
        .unwrap();
        let zuj = dir.join("zuj.csv");
        fs::write(
            &zuj,
            "a,b,c,kod,e,nazev\n,,,554782,,Praha\n,,,582786,,Brno\n,,,999999,,Atlantida\n",
        )
        .unwrap();
        let cis0100 = dir.join("cis0100.csv");
        fs::write(
            &cis0100,
            "0,1,2,3,4,nazev,6,7,nuts\n\
             ,,,,,Hlavní město Praha,,,CZ010\n\
             ,,,,,Jihomoravský kraj,,,CZ064\n\
             ,,,,,Extra-Regio,,,CZZZZ\n",
        )
        .unwrap();

        AppConfig {
            region_table_path: reference,
            municipality_extract_path: municipalities,
            lau2_extract_path: zuj,
            nuts3_extract_path: cis0100,
            district_codes_extract_path: dir.join("missing-cis0101.csv"),
            unmatched_log_dir: dir.join("reports"),
            ..AppConfig::default()
        }
    }

    fn quiet() -> ProgressConfig {
        ProgressConfig {
            enabled: false,
            detailed: false,
        }
    }

    #[tokio::test]
    async fn test_pipeline_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_extracts(dir.path());
        let store = InMemoryStore::new();

        let stats = run_pipeline(&store, &config, &quiet()).await.unwrap();
        let build = stats.build.as_ref().unwrap();
        assert_eq!(build.municipalities, 3);
        assert_eq!(stats.passes.len(), 3);
        assert_eq!(stats.failed_passes.len(), 1);
        assert_eq!(stats.failed_passes[0].pass, "DISTRICT_CODES");
        assert_eq!(stats.total_matched(), 3 + 2 + 2);
        assert_eq!(stats.total_unmatched(), 1);
        assert!(dir.path().join("reports/unmatched_lau2.csv").exists());

        let res = resolve(&store, "554782", None).await.unwrap();
        assert_eq!(res.status, MatchStatus::ExactMatch);
        assert_eq!(res.results[0].display_name, "Praha");

        let res = resolve(&store, "64581", Some(SchemeTag::RegistryNumber)).await.unwrap();
        assert_eq!(res.results[0].code_value, "00064581");

        // Second run changes nothing.
        let again = run_pipeline(&store, &config, &quiet()).await.unwrap();
        assert!(again.build.unwrap().skipped);
        assert!(again.passes.iter().all(|p| p.skipped));
        assert_eq!(
            store.identifier_count(&SchemeTag::ALL).await.unwrap(),
            3 + 2 + 2
        );
    }

    #[tokio::test]
    async fn test_missing_reference_is_recorded_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = write_extracts(dir.path());
        config.region_table_path = dir.path().join("nope.json");
        let store = InMemoryStore::new();

        let stats = run_pipeline(&store, &config, &quiet()).await.unwrap();
        assert!(stats.build.is_none());
        assert!(stats.build_failure.is_some());
        assert_eq!(stats.total_matched(), 0);
    }
}
